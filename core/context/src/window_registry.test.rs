use corestack_protocol::Message;

use super::*;

#[test]
fn known_model_uses_its_registered_window() {
    let fit = validate_context_fits_sync(&[], 0, "claude-sonnet-4-20250514");
    assert_eq!(fit.window, 200_000);
    assert_eq!(fit.reserved_output, 8_192);
    assert_eq!(fit.available, 200_000 - 8_192);
}

#[test]
fn unknown_model_falls_back_to_defaults() {
    let fit = validate_context_fits_sync(&[], 0, "some-unreleased-model");
    assert_eq!(fit.window, DEFAULT_WINDOW);
    assert_eq!(fit.reserved_output, DEFAULT_RESERVED_OUTPUT);
}

#[test]
fn small_history_fits_and_reports_zero_overflow() {
    let messages = vec![Message::user("hello")];
    let fit = validate_context_fits_sync(&messages, 0, "claude-sonnet-4-20250514");
    assert!(fit.fits);
    assert_eq!(fit.overflow, 0);
}

#[test]
fn oversized_history_does_not_fit_and_reports_overflow() {
    let huge = "x".repeat(10_000_000);
    let messages = vec![Message::user(huge)];
    let fit = validate_context_fits_sync(&messages, 0, "claude-sonnet-4-20250514");
    assert!(!fit.fits);
    assert!(fit.overflow > 0);
    assert_eq!(fit.estimated.saturating_sub(fit.available), fit.overflow);
}

struct FixedCounter(u64);

#[async_trait::async_trait]
impl corestack_protocol::TokenCounter for FixedCounter {
    async fn count_tokens(
        &self,
        _request: corestack_protocol::CountTokensRequest<'_>,
    ) -> Result<corestack_protocol::CountTokensResult, String> {
        Ok(corestack_protocol::CountTokensResult {
            input_tokens: self.0,
            is_estimate: false,
        })
    }
}

#[tokio::test]
async fn async_fit_check_uses_injected_counter() {
    let counter = FixedCounter(500_000);
    let fit = validate_context_fits(&counter, &[], None, None, "claude-opus-4-20250514")
        .await
        .expect("fit check");
    assert!(!fit.fits);
    assert_eq!(fit.estimated, 500_000);
}
