use super::*;
use crate::ext::boxed;

#[test]
fn test_from_plain_error() {
    let plain = boxed(
        std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        StatusCode::FileNotFound,
    );
    let core: CoreError = plain.into();
    assert_eq!(core.status_code(), StatusCode::FileNotFound);
    assert!(!core.is_retryable());
    assert!(core.to_string().contains("missing"));
}

#[test]
fn test_retryable_forwarded() {
    let plain = boxed(
        std::io::Error::new(std::io::ErrorKind::TimedOut, "slow"),
        StatusCode::Timeout,
    );
    let core: CoreError = plain.into();
    assert!(core.is_retryable());
}
