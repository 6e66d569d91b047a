//! Human-gated synchronous wait (spec.md §4.7).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use corestack_event_log::EventBus;
use corestack_protocol::ApprovalDecision;
use corestack_protocol::ApprovalScope;
use corestack_protocol::Event;
use corestack_protocol::EventPayload;
use corestack_protocol::Mode;
use corestack_protocol::Stage;
use tokio::sync::Mutex;
use tokio::sync::oneshot;
use tracing::info;

use crate::error::ApprovalError;
use crate::error::approval_error::ChannelClosedSnafu;
use crate::error::approval_error::TimedOutSnafu;
use crate::error::approval_error::TooManyPendingSnafu;
use crate::types::ApprovalQueueStats;
use crate::types::ApprovalRequest;
use crate::types::ApprovalResolution;
use crate::types::ApprovalStatus;

/// Caller-supplied cap on concurrently pending approvals, bounding memory
/// (SPEC_FULL §4 "Approval/permission queue introspection").
pub const MAX_PENDING_REQUESTS: usize = 256;

struct Parked {
    request: ApprovalRequest,
    sender: Option<oneshot::Sender<ApprovalResolution>>,
}

/// Parks execution until a human resolves or denies a request. Multiple
/// concurrent pending approvals are supported and tracked by id.
/// Resolution is idempotent: a second `resolve`/`deny` on an
/// already-resolved or unknown id is a no-op.
pub struct ApprovalManager {
    bus: Arc<EventBus>,
    pending: Mutex<HashMap<String, Parked>>,
}

impl ApprovalManager {
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self {
            bus,
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Request approval, emit `approval_requested`, and return a receiver
    /// that resolves once `resolve_approval`/`deny_approval` is called.
    ///
    /// `timeout` is an opt-in mechanism (spec.md §5 says approvals are
    /// never time-bounded *by the core*; this stays unbounded unless the
    /// caller supplies one — used by the autonomy controller's own budget
    /// enforcement, per SPEC_FULL §4).
    pub async fn request_approval(
        &self,
        task_id: &str,
        mode: Mode,
        stage: Stage,
        approval_type: impl Into<String>,
        description: impl Into<String>,
        details: serde_json::Value,
        timeout: Option<Duration>,
    ) -> Result<PendingApproval, ApprovalError> {
        {
            let pending = self.pending.lock().await;
            if pending.len() >= MAX_PENDING_REQUESTS {
                return TooManyPendingSnafu {
                    pending: pending.len(),
                    cap: MAX_PENDING_REQUESTS,
                }
                .fail();
            }
        }

        let approval_id = uuid::Uuid::new_v4().to_string();
        let approval_type = approval_type.into();
        let description = description.into();
        let (sender, receiver) = oneshot::channel();

        let request = ApprovalRequest {
            approval_id: approval_id.clone(),
            task_id: task_id.to_string(),
            mode,
            stage,
            approval_type: approval_type.clone(),
            description: description.clone(),
            details,
            status: ApprovalStatus::Pending,
            scope: None,
            modified_details: None,
        };
        self.pending.lock().await.insert(
            approval_id.clone(),
            Parked {
                request,
                sender: Some(sender),
            },
        );

        let _ = self
            .bus
            .publish(Event::new(
                task_id,
                mode,
                stage,
                EventPayload::ApprovalRequested {
                    approval_id: approval_id.clone(),
                    approval_type,
                    description,
                },
            ))
            .await;

        Ok(PendingApproval {
            approval_id,
            receiver,
            timeout,
        })
    }

    /// Resolve a pending approval. A no-op if `approval_id` is unknown or
    /// already resolved.
    pub async fn resolve_approval(
        &self,
        approval_id: &str,
        decision: ApprovalDecision,
        scope: Option<ApprovalScope>,
        modified_details: Option<serde_json::Value>,
        task_id: &str,
        mode: Mode,
        stage: Stage,
    ) {
        let sender = {
            let mut pending = self.pending.lock().await;
            let Some(parked) = pending.get_mut(approval_id) else {
                return;
            };
            let Some(sender) = parked.sender.take() else {
                // Already resolved once; idempotent no-op.
                return;
            };
            parked.request.status = decision.into();
            parked.request.scope = scope;
            parked.request.modified_details = modified_details.clone();
            sender
        };

        let _ = sender.send(ApprovalResolution {
            decision,
            scope,
            modified_details,
        });

        let event = self
            .bus
            .publish(Event::new(
                task_id,
                mode,
                stage,
                EventPayload::ApprovalResolved {
                    approval_id: approval_id.to_string(),
                    decision,
                    scope,
                },
            ))
            .await;
        if let Ok(event) = event {
            info!(approval_id, event_id = %event.event_id, ?decision, "approval resolved");
        }
    }

    pub async fn has_pending_approvals(&self) -> bool {
        self.pending
            .lock()
            .await
            .values()
            .any(|p| p.request.status == ApprovalStatus::Pending)
    }

    pub async fn pending_requests(&self) -> Vec<ApprovalRequest> {
        self.pending
            .lock()
            .await
            .values()
            .filter(|p| p.request.status == ApprovalStatus::Pending)
            .map(|p| p.request.clone())
            .collect()
    }

    pub async fn pending_count(&self) -> usize {
        self.pending
            .lock()
            .await
            .values()
            .filter(|p| p.request.status == ApprovalStatus::Pending)
            .count()
    }

    pub async fn stats(&self) -> ApprovalQueueStats {
        let pending = self.pending.lock().await;
        let mut stats = ApprovalQueueStats::default();
        for parked in pending.values() {
            match parked.request.status {
                ApprovalStatus::Pending => stats.pending += 1,
                ApprovalStatus::Approved => stats.approved += 1,
                ApprovalStatus::Denied => stats.denied += 1,
                ApprovalStatus::EditRequested => stats.edit_requested += 1,
            }
        }
        stats
    }
}

/// A handle to a request's eventual resolution.
pub struct PendingApproval {
    pub approval_id: String,
    receiver: oneshot::Receiver<ApprovalResolution>,
    timeout: Option<Duration>,
}

impl PendingApproval {
    /// Await the decision, applying the caller-opted-in timeout if one was
    /// supplied to `request_approval`.
    pub async fn wait(self) -> Result<ApprovalResolution, ApprovalError> {
        let approval_id = self.approval_id.clone();
        match self.timeout {
            Some(duration) => tokio::time::timeout(duration, self.receiver)
                .await
                .map_err(|_| TimedOutSnafu { approval_id: approval_id.clone() }.build())?
                .map_err(|_| ChannelClosedSnafu { approval_id }.build()),
            None => self
                .receiver
                .await
                .map_err(|_| ChannelClosedSnafu { approval_id }.build()),
        }
    }
}

#[cfg(test)]
#[path = "manager.test.rs"]
mod tests;
