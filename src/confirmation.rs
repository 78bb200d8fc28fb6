//! # Confirmation Gate
//!
//! Turns a yes/no prompt into a single-shot awaitable. `request` opens the
//! gate and hands the caller a [`ConfirmationHandle`]; the UI side later calls
//! `confirm` or `decline`, which settles the handle exactly once and closes
//! the gate. The gate must be re-opened with another `request` for the next
//! question.
//!
//! A handle awaited with [`ConfirmationHandle::decision`] waits until the
//! user acts, with no upper bound. [`ConfirmationHandle::decision_within`]
//! is the opt-in timeout; on expiry the request is withdrawn and the gate
//! closes, so a late `confirm` settles nothing.

use crate::error::GateError;
use futures::future::BoxFuture;
use futures::FutureExt;
use log::{debug, info, warn};
use std::future::IntoFuture;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use tokio::sync::oneshot;
use uuid::Uuid;

/// Whether a question is currently outstanding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateStatus {
    Closed,
    Open,
}

/// The outstanding question held by an open gate
#[derive(Debug)]
struct ConfirmationRequest {
    request_id: Uuid,
    message: String,
    responder: oneshot::Sender<bool>,
}

/// Shared single-shot yes/no gate.
///
/// Clones share the same state, so the flow awaiting a decision and the UI
/// handler settling it can each hold one.
#[derive(Debug, Clone, Default)]
pub struct ConfirmationGate {
    pending: Arc<Mutex<Option<ConfirmationRequest>>>,
}

type PendingSlot = Mutex<Option<ConfirmationRequest>>;

fn lock_slot(slot: &PendingSlot) -> MutexGuard<'_, Option<ConfirmationRequest>> {
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ConfirmationGate {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<ConfirmationRequest>> {
        lock_slot(&self.pending)
    }

    pub fn status(&self) -> GateStatus {
        if self.lock().is_some() {
            GateStatus::Open
        } else {
            GateStatus::Closed
        }
    }

    pub fn is_open(&self) -> bool {
        self.status() == GateStatus::Open
    }

    /// Message of the outstanding request
    pub fn message(&self) -> Option<String> {
        self.lock().as_ref().map(|request| request.message.clone())
    }

    /// Open the gate with `message`.
    ///
    /// Fails with [`GateError::Busy`] while another request is outstanding;
    /// that request is left untouched.
    pub fn request(&self, message: impl Into<String>) -> Result<ConfirmationHandle, GateError> {
        let mut pending = self.lock();
        if let Some(outstanding) = pending.as_ref() {
            warn!(
                "Confirmation {} still pending, refusing a second request",
                outstanding.request_id
            );
            return Err(GateError::Busy {
                message: outstanding.message.clone(),
            });
        }

        let (responder, receiver) = oneshot::channel();
        let request_id = Uuid::new_v4();
        let message = message.into();
        debug!("Confirmation {} opened: {}", request_id, message);
        *pending = Some(ConfirmationRequest {
            request_id,
            message,
            responder,
        });

        Ok(ConfirmationHandle {
            request_id,
            receiver,
            gate: Arc::downgrade(&self.pending),
        })
    }

    /// Settle the outstanding request with `true`. Returns false if none was open.
    pub fn confirm(&self) -> bool {
        self.settle(true)
    }

    /// Settle the outstanding request with `false`. Returns false if none was open.
    pub fn decline(&self) -> bool {
        self.settle(false)
    }

    fn settle(&self, decision: bool) -> bool {
        let Some(request) = self.lock().take() else {
            debug!("Ignoring confirmation decision {}: gate is closed", decision);
            return false;
        };
        info!(
            "Confirmation {} settled: {}",
            request.request_id,
            if decision { "confirmed" } else { "declined" }
        );
        if request.responder.send(decision).is_err() {
            debug!(
                "Confirmation {} settled after its caller stopped waiting",
                request.request_id
            );
        }
        true
    }
}

/// Caller side of one confirmation request; resolves to the user's decision.
///
/// Only [`ConfirmationGate::request`] creates one, so a decision always
/// comes from an opened gate.
#[derive(Debug)]
pub struct ConfirmationHandle {
    request_id: Uuid,
    receiver: oneshot::Receiver<bool>,
    gate: Weak<PendingSlot>,
}

impl ConfirmationHandle {
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    fn abandoned(request_id: Uuid) -> GateError {
        GateError::Abandoned {
            request_id: request_id.to_string(),
        }
    }

    /// Wait for the decision with no time limit
    pub async fn decision(self) -> Result<bool, GateError> {
        let request_id = self.request_id;
        self.receiver.await.map_err(|_| Self::abandoned(request_id))
    }

    /// Wait at most `limit`. On expiry the request is withdrawn and the gate
    /// closes; a decision that raced the deadline still wins.
    pub async fn decision_within(mut self, limit: Duration) -> Result<bool, GateError> {
        match tokio::time::timeout(limit, &mut self.receiver).await {
            Ok(decision) => decision.map_err(|_| Self::abandoned(self.request_id)),
            Err(_) => {
                if self.withdraw() {
                    return Err(GateError::TimedOut {
                        request_id: self.request_id.to_string(),
                        timeout_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                    });
                }
                self.receiver
                    .try_recv()
                    .map_err(|_| Self::abandoned(self.request_id))
            }
        }
    }

    /// Wait with an optional limit
    pub async fn decision_with(self, limit: Option<Duration>) -> Result<bool, GateError> {
        match limit {
            Some(limit) => self.decision_within(limit).await,
            None => self.decision().await,
        }
    }

    /// Close the gate if it still holds this request. False when the request
    /// was already settled or the gate is gone.
    fn withdraw(&self) -> bool {
        let Some(slot) = self.gate.upgrade() else {
            return false;
        };
        let mut pending = lock_slot(&slot);
        if pending.as_ref().map(|request| request.request_id) != Some(self.request_id) {
            return false;
        }
        *pending = None;
        info!("Confirmation {} withdrawn after timeout", self.request_id);
        true
    }
}

impl IntoFuture for ConfirmationHandle {
    type Output = Result<bool, GateError>;
    type IntoFuture = BoxFuture<'static, Result<bool, GateError>>;

    fn into_future(self) -> Self::IntoFuture {
        self.decision().boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_confirm_resolves_true_and_closes() {
        let gate = ConfirmationGate::new();
        assert_eq!(gate.status(), GateStatus::Closed);

        let handle = gate.request("Discard all mappings?").unwrap();
        assert!(gate.is_open());
        assert_eq!(gate.message().as_deref(), Some("Discard all mappings?"));

        assert!(gate.confirm());
        assert_eq!(gate.status(), GateStatus::Closed);
        assert_eq!(gate.message(), None);
        assert_eq!(handle.await, Ok(true));
    }

    #[tokio::test]
    async fn test_decline_resolves_false() {
        let gate = ConfirmationGate::new();
        let handle = gate.request("Proceed?").unwrap();
        assert!(gate.decline());
        assert_eq!(handle.decision().await, Ok(false));
    }

    #[tokio::test]
    async fn test_second_settle_is_noop() {
        let gate = ConfirmationGate::new();
        let handle = gate.request("Proceed?").unwrap();
        assert!(gate.confirm());
        assert!(!gate.decline());
        assert!(!gate.confirm());
        assert_eq!(handle.await, Ok(true));
    }

    #[tokio::test]
    async fn test_request_while_open_is_rejected() {
        let gate = ConfirmationGate::new();
        let first = gate.request("first").unwrap();
        assert_eq!(
            gate.request("second").unwrap_err(),
            GateError::Busy {
                message: "first".to_string()
            }
        );
        assert_eq!(gate.message().as_deref(), Some("first"));

        gate.decline();
        assert_eq!(first.await, Ok(false));

        let again = gate.request("second").unwrap();
        gate.confirm();
        assert_eq!(again.await, Ok(true));
    }

    #[tokio::test]
    async fn test_waiter_suspends_until_ui_acts() {
        let gate = ConfirmationGate::new();
        let handle = gate.request("Proceed?").unwrap();

        let waiter = tokio::spawn(async move { handle.decision().await });
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        let ui = gate.clone();
        ui.confirm();
        assert_eq!(waiter.await.unwrap(), Ok(true));
    }

    #[tokio::test]
    async fn test_timeout_withdraws_request() {
        let gate = ConfirmationGate::new();
        let handle = gate.request("Proceed?").unwrap();
        let err = handle
            .decision_within(Duration::from_millis(10))
            .await
            .unwrap_err();
        assert!(matches!(err, GateError::TimedOut { timeout_ms: 10, .. }));
        assert!(!gate.is_open());
        assert_eq!(gate.message(), None);
        assert!(!gate.confirm());

        let next = gate.request("Again?").unwrap();
        assert!(gate.confirm());
        assert_eq!(next.await, Ok(true));
    }

    #[tokio::test]
    async fn test_decision_before_deadline_is_kept() {
        let gate = ConfirmationGate::new();
        let handle = gate.request("Proceed?").unwrap();
        assert!(gate.decline());
        assert_eq!(
            handle.decision_within(Duration::from_millis(50)).await,
            Ok(false)
        );
    }

    #[tokio::test]
    async fn test_timeout_leaves_newer_request_alone() {
        let gate = ConfirmationGate::new();
        let stale = gate.request("first").unwrap();
        assert!(gate.decline());
        let current = gate.request("second").unwrap();

        // The stale handle was settled; its deadline must not touch "second".
        assert_eq!(
            stale.decision_within(Duration::from_millis(5)).await,
            Ok(false)
        );
        assert_eq!(gate.message().as_deref(), Some("second"));
        assert!(gate.confirm());
        assert_eq!(current.await, Ok(true));
    }

    #[tokio::test]
    async fn test_dropped_gate_abandons_handle() {
        let gate = ConfirmationGate::new();
        let handle = gate.request("Proceed?").unwrap();
        drop(gate);
        assert!(matches!(handle.await, Err(GateError::Abandoned { .. })));
    }

    #[tokio::test]
    async fn test_decision_with_no_limit_waits() {
        let gate = ConfirmationGate::new();
        let handle = gate.request("Proceed?").unwrap();
        let waiter = tokio::spawn(async move { handle.decision_with(None).await });
        tokio::task::yield_now().await;
        assert!(gate.confirm());
        assert_eq!(waiter.await.unwrap(), Ok(true));
    }
}
