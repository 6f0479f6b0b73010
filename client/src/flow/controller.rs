use std::sync::Arc;

use chrono::Utc;
use log::{debug, info, warn};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

use super::{transition, CommitError, Draft, DraftError, FlowEvent, FlowState, DWELL_SECONDS};
use crate::api::{ApiError, RegistrationApi};
use crate::session::{SessionStore, DRAFT_KEY};

/// Payment link presented when none is configured explicitly
pub const DEFAULT_PAYMENT_LINK: &str = "https://cash.app/$hgspringfield/100";

/// Reasons a user action was refused outright, as opposed to a commit that
/// was attempted and failed (which lands in `ReadyToCommit { error }`).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlowError {
    #[error("Please open the payment link to complete your payment first")]
    PaymentNotAcknowledged,
    #[error("Please wait a few seconds after opening the payment link")]
    GateStillClosed,
    #[error("Nothing to commit in the current state")]
    NotReady,
}

/// Drives one session's registration flow.
///
/// Owns the state machine, persists the draft through the injected session
/// store, and schedules the dwell timer. Background work delivers events
/// through a channel; `pump_events` applies whatever has arrived.
pub struct FlowController {
    state: FlowState,
    session: Arc<dyn SessionStore>,
    api: Arc<dyn RegistrationApi>,
    events_tx: UnboundedSender<FlowEvent>,
    events_rx: UnboundedReceiver<FlowEvent>,
    dwell_task: Option<JoinHandle<()>>,
    payment_link: String,
}

impl FlowController {
    pub fn new(session: Arc<dyn SessionStore>, api: Arc<dyn RegistrationApi>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            state: FlowState::Intake,
            session,
            api,
            events_tx,
            events_rx,
            dwell_task: None,
            payment_link: DEFAULT_PAYMENT_LINK.to_string(),
        }
    }

    pub fn with_payment_link(mut self, link: impl Into<String>) -> Self {
        self.payment_link = link.into();
        self
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    /// Draft left behind by an earlier session, for form prefill
    pub fn restore_draft(&self) -> Option<Draft> {
        let raw = self.session.get(DRAFT_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(draft) => Some(draft),
            Err(e) => {
                warn!("Stored draft is unparsable ({}); ignoring it", e);
                None
            }
        }
    }

    /// Validate and accept the intake form.
    ///
    /// On success the draft is persisted session-locally, so a page reload
    /// lands back on the form with the data intact.
    pub fn submit_details(&mut self, draft: Draft) -> Result<(), DraftError> {
        draft.validate()?;
        self.save_draft(&draft);
        self.apply(FlowEvent::DetailsSubmitted { draft });
        Ok(())
    }

    /// Record that the user opened the payment link and start the dwell
    /// timer. Returns the link to open.
    pub fn open_payment_link(&mut self) -> &str {
        self.apply(FlowEvent::PaymentLinkOpened { at: Utc::now() });

        if let FlowState::Gated { gate_opens_at, .. } = &self.state {
            let deadline = *gate_opens_at;
            let events_tx = self.events_tx.clone();

            self.cancel_dwell_timer();
            self.dwell_task = Some(tokio::spawn(async move {
                tokio::time::sleep(std::time::Duration::from_secs(DWELL_SECONDS as u64)).await;
                // The receiver may be gone if the session was torn down
                let _ = events_tx.send(FlowEvent::DwellElapsed { at: deadline });
            }));
        }

        &self.payment_link
    }

    /// Apply events delivered by background tasks (the dwell timer)
    pub fn pump_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.apply(event);
        }
    }

    /// Attempt the commit. Refused unless the payment link was opened and
    /// the dwell time has passed; an attempted-but-failed commit instead
    /// returns the flow to `ReadyToCommit` with the error attached.
    pub async fn confirm(&mut self) -> Result<(), FlowError> {
        self.pump_events();

        match &self.state {
            FlowState::AwaitingPayment { .. } => return Err(FlowError::PaymentNotAcknowledged),
            FlowState::Gated { gate_opens_at, .. } => {
                // The timer event may still be in flight; trust the clock
                if Utc::now() < *gate_opens_at {
                    return Err(FlowError::GateStillClosed);
                }
                self.apply(FlowEvent::DwellElapsed { at: Utc::now() });
            }
            FlowState::ReadyToCommit { .. } => {}
            _ => return Err(FlowError::NotReady),
        }

        let FlowState::ReadyToCommit { draft, .. } = self.state.clone() else {
            return Err(FlowError::NotReady);
        };

        self.apply(FlowEvent::CommitRequested);

        let result = self.api.register((&draft).into()).await;
        match result {
            Ok(response) => {
                info!("Registration committed: {}", response.registration.id);
                self.clear_draft();
                self.apply(FlowEvent::CommitSucceeded {
                    registration_id: response.registration.id,
                });
            }
            Err(error) => {
                warn!("Commit failed: {}", error);
                let commit_error = match error {
                    ApiError::Rejected(message) => CommitError::Rejected(message),
                    _ => CommitError::Unavailable,
                };
                self.apply(FlowEvent::CommitFailed {
                    error: commit_error,
                });
            }
        }

        Ok(())
    }

    /// Explicit cancellation. The stored draft is NOT cleared, so a later
    /// visit resumes from intake with the data prefilled.
    pub fn cancel(&mut self) {
        self.apply(FlowEvent::Cancelled);
        self.cancel_dwell_timer();
    }

    /// Tear down background work. A pending dwell callback must never fire
    /// against a session that no longer exists.
    pub fn teardown(&mut self) {
        self.cancel_dwell_timer();
    }

    fn cancel_dwell_timer(&mut self) {
        if let Some(task) = self.dwell_task.take() {
            task.abort();
            debug!("Dwell timer cancelled");
        }
    }

    fn apply(&mut self, event: FlowEvent) {
        let next = transition(self.state.clone(), event);
        if next != self.state {
            debug!("Flow state: {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }

    fn save_draft(&self, draft: &Draft) {
        match serde_json::to_string(draft) {
            Ok(raw) => {
                if let Err(e) = self.session.set(DRAFT_KEY, &raw) {
                    warn!("Could not persist draft: {}", e);
                }
            }
            Err(e) => warn!("Could not serialize draft: {}", e),
        }
    }

    fn clear_draft(&self) {
        if let Err(e) = self.session.remove(DRAFT_KEY) {
            warn!("Could not clear stored draft: {}", e);
        }
    }
}

impl Drop for FlowController {
    fn drop(&mut self) {
        self.teardown();
    }
}
