//! Payment-gated registration workflow.
//!
//! The whole flow is one tagged state value with pure transitions. Commit is
//! reachable only through `ReadyToCommit`, which itself requires the payment
//! link to have been opened AND the dwell deadline to have passed, so a
//! "paid but didn't wait" combination is simply not representable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shared::{default_amount, CreateRegistrationRequest};

mod controller;

pub use controller::{FlowController, FlowError, DEFAULT_PAYMENT_LINK};

/// Minimum wait between opening the payment link and committing, in seconds
pub const DWELL_SECONDS: i64 = 5;

/// An uncommitted registration, owned by one client session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    pub couple_name: String,
    pub phone: String,
    pub number_of_kids: u32,
    /// Amount shown on the payment screen
    pub amount: f64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub husband_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub wife_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub last_name: Option<String>,
}

impl Draft {
    /// New draft with the amount derived from the kid count
    pub fn new(
        couple_name: impl Into<String>,
        phone: impl Into<String>,
        number_of_kids: u32,
    ) -> Self {
        Self {
            couple_name: couple_name.into(),
            phone: phone.into(),
            number_of_kids,
            amount: default_amount(number_of_kids),
            husband_name: None,
            wife_name: None,
            last_name: None,
        }
    }

    /// Local validation mirroring what the server will enforce
    pub fn validate(&self) -> Result<(), DraftError> {
        if self.couple_name.trim().is_empty() {
            return Err(DraftError::MissingCoupleName);
        }
        if self.phone.trim().is_empty() {
            return Err(DraftError::MissingPhone);
        }
        Ok(())
    }
}

impl From<&Draft> for CreateRegistrationRequest {
    fn from(draft: &Draft) -> Self {
        CreateRegistrationRequest {
            couple_name: Some(draft.couple_name.clone()),
            phone: Some(draft.phone.clone()),
            number_of_kids: Some(draft.number_of_kids as i64),
            amount: Some(draft.amount),
            husband_name: draft.husband_name.clone(),
            wife_name: draft.wife_name.clone(),
            last_name: draft.last_name.clone(),
        }
    }
}

/// Field-level problems, surfaced next to the offending input
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DraftError {
    #[error("Couple name is required")]
    MissingCoupleName,
    #[error("Phone number is required")]
    MissingPhone,
}

/// Why a commit attempt failed. The draft is preserved either way.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CommitError {
    /// The server rejected the registration; user-correctable
    #[error("{0}")]
    Rejected(String),
    /// Transport or server failure; retry from the same place
    #[error("Could not reach the registration server. Please try again.")]
    Unavailable,
}

/// The one flow state
#[derive(Debug, Clone, PartialEq)]
pub enum FlowState {
    /// Filling in the form
    Intake,
    /// Draft validated; waiting for the user to open the payment link
    AwaitingPayment { draft: Draft },
    /// Payment link opened; dwell timer running until `gate_opens_at`
    Gated {
        draft: Draft,
        gate_opens_at: DateTime<Utc>,
    },
    /// Both gates satisfied; commit may be requested
    ReadyToCommit {
        draft: Draft,
        error: Option<CommitError>,
    },
    /// Submission in flight
    Committing { draft: Draft },
    /// Terminal: the server owns the registration now
    Committed { registration_id: String },
    /// Terminal: the user walked away before committing
    Abandoned,
}

impl FlowState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, FlowState::Committed { .. } | FlowState::Abandoned)
    }

    /// The draft carried by the current state, if any
    pub fn draft(&self) -> Option<&Draft> {
        match self {
            FlowState::AwaitingPayment { draft }
            | FlowState::Gated { draft, .. }
            | FlowState::ReadyToCommit { draft, .. }
            | FlowState::Committing { draft } => Some(draft),
            _ => None,
        }
    }
}

/// Everything that can happen to the flow
#[derive(Debug, Clone, PartialEq)]
pub enum FlowEvent {
    DetailsSubmitted { draft: Draft },
    PaymentLinkOpened { at: DateTime<Utc> },
    /// Dwell deadline reached (or claimed); checked against `gate_opens_at`
    DwellElapsed { at: DateTime<Utc> },
    CommitRequested,
    CommitSucceeded { registration_id: String },
    CommitFailed { error: CommitError },
    Cancelled,
}

/// Pure transition function.
///
/// Pairs not listed leave the state unchanged, which makes stale timer
/// callbacks and duplicate clicks inert.
pub fn transition(state: FlowState, event: FlowEvent) -> FlowState {
    match (state, event) {
        (FlowState::Intake, FlowEvent::DetailsSubmitted { draft })
            if draft.validate().is_ok() =>
        {
            FlowState::AwaitingPayment { draft }
        }

        (FlowState::AwaitingPayment { draft }, FlowEvent::PaymentLinkOpened { at }) => {
            FlowState::Gated {
                draft,
                gate_opens_at: at + chrono::Duration::seconds(DWELL_SECONDS),
            }
        }

        (FlowState::Gated { draft, gate_opens_at }, FlowEvent::DwellElapsed { at }) => {
            if at >= gate_opens_at {
                FlowState::ReadyToCommit { draft, error: None }
            } else {
                // Premature elapse claim; the gate stays shut
                FlowState::Gated { draft, gate_opens_at }
            }
        }

        (FlowState::ReadyToCommit { draft, .. }, FlowEvent::CommitRequested) => {
            FlowState::Committing { draft }
        }

        (FlowState::Committing { .. }, FlowEvent::CommitSucceeded { registration_id }) => {
            FlowState::Committed { registration_id }
        }

        (FlowState::Committing { draft }, FlowEvent::CommitFailed { error }) => {
            FlowState::ReadyToCommit {
                draft,
                error: Some(error),
            }
        }

        (state, FlowEvent::Cancelled) if !state.is_terminal() => FlowState::Abandoned,

        (state, _) => state,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn draft() -> Draft {
        Draft::new("Anna & Boris", "555-1234", 2)
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 12, 31, 18, 0, 0).unwrap()
    }

    fn gated() -> FlowState {
        transition(
            FlowState::AwaitingPayment { draft: draft() },
            FlowEvent::PaymentLinkOpened { at: t0() },
        )
    }

    #[test]
    fn test_valid_details_move_to_awaiting_payment() {
        let next = transition(
            FlowState::Intake,
            FlowEvent::DetailsSubmitted { draft: draft() },
        );
        assert_eq!(next, FlowState::AwaitingPayment { draft: draft() });
    }

    #[test]
    fn test_invalid_details_stay_in_intake() {
        let next = transition(
            FlowState::Intake,
            FlowEvent::DetailsSubmitted {
                draft: Draft::new("", "555-1234", 0),
            },
        );
        assert_eq!(next, FlowState::Intake);
    }

    #[test]
    fn test_payment_link_starts_the_dwell_clock() {
        let next = gated();
        assert_eq!(
            next,
            FlowState::Gated {
                draft: draft(),
                gate_opens_at: t0() + chrono::Duration::seconds(DWELL_SECONDS),
            }
        );
    }

    #[test]
    fn test_gate_rejects_commit_before_dwell() {
        // 4.9 seconds after the click: still gated
        let at = t0() + chrono::Duration::milliseconds(4_900);
        let next = transition(gated(), FlowEvent::DwellElapsed { at });
        assert!(matches!(next, FlowState::Gated { .. }));

        // CommitRequested straight from Gated does nothing either
        let next = transition(gated(), FlowEvent::CommitRequested);
        assert!(matches!(next, FlowState::Gated { .. }));
    }

    #[test]
    fn test_gate_opens_after_dwell() {
        // 5.1 seconds after the click: ready
        let at = t0() + chrono::Duration::milliseconds(5_100);
        let next = transition(gated(), FlowEvent::DwellElapsed { at });
        assert_eq!(
            next,
            FlowState::ReadyToCommit {
                draft: draft(),
                error: None,
            }
        );
    }

    #[test]
    fn test_commit_requires_ready_state() {
        // CommitRequested is ignored everywhere except ReadyToCommit
        for state in [
            FlowState::Intake,
            FlowState::AwaitingPayment { draft: draft() },
            gated(),
        ] {
            let next = transition(state.clone(), FlowEvent::CommitRequested);
            assert_eq!(next, state);
        }

        let ready = FlowState::ReadyToCommit {
            draft: draft(),
            error: None,
        };
        let next = transition(ready, FlowEvent::CommitRequested);
        assert_eq!(next, FlowState::Committing { draft: draft() });
    }

    #[test]
    fn test_commit_failure_returns_to_ready_with_draft_preserved() {
        let next = transition(
            FlowState::Committing { draft: draft() },
            FlowEvent::CommitFailed {
                error: CommitError::Unavailable,
            },
        );

        let FlowState::ReadyToCommit { draft: kept, error } = next else {
            panic!("expected ReadyToCommit");
        };
        assert_eq!(kept, draft());
        assert_eq!(error, Some(CommitError::Unavailable));
    }

    #[test]
    fn test_commit_success_is_terminal() {
        let next = transition(
            FlowState::Committing { draft: draft() },
            FlowEvent::CommitSucceeded {
                registration_id: "registration::1::aa".to_string(),
            },
        );
        assert_eq!(
            next,
            FlowState::Committed {
                registration_id: "registration::1::aa".to_string(),
            }
        );
        assert!(next.is_terminal());
    }

    #[test]
    fn test_cancellation_absorbs_every_pre_commit_state() {
        for state in [
            FlowState::Intake,
            FlowState::AwaitingPayment { draft: draft() },
            gated(),
            FlowState::ReadyToCommit {
                draft: draft(),
                error: None,
            },
            FlowState::Committing { draft: draft() },
        ] {
            assert_eq!(transition(state, FlowEvent::Cancelled), FlowState::Abandoned);
        }

        // A committed flow stays committed
        let committed = FlowState::Committed {
            registration_id: "registration::1::aa".to_string(),
        };
        assert_eq!(transition(committed.clone(), FlowEvent::Cancelled), committed);
    }

    #[test]
    fn test_stale_timer_event_is_inert_after_abandonment() {
        let at = t0() + chrono::Duration::seconds(60);
        let next = transition(FlowState::Abandoned, FlowEvent::DwellElapsed { at });
        assert_eq!(next, FlowState::Abandoned);
    }
}
