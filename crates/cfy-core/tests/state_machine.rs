//! Exhaustive checks of the session state machine table.

use cfy_core::{SessionStatus, SessionStatus::*};
use pretty_assertions::assert_eq;

const ALL: [SessionStatus; 5] = [
    Unauthenticated,
    Resolving,
    AuthenticatedNoProfile,
    AuthenticatedWithProfile,
    ResolutionFailed,
];

#[test]
fn every_status_can_sign_out() {
    for status in ALL {
        assert!(
            status.can_transition_to(Unauthenticated),
            "{status} should allow sign-out"
        );
    }
}

#[test]
fn every_identity_event_goes_through_resolving() {
    for status in ALL {
        assert!(
            status.can_transition_to(Resolving),
            "{status} should allow a fresh identity event"
        );
    }
}

#[test]
fn only_resolving_reaches_outcomes() {
    let reaching: Vec<SessionStatus> = ALL
        .into_iter()
        .filter(|status| status.can_transition_to(AuthenticatedWithProfile))
        .collect();
    assert_eq!(reaching, vec![Resolving]);

    let failing: Vec<SessionStatus> = ALL
        .into_iter()
        .filter(|status| status.can_transition_to(ResolutionFailed))
        .collect();
    assert_eq!(failing, vec![Resolving]);
}

#[test]
fn display_matches_serde_names() {
    for status in ALL {
        let json = serde_json::to_string(&status).unwrap();
        assert_eq!(json, format!("\"{status}\""));
    }
}

#[test]
fn rejected_transition_reports_both_ends() {
    use cfy_core::{CoreError, SessionState};

    let error = SessionState::Unauthenticated
        .check_transition(&SessionState::ResolutionFailed {
            identity: cfy_core::Identity::new("u1", cfy_core::ProviderKind::Password),
            reason: "down".into(),
        })
        .unwrap_err();
    match &error {
        CoreError::InvalidTransition { from, to } => {
            assert_eq!((*from, *to), (Unauthenticated, ResolutionFailed));
        }
    }
    assert_eq!(
        error.to_string(),
        "Invalid session transition from unauthenticated to resolution_failed"
    );
}
