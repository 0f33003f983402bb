//! Order lifecycle state machine
//!
//! A pure transition table over `(OrderState, OrderEventKind)`. The table is
//! the single authority on legal order lifecycle movements; aggregates call
//! [`transition`] before mutating any field.

use crate::enums::{OrderEventKind, OrderState};
use crate::error::DomainError;

/// Look up the next state for an event kind arriving in `current`.
///
/// Terminal states (`Invalid`, `Denied`, `Rejected`, `Cancelled`, `Expired`,
/// `Filled`) accept no events. `Initialized` event kinds never transition:
/// creation is handled by the aggregate constructor, not by `apply`.
///
/// # Errors
/// Returns `DomainError::InvalidStateTransition` for any pair not in the
/// table.
pub fn transition(
    current: OrderState,
    event: OrderEventKind,
) -> Result<OrderState, DomainError> {
    use OrderEventKind as K;
    use OrderState as S;

    let next = match (current, event) {
        (S::Initialized, K::Submitted) => S::Submitted,
        (S::Initialized, K::Invalid) => S::Invalid,
        (S::Initialized, K::Denied) => S::Denied,

        (S::Submitted, K::Accepted) => S::Accepted,
        (S::Submitted, K::Rejected) => S::Rejected,

        (S::Accepted, K::Working) => S::Working,
        (S::Accepted, K::Cancelled) => S::Cancelled,
        (S::Accepted, K::PartiallyFilled) => S::PartiallyFilled,
        (S::Accepted, K::Filled) => S::Filled,

        (S::Working, K::Cancelled) => S::Cancelled,
        (S::Working, K::Expired) => S::Expired,
        (S::Working, K::Modified) => S::Working,
        (S::Working, K::PartiallyFilled) => S::PartiallyFilled,
        (S::Working, K::Filled) => S::Filled,

        (S::PartiallyFilled, K::PartiallyFilled) => S::PartiallyFilled,
        (S::PartiallyFilled, K::Filled) => S::Filled,
        (S::PartiallyFilled, K::Cancelled) => S::Cancelled,

        (current, attempted) => {
            return Err(DomainError::InvalidStateTransition { current, attempted });
        },
    };

    Ok(next)
}

impl OrderState {
    /// Whether this state accepts no further events
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderState::Invalid
                | OrderState::Denied
                | OrderState::Rejected
                | OrderState::Cancelled
                | OrderState::Expired
                | OrderState::Filled
        )
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use OrderEventKind as K;
    use OrderState as S;

    #[test]
    fn test_happy_path_to_filled() {
        let mut state = S::Initialized;
        for kind in [K::Submitted, K::Accepted, K::Working, K::PartiallyFilled, K::Filled] {
            state = transition(state, kind).unwrap();
        }
        assert_eq!(state, S::Filled);
    }

    #[test]
    fn test_modified_stays_working() {
        assert_eq!(transition(S::Working, K::Modified).unwrap(), S::Working);
    }

    #[test]
    fn test_terminal_states_accept_no_events() {
        let terminals = [S::Invalid, S::Denied, S::Rejected, S::Cancelled, S::Expired, S::Filled];
        let kinds = [
            K::Initialized,
            K::Invalid,
            K::Denied,
            K::Submitted,
            K::Accepted,
            K::Rejected,
            K::Working,
            K::Modified,
            K::Cancelled,
            K::Expired,
            K::PartiallyFilled,
            K::Filled,
        ];
        for state in terminals {
            assert!(state.is_terminal());
            for kind in kinds {
                assert!(transition(state, kind).is_err(), "{state} should reject {kind}");
            }
        }
    }

    #[test]
    fn test_initialized_event_never_transitions() {
        for state in [S::Initialized, S::Submitted, S::Accepted, S::Working, S::PartiallyFilled] {
            assert!(transition(state, K::Initialized).is_err());
        }
    }

    #[test]
    fn test_fill_from_submitted_rejected() {
        let err = transition(S::Submitted, K::Filled).unwrap_err();
        assert_eq!(
            err,
            DomainError::InvalidStateTransition {
                current: S::Submitted,
                attempted: K::Filled,
            }
        );
    }

    #[test]
    fn test_cancel_after_partial_fill() {
        assert_eq!(transition(S::PartiallyFilled, K::Cancelled).unwrap(), S::Cancelled);
    }
}
