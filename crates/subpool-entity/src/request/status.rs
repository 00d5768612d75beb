//! Subscription request lifecycle states.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of a subscription request.
///
/// The only legal transitions leave `Pending`; the three other states are
/// terminal and absorb. Stores refuse illegal transitions with a conflict
/// error rather than silently overwriting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "request_status", rename_all = "lowercase")]
#[serde(rename_all = "UPPERCASE")]
pub enum RequestStatus {
    /// Queued: no eligible subscription had capacity at request time.
    Pending,
    /// A slot was reserved for this request.
    Assigned,
    /// Declined by an administrator.
    Rejected,
    /// Withdrawn by the requesting user.
    Cancelled,
}

impl RequestStatus {
    /// Whether this state accepts no further transitions.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Whether a transition from `self` to `next` is legal.
    pub fn can_transition_to(&self, next: RequestStatus) -> bool {
        matches!(self, Self::Pending) && next != Self::Pending
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Assigned => "assigned",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = subpool_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "assigned" => Ok(Self::Assigned),
            "rejected" => Ok(Self::Rejected),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(subpool_core::AppError::validation(format!(
                "Invalid request status: '{s}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_may_leave() {
        assert!(RequestStatus::Pending.can_transition_to(RequestStatus::Assigned));
        assert!(RequestStatus::Pending.can_transition_to(RequestStatus::Rejected));
        assert!(RequestStatus::Pending.can_transition_to(RequestStatus::Cancelled));
        assert!(!RequestStatus::Pending.can_transition_to(RequestStatus::Pending));
    }

    #[test]
    fn test_terminal_states_absorb() {
        for terminal in [
            RequestStatus::Assigned,
            RequestStatus::Rejected,
            RequestStatus::Cancelled,
        ] {
            assert!(terminal.is_terminal());
            for next in [
                RequestStatus::Pending,
                RequestStatus::Assigned,
                RequestStatus::Rejected,
                RequestStatus::Cancelled,
            ] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_wire_format_is_uppercase() {
        let json = serde_json::to_string(&RequestStatus::Pending).unwrap();
        assert_eq!(json, "\"PENDING\"");
        let parsed: RequestStatus = serde_json::from_str("\"ASSIGNED\"").unwrap();
        assert_eq!(parsed, RequestStatus::Assigned);
    }
}
