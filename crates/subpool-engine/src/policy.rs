//! Candidate selection policy.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use subpool_core::AppError;
use subpool_entity::subscription::Subscription;

/// How the engine orders eligible subscriptions before reserving.
///
/// The tie-break is always `created_at` ascending, so the ordering is
/// fully deterministic for any fixed set of candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionPolicy {
    /// Fill the fullest compatible subscription first
    /// (`available_slots ASC`). Consolidates members onto fewer accounts.
    #[default]
    FewestAvailableFirst,
    /// Fill the emptiest subscription first (`available_slots DESC`).
    MostAvailableFirst,
}

impl SelectionPolicy {
    /// Compare two candidates under this policy.
    pub fn compare(&self, a: &Subscription, b: &Subscription) -> Ordering {
        let by_slots = match self {
            Self::FewestAvailableFirst => a.available_slots.cmp(&b.available_slots),
            Self::MostAvailableFirst => b.available_slots.cmp(&a.available_slots),
        };
        by_slots.then_with(|| a.created_at.cmp(&b.created_at))
    }

    /// Sort candidates in place into assignment preference order.
    pub fn sort(&self, candidates: &mut [Subscription]) {
        candidates.sort_by(|a, b| self.compare(a, b));
    }

    /// SQL `ORDER BY` clause implementing this policy.
    pub fn sql_order_clause(&self) -> &'static str {
        match self {
            Self::FewestAvailableFirst => "available_slots ASC, created_at ASC",
            Self::MostAvailableFirst => "available_slots DESC, created_at ASC",
        }
    }

    /// Return the policy as its configuration string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FewestAvailableFirst => "fewest_available_first",
            Self::MostAvailableFirst => "most_available_first",
        }
    }
}

impl fmt::Display for SelectionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SelectionPolicy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fewest_available_first" => Ok(Self::FewestAvailableFirst),
            "most_available_first" => Ok(Self::MostAvailableFirst),
            _ => Err(AppError::configuration(format!(
                "Invalid selection policy: '{s}'. \
                 Expected 'fewest_available_first' or 'most_available_first'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn subscription(available: i32, age_minutes: i64) -> Subscription {
        let created = Utc::now() - Duration::minutes(age_minutes);
        Subscription {
            id: Uuid::new_v4(),
            service_provider_id: Uuid::new_v4(),
            country_id: None,
            name: "s".to_string(),
            email: "s@example.com".to_string(),
            password_hash: "hash".to_string(),
            available_slots: available,
            total_slots: 5,
            user_price: None,
            currency_id: None,
            renewal_info: None,
            metadata: None,
            expires_at: None,
            is_active: true,
            created_at: created,
            updated_at: created,
        }
    }

    #[test]
    fn test_fewest_available_wins_regardless_of_age() {
        // A is nearly full but newer; B has plenty of room but is older.
        let a = subscription(1, 10);
        let b = subscription(3, 60);
        let mut candidates = vec![b.clone(), a.clone()];
        SelectionPolicy::FewestAvailableFirst.sort(&mut candidates);
        assert_eq!(candidates[0].id, a.id);
        assert_eq!(candidates[1].id, b.id);
    }

    #[test]
    fn test_age_breaks_ties() {
        let older = subscription(2, 120);
        let newer = subscription(2, 5);
        let mut candidates = vec![newer.clone(), older.clone()];
        SelectionPolicy::FewestAvailableFirst.sort(&mut candidates);
        assert_eq!(candidates[0].id, older.id);
    }

    #[test]
    fn test_most_available_first_inverts() {
        let a = subscription(1, 10);
        let b = subscription(3, 60);
        let mut candidates = vec![a.clone(), b.clone()];
        SelectionPolicy::MostAvailableFirst.sort(&mut candidates);
        assert_eq!(candidates[0].id, b.id);
    }

    #[test]
    fn test_from_str() {
        assert_eq!(
            "fewest_available_first"
                .parse::<SelectionPolicy>()
                .unwrap(),
            SelectionPolicy::FewestAvailableFirst
        );
        assert!("round_robin".parse::<SelectionPolicy>().is_err());
    }
}
