// Postgres enum types shared by models, queries and the API surface.

pub mod types {
    use serde::{Deserialize, Serialize};
    use std::fmt;
    use std::str::FromStr;
    use utoipa::ToSchema;

    #[derive(
        Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type, ToSchema,
    )]
    #[sqlx(type_name = "user_role", rename_all = "lowercase")]
    #[serde(rename_all = "lowercase")]
    pub enum UserRole {
        #[default]
        Client,
        Provider,
        Admin,
    }

    impl UserRole {
        pub fn as_str(&self) -> &'static str {
            match self {
                UserRole::Client => "client",
                UserRole::Provider => "provider",
                UserRole::Admin => "admin",
            }
        }
    }

    impl fmt::Display for UserRole {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.as_str())
        }
    }

    impl FromStr for UserRole {
        type Err = String;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            match s.to_lowercase().as_str() {
                "client" => Ok(UserRole::Client),
                "provider" => Ok(UserRole::Provider),
                "admin" => Ok(UserRole::Admin),
                _ => Err(format!("Invalid role: {}", s)),
            }
        }
    }

    /// Lifecycle of a booking.
    ///
    /// ```text
    /// pending ──► confirmed ──► in_progress ──► completed
    ///    │            │              │
    ///    └─► cancelled◄┘              └──► disputed ──► completed | cancelled
    /// ```
    ///
    /// `completed` and `cancelled` are terminal.
    #[derive(
        Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type, ToSchema,
    )]
    #[sqlx(type_name = "booking_status", rename_all = "snake_case")]
    #[serde(rename_all = "snake_case")]
    pub enum BookingStatus {
        #[default]
        Pending,
        Confirmed,
        InProgress,
        Completed,
        Cancelled,
        Disputed,
    }

    impl BookingStatus {
        pub const ALL: [BookingStatus; 6] = [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::InProgress,
            BookingStatus::Completed,
            BookingStatus::Cancelled,
            BookingStatus::Disputed,
        ];

        /// Statuses reachable in one step from `self`.
        pub fn allowed_transitions(self) -> &'static [BookingStatus] {
            use BookingStatus::*;
            match self {
                Pending => &[Confirmed, Cancelled],
                Confirmed => &[InProgress, Cancelled],
                InProgress => &[Completed, Disputed],
                Disputed => &[Completed, Cancelled],
                Completed | Cancelled => &[],
            }
        }

        pub fn can_transition_to(self, next: BookingStatus) -> bool {
            self.allowed_transitions().contains(&next)
        }

        pub fn is_terminal(self) -> bool {
            self.allowed_transitions().is_empty()
        }

        /// Pending, confirmed or in progress: the booking still occupies the provider.
        pub fn is_live(self) -> bool {
            matches!(
                self,
                BookingStatus::Pending | BookingStatus::Confirmed | BookingStatus::InProgress
            )
        }

        pub fn as_str(&self) -> &'static str {
            match self {
                BookingStatus::Pending => "pending",
                BookingStatus::Confirmed => "confirmed",
                BookingStatus::InProgress => "in_progress",
                BookingStatus::Completed => "completed",
                BookingStatus::Cancelled => "cancelled",
                BookingStatus::Disputed => "disputed",
            }
        }
    }

    impl fmt::Display for BookingStatus {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.as_str())
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
    #[sqlx(type_name = "booking_type", rename_all = "lowercase")]
    #[serde(rename_all = "lowercase")]
    pub enum BookingType {
        Instant,
        Scheduled,
    }

    #[derive(
        Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type, ToSchema,
    )]
    #[sqlx(type_name = "verification_status", rename_all = "lowercase")]
    #[serde(rename_all = "lowercase")]
    pub enum VerificationStatus {
        #[default]
        Pending,
        Verified,
        Rejected,
    }

    #[derive(
        Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type, ToSchema,
    )]
    #[sqlx(type_name = "provider_tier", rename_all = "lowercase")]
    #[serde(rename_all = "lowercase")]
    pub enum ProviderTier {
        #[default]
        Basic,
        Pro,
        Elite,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
    #[sqlx(type_name = "service_category", rename_all = "snake_case")]
    #[serde(rename_all = "snake_case")]
    pub enum ServiceCategory {
        Transport,
        HomeServices,
        Health,
        Professional,
        Agriculture,
        Construction,
    }

    impl ServiceCategory {
        pub fn as_str(&self) -> &'static str {
            match self {
                ServiceCategory::Transport => "transport",
                ServiceCategory::HomeServices => "home_services",
                ServiceCategory::Health => "health",
                ServiceCategory::Professional => "professional",
                ServiceCategory::Agriculture => "agriculture",
                ServiceCategory::Construction => "construction",
            }
        }
    }

    #[derive(
        Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type, ToSchema,
    )]
    #[sqlx(type_name = "payment_status", rename_all = "lowercase")]
    #[serde(rename_all = "lowercase")]
    pub enum PaymentStatus {
        #[default]
        Pending,
        Paid,
        Refunded,
    }
}

#[cfg(test)]
mod tests {
    use super::types::*;

    #[test]
    fn test_happy_path_transitions() {
        assert!(BookingStatus::Pending.can_transition_to(BookingStatus::Confirmed));
        assert!(BookingStatus::Confirmed.can_transition_to(BookingStatus::InProgress));
        assert!(BookingStatus::InProgress.can_transition_to(BookingStatus::Completed));
    }

    #[test]
    fn test_rejected_transitions() {
        assert!(!BookingStatus::Confirmed.can_transition_to(BookingStatus::Pending));
        assert!(!BookingStatus::Completed.can_transition_to(BookingStatus::Pending));
        assert!(!BookingStatus::Pending.can_transition_to(BookingStatus::Completed));
        assert!(!BookingStatus::Cancelled.can_transition_to(BookingStatus::Confirmed));
        assert!(!BookingStatus::Pending.can_transition_to(BookingStatus::Disputed));
    }

    #[test]
    fn test_terminal_statuses() {
        let terminal: Vec<_> = BookingStatus::ALL
            .into_iter()
            .filter(|s| s.is_terminal())
            .collect();
        assert_eq!(terminal, vec![BookingStatus::Completed, BookingStatus::Cancelled]);
    }

    #[test]
    fn test_no_self_loops() {
        for status in BookingStatus::ALL {
            assert!(!status.can_transition_to(status), "{} loops onto itself", status);
        }
    }

    #[test]
    fn test_every_status_reachable_from_pending() {
        let mut seen = vec![BookingStatus::Pending];
        let mut frontier = vec![BookingStatus::Pending];
        while let Some(status) = frontier.pop() {
            for next in status.allowed_transitions() {
                if !seen.contains(next) {
                    seen.push(*next);
                    frontier.push(*next);
                }
            }
        }
        assert_eq!(seen.len(), BookingStatus::ALL.len());
    }

    #[test]
    fn test_status_serde_names() {
        assert_eq!(
            serde_json::to_string(&BookingStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
        let parsed: BookingStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(parsed, BookingStatus::Cancelled);
        assert_eq!(
            serde_json::to_string(&ServiceCategory::HomeServices).unwrap(),
            "\"home_services\""
        );
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("Provider".parse::<UserRole>().unwrap(), UserRole::Provider);
        assert!("superuser".parse::<UserRole>().is_err());
    }

    proptest::proptest! {
        // Any walk through the table reaches a terminal status within four
        // moves and never returns to pending. Choices past the end of the
        // generated list fall back to the first allowed move.
        #[test]
        fn prop_walks_terminate(choices in proptest::collection::vec(0usize..4, 0..12)) {
            let mut status = BookingStatus::Pending;
            let mut steps = 0;
            let mut choices = choices.into_iter();
            while !status.is_terminal() && steps <= 4 {
                let next = status.allowed_transitions();
                proptest::prop_assert!(!next.is_empty());
                let choice = choices.next().unwrap_or(0);
                status = next[choice % next.len()];
                steps += 1;
                proptest::prop_assert_ne!(status, BookingStatus::Pending);
            }
            proptest::prop_assert!(status.is_terminal());
            proptest::prop_assert!(steps <= 4);
        }
    }
}
