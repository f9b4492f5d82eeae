//! Application constants and configuration values.
//!
//! This module centralizes hardcoded business values and limits.

/// Marketplace economics
pub mod pricing {
    use rust_decimal::Decimal;

    /// Platform commission: 10% of the final price
    pub const COMMISSION_RATE: Decimal = Decimal::from_parts(10, 0, 0, false, 2);

    /// Provider's share of gross earnings: 90%
    pub const NET_EARNINGS_SHARE: Decimal = Decimal::from_parts(90, 0, 0, false, 2);

    /// Money is stored as NUMERIC(10, 2)
    pub const MONEY_SCALE: u32 = 2;

    /// Largest amount a NUMERIC(10, 2) column holds
    pub const MAX_AMOUNT: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 2);
}

/// Authentication constants
pub mod auth {
    /// Minimum password length
    pub const MIN_PASSWORD_LENGTH: usize = 8;

    /// Interval between sweeps of expired session rows
    pub const SESSION_PURGE_INTERVAL_SECS: u64 = 3600;
}

/// Marketplace client behaviour
pub mod client {
    /// A failed read is retried while fewer than this many attempts have failed
    pub const MAX_QUERY_FAILURES: u32 = 3;

    /// Default request timeout for the HTTP client
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;
}

/// Request headers
pub mod headers {
    pub const REQUEST_ID: &str = "x-request-id";
}

#[cfg(test)]
mod tests {
    use super::pricing::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_rates_are_exact() {
        assert_eq!(COMMISSION_RATE, Decimal::new(10, 2));
        assert_eq!(NET_EARNINGS_SHARE, Decimal::new(90, 2));
        assert_eq!(COMMISSION_RATE + NET_EARNINGS_SHARE, Decimal::ONE);
    }

    #[test]
    fn test_max_amount() {
        assert_eq!(MAX_AMOUNT, Decimal::new(99_999_999_99, 2));
    }
}
