//! Domain vocabularies stored as plain strings in the database.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Candle sizes a strategy may run on
pub const TIMEFRAMES: &[&str] = &["1m", "5m", "15m", "30m", "1h", "4h", "1d", "1w"];

pub fn validate_timeframe(timeframe: &str) -> AppResult<()> {
    if TIMEFRAMES.contains(&timeframe) {
        Ok(())
    } else {
        Err(AppError::validation(format!(
            "unsupported timeframe '{}', expected one of: {}",
            timeframe,
            TIMEFRAMES.join(", ")
        )))
    }
}

/// String-backed enum with a fixed set of database values
macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident, $label:literal { $($variant:ident => $value:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $value),+
                }
            }

            pub fn parse(value: &str) -> AppResult<Self> {
                let normalized = value.trim().to_lowercase();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == normalized)
                    .ok_or_else(|| {
                        let allowed: Vec<&str> = Self::ALL.iter().map(|v| v.as_str()).collect();
                        AppError::validation(format!(
                            "unknown {} '{}', expected one of: {}",
                            $label,
                            value,
                            allowed.join(", ")
                        ))
                    })
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

string_enum!(Role, "role" {
    User => "user",
    Admin => "admin",
    Franchise => "franchise",
});

string_enum!(Segment, "segment" {
    Equity => "equity",
    Futures => "futures",
    Options => "options",
    Commodity => "commodity",
    Currency => "currency",
    Crypto => "crypto",
});

string_enum!(
    /// Brokers a user can connect an API key for
    Broker, "broker" {
    Zerodha => "zerodha",
    AngelOne => "angelone",
    Upstox => "upstox",
    Fyers => "fyers",
    Dhan => "dhan",
    Binance => "binance",
    Okx => "okx",
});

string_enum!(ApiKeyStatus, "api key status" {
    PendingVerification => "pending_verification",
    Verified => "verified",
    Failed => "failed",
});

string_enum!(TicketStatus, "ticket status" {
    Open => "open",
    InProgress => "in_progress",
    Closed => "closed",
});

string_enum!(TicketPriority, "ticket priority" {
    Low => "low",
    Medium => "medium",
    High => "high",
});

string_enum!(SubscriptionStatus, "subscription status" {
    Active => "active",
    Cancelled => "cancelled",
});

string_enum!(LedgerKind, "ledger kind" {
    Debit => "debit",
    Credit => "credit",
});

string_enum!(
    /// Why a wallet balance changed
    LedgerReason, "ledger reason" {
    ApiKey => "api_key",
    StrategySubscription => "strategy_subscription",
    PlanSubscription => "plan_subscription",
    AdminTransfer => "admin_transfer",
});

string_enum!(
    /// Billable actions configured by admins
    ChargeType, "charge type" {
    ApiKey => "api_key",
    StrategySubscription => "strategy_subscription",
});

impl ChargeType {
    pub fn ledger_reason(&self) -> LedgerReason {
        match self {
            ChargeType::ApiKey => LedgerReason::ApiKey,
            ChargeType::StrategySubscription => LedgerReason::StrategySubscription,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(Segment::parse(" Crypto ").unwrap(), Segment::Crypto);
        assert_eq!(Broker::parse("ANGELONE").unwrap(), Broker::AngelOne);
        assert_eq!(TicketStatus::parse("in_progress").unwrap(), TicketStatus::InProgress);
    }

    #[test]
    fn test_parse_rejects_unknown_values() {
        let err = Broker::parse("robinhood").unwrap_err();
        assert!(err.to_string().contains("unknown broker 'robinhood'"));
        assert!(Role::parse("superuser").is_err());
    }

    #[test]
    fn test_serde_matches_database_values() {
        assert_eq!(serde_json::to_value(ApiKeyStatus::PendingVerification).unwrap(), "pending_verification");
        assert_eq!(ChargeType::StrategySubscription.as_str(), "strategy_subscription");
        assert_eq!(ChargeType::ApiKey.ledger_reason(), LedgerReason::ApiKey);
    }

    #[test]
    fn test_timeframes() {
        assert!(validate_timeframe("15m").is_ok());
        assert!(validate_timeframe("2h").is_err());
    }
}
