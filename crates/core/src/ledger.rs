use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::kudos::{KudosGrant, Leaderboard, PeriodStats};
use crate::domain::member::MemberId;
use crate::month::{CalendarMonth, VisibilityWindow};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("ledger store unavailable: {0}")]
    Unavailable(String),
    #[error("ledger row could not be decoded: {0}")]
    Decode(String),
    #[error("ledger call did not finish within {0:?}")]
    TimedOut(Duration),
    #[error("grant rejected by ledger: {0}")]
    InvalidGrant(String),
}

/// Append-only kudos ledger with month-scoped aggregation.
///
/// Aggregates only see rows whose timestamp falls in `month` and inside `window`.
/// Identities are matched in canonical form (trimmed, upper-case).
#[async_trait]
pub trait KudosLedger: Send + Sync {
    /// Writes `units_per_recipient` rows per recipient, all or nothing. Returns the
    /// number of rows written.
    async fn append(&self, grant: &KudosGrant) -> Result<u64, LedgerError>;

    async fn monthly_stats(
        &self,
        member: &MemberId,
        month: CalendarMonth,
        window: &VisibilityWindow,
    ) -> Result<PeriodStats, LedgerError>;

    /// Top `limit` recipients by units received (ties by identity ascending) and the
    /// single top sender.
    async fn leaderboard(
        &self,
        month: CalendarMonth,
        window: &VisibilityWindow,
        limit: u32,
    ) -> Result<Leaderboard, LedgerError>;
}

/// Shared precondition for every ledger implementation.
pub fn validate_grant(grant: &KudosGrant) -> Result<(), LedgerError> {
    if grant.recipients.is_empty() {
        return Err(LedgerError::InvalidGrant("grant has no recipients".to_string()));
    }
    if grant.units_per_recipient == 0 {
        return Err(LedgerError::InvalidGrant("grant carries zero units".to_string()));
    }
    if grant.sender.is_empty() || grant.recipients.iter().any(MemberId::is_empty) {
        return Err(LedgerError::InvalidGrant("grant contains an empty identity".to_string()));
    }
    Ok(())
}
