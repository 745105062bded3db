use thiserror::Error;

use crate::{budget::BudgetRejection, ledger::LedgerError, recipients::RecipientError};

/// Every way a kudos interaction can fail. Each variant maps to exactly one chat reply.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum KudosError {
    #[error(transparent)]
    Recipient(#[from] RecipientError),
    #[error(transparent)]
    Budget(#[from] BudgetRejection),
    #[error("kudos could not be saved: {0}")]
    PersistFailed(#[source] LedgerError),
    #[error("kudos totals could not be aggregated: {0}")]
    AggregationFailed(#[source] LedgerError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KudosErrorKind {
    SelfGift,
    BotGift,
    UnknownRecipient,
    PerMessageCapExceeded,
    GlobalCapExceeded,
    LookupFailed,
    PersistFailed,
    AggregationFailed,
}

impl KudosErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SelfGift => "self_gift",
            Self::BotGift => "bot_gift",
            Self::UnknownRecipient => "unknown_recipient",
            Self::PerMessageCapExceeded => "per_message_cap_exceeded",
            Self::GlobalCapExceeded => "global_cap_exceeded",
            Self::LookupFailed => "lookup_failed",
            Self::PersistFailed => "persist_failed",
            Self::AggregationFailed => "aggregation_failed",
        }
    }

    /// Failures caused by the store rather than by what the user typed.
    pub fn is_store_failure(&self) -> bool {
        matches!(self, Self::LookupFailed | Self::PersistFailed | Self::AggregationFailed)
    }
}

impl KudosError {
    pub fn kind(&self) -> KudosErrorKind {
        match self {
            Self::Recipient(RecipientError::SelfGift { .. }) => KudosErrorKind::SelfGift,
            Self::Recipient(RecipientError::BotGift) => KudosErrorKind::BotGift,
            Self::Recipient(RecipientError::UnknownRecipient { .. }) => {
                KudosErrorKind::UnknownRecipient
            }
            Self::Budget(BudgetRejection::PerMessageCapExceeded { .. }) => {
                KudosErrorKind::PerMessageCapExceeded
            }
            Self::Budget(BudgetRejection::GlobalCapExceeded { .. }) => {
                KudosErrorKind::GlobalCapExceeded
            }
            Self::Budget(BudgetRejection::LookupFailed(_)) => KudosErrorKind::LookupFailed,
            Self::PersistFailed(_) => KudosErrorKind::PersistFailed,
            Self::AggregationFailed(_) => KudosErrorKind::AggregationFailed,
        }
    }
}
