use std::fmt;
use std::future::Future;

use thiserror::Error;

/// A configured maximum. Any negative configured value is the "no limit" sentinel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Cap {
    #[default]
    Unlimited,
    Limited(u32),
}

impl Cap {
    pub fn from_sentinel(value: i64) -> Self {
        if value < 0 {
            Self::Unlimited
        } else {
            Self::Limited(u32::try_from(value).unwrap_or(u32::MAX))
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BudgetRequest {
    /// Raw emoji occurrences in the message.
    pub emoji_count: u32,
    /// Distinct verified recipients.
    pub recipient_count: u32,
}

impl BudgetRequest {
    pub fn proposed_units(&self) -> u64 {
        u64::from(self.emoji_count) * u64::from(self.recipient_count)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BudgetRejection {
    #[error("{requested} in one message exceeds the per-message cap of {limit}")]
    PerMessageCapExceeded { limit: u32, requested: u32 },
    #[error("{already_sent} sent plus {proposed} proposed exceeds the monthly cap of {limit}")]
    GlobalCapExceeded { limit: u32, already_sent: u64, proposed: u64 },
    #[error("monthly budget could not be verified: {0}")]
    LookupFailed(String),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BudgetPolicy {
    monthly: Cap,
    per_message: Cap,
}

impl BudgetPolicy {
    pub fn new(monthly: Cap, per_message: Cap) -> Self {
        Self { monthly, per_message }
    }

    /// Decides whether the proposed grant fits the sender's budget.
    ///
    /// `sent_this_month` reads the sender's current-month sent count. It is only
    /// awaited when the monthly cap is enabled and the per-message check passed, so
    /// an oversized message never touches the ledger. A failed lookup denies.
    pub async fn authorize<F, Fut, E>(
        &self,
        request: &BudgetRequest,
        sent_this_month: F,
    ) -> Result<(), BudgetRejection>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<u64, E>>,
        E: fmt::Display,
    {
        if let Cap::Limited(limit) = self.per_message {
            if request.emoji_count > limit {
                return Err(BudgetRejection::PerMessageCapExceeded {
                    limit,
                    requested: request.emoji_count,
                });
            }
        }

        let Cap::Limited(limit) = self.monthly else {
            return Ok(());
        };

        let already_sent = sent_this_month()
            .await
            .map_err(|error| BudgetRejection::LookupFailed(error.to_string()))?;
        let proposed = request.proposed_units();

        if already_sent.saturating_add(proposed) > u64::from(limit) {
            return Err(BudgetRejection::GlobalCapExceeded { limit, already_sent, proposed });
        }

        Ok(())
    }
}
