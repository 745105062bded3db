use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::member::MemberId;
use crate::month::CalendarMonth;

/// One ledger row: a single unit moved from `sender` to `recipient`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KudosTransaction {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub sender: MemberId,
    pub recipient: MemberId,
}

/// A validated, budget-checked grant ready to be written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KudosGrant {
    pub sender: MemberId,
    pub recipients: Vec<MemberId>,
    pub units_per_recipient: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodStats {
    pub member: MemberId,
    pub sent: u64,
    pub received: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub member: MemberId,
    pub count: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Leaderboard {
    pub month: CalendarMonth,
    pub top_recipients: Vec<LeaderboardEntry>,
    pub top_sender: Option<LeaderboardEntry>,
}

impl Leaderboard {
    pub fn is_empty(&self) -> bool {
        self.top_recipients.is_empty()
    }
}
