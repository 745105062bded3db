use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use kudos_core::clock::{Clock, SystemClock};
use kudos_core::domain::kudos::{
    KudosGrant, KudosTransaction, Leaderboard, LeaderboardEntry, PeriodStats,
};
use kudos_core::domain::member::MemberId;
use kudos_core::ledger::{validate_grant, KudosLedger, LedgerError};
use kudos_core::month::{CalendarMonth, VisibilityWindow};

/// Ledger kept in process memory. Same semantics as the SQL ledger.
pub struct InMemoryKudosLedger {
    clock: Arc<dyn Clock>,
    rows: RwLock<Vec<KudosTransaction>>,
}

impl Default for InMemoryKudosLedger {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl InMemoryKudosLedger {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock, rows: RwLock::new(Vec::new()) }
    }

    /// Inserts one row with an explicit timestamp, bypassing the clock.
    pub async fn record_at(&self, sender: &MemberId, recipient: &MemberId, at: DateTime<Utc>) {
        let mut rows = self.rows.write().await;
        let id = rows.len() as i64 + 1;
        rows.push(KudosTransaction {
            id,
            timestamp: at,
            sender: sender.clone(),
            recipient: recipient.clone(),
        });
    }

    pub async fn transactions(&self) -> Vec<KudosTransaction> {
        self.rows.read().await.clone()
    }

    async fn visible(&self, month: CalendarMonth, window: &VisibilityWindow) -> Vec<KudosTransaction> {
        self.rows
            .read()
            .await
            .iter()
            .filter(|row| CalendarMonth::of(row.timestamp) == month && window.contains(row.timestamp))
            .cloned()
            .collect()
    }
}

#[async_trait::async_trait]
impl KudosLedger for InMemoryKudosLedger {
    async fn append(&self, grant: &KudosGrant) -> Result<u64, LedgerError> {
        validate_grant(grant)?;
        let timestamp = self.clock.now();
        let mut rows = self.rows.write().await;
        let mut written = 0_u64;

        for recipient in &grant.recipients {
            for _ in 0..grant.units_per_recipient {
                let id = rows.len() as i64 + 1;
                rows.push(KudosTransaction {
                    id,
                    timestamp,
                    sender: grant.sender.clone(),
                    recipient: recipient.clone(),
                });
                written += 1;
            }
        }

        Ok(written)
    }

    async fn monthly_stats(
        &self,
        member: &MemberId,
        month: CalendarMonth,
        window: &VisibilityWindow,
    ) -> Result<PeriodStats, LedgerError> {
        let rows = self.visible(month, window).await;
        let sent = rows.iter().filter(|row| &row.sender == member).count() as u64;
        let received = rows.iter().filter(|row| &row.recipient == member).count() as u64;

        Ok(PeriodStats { member: member.clone(), sent, received })
    }

    async fn leaderboard(
        &self,
        month: CalendarMonth,
        window: &VisibilityWindow,
        limit: u32,
    ) -> Result<Leaderboard, LedgerError> {
        let rows = self.visible(month, window).await;
        let mut top_recipients = rank(rows.iter().map(|row| &row.recipient));
        top_recipients.truncate(limit as usize);
        let top_sender = rank(rows.iter().map(|row| &row.sender)).into_iter().next();

        Ok(Leaderboard { month, top_recipients, top_sender })
    }
}

fn rank<'a>(members: impl Iterator<Item = &'a MemberId>) -> Vec<LeaderboardEntry> {
    let mut counts: BTreeMap<&MemberId, u64> = BTreeMap::new();
    for member in members {
        *counts.entry(member).or_default() += 1;
    }

    // BTreeMap yields identities ascending; the stable sort keeps that order for ties.
    let mut entries: Vec<LeaderboardEntry> = counts
        .into_iter()
        .map(|(member, count)| LeaderboardEntry { member: member.clone(), count })
        .collect();
    entries.sort_by(|left, right| right.count.cmp(&left.count));
    entries
}
