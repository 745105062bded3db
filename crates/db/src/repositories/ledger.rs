use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row};
use tracing::debug;

use kudos_core::clock::{Clock, SystemClock};
use kudos_core::domain::kudos::{KudosGrant, Leaderboard, LeaderboardEntry, PeriodStats};
use kudos_core::domain::member::MemberId;
use kudos_core::ledger::{validate_grant, KudosLedger, LedgerError};
use kudos_core::month::{CalendarMonth, VisibilityWindow};

use super::RepositoryError;
use crate::DbPool;

/// Storage format of `kudos_log.timestamp`. Lexical order equals chronological order.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const INSERT_ROW_SQL: &str = "INSERT INTO kudos_log (timestamp, sender, recipient) VALUES (?, ?, ?)";

const SENT_COUNT_SQL: &str = "SELECT COUNT(DISTINCT id) AS units
     FROM kudos_log
     WHERE UPPER(TRIM(sender)) = ?
       AND strftime('%m', timestamp) = ?
       AND timestamp >= ?";

const RECEIVED_COUNT_SQL: &str = "SELECT COUNT(DISTINCT id) AS units
     FROM kudos_log
     WHERE UPPER(TRIM(recipient)) = ?
       AND strftime('%m', timestamp) = ?
       AND timestamp >= ?";

const TOP_RECIPIENTS_SQL: &str = "SELECT UPPER(TRIM(recipient)) AS member, COUNT(DISTINCT id) AS units
     FROM kudos_log
     WHERE strftime('%m', timestamp) = ?
       AND timestamp >= ?
     GROUP BY UPPER(TRIM(recipient))
     ORDER BY units DESC, member ASC
     LIMIT ?";

const TOP_SENDER_SQL: &str = "SELECT UPPER(TRIM(sender)) AS member, COUNT(DISTINCT id) AS units
     FROM kudos_log
     WHERE strftime('%m', timestamp) = ?
       AND timestamp >= ?
     GROUP BY UPPER(TRIM(sender))
     ORDER BY units DESC, member ASC
     LIMIT 1";

pub struct SqlKudosLedger {
    pool: DbPool,
    clock: Arc<dyn Clock>,
}

impl SqlKudosLedger {
    pub fn new(pool: DbPool) -> Self {
        Self { pool, clock: Arc::new(SystemClock) }
    }

    /// Rows are stamped with this clock instead of wall time.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    async fn insert_grant(&self, grant: &KudosGrant) -> Result<u64, RepositoryError> {
        let timestamp = format_timestamp(self.clock.now());
        let mut tx = self.pool.begin().await?;
        let mut written = 0_u64;

        for recipient in &grant.recipients {
            for _ in 0..grant.units_per_recipient {
                let result = sqlx::query(INSERT_ROW_SQL)
                    .bind(&timestamp)
                    .bind(grant.sender.as_str())
                    .bind(recipient.as_str())
                    .execute(&mut *tx)
                    .await?;
                written += result.rows_affected();
            }
        }

        tx.commit().await?;
        Ok(written)
    }

    async fn count_units(
        &self,
        sql: &'static str,
        member: &MemberId,
        month: CalendarMonth,
        window: &VisibilityWindow,
    ) -> Result<u64, RepositoryError> {
        let row = sqlx::query(sql)
            .bind(member.as_str())
            .bind(month_key(month))
            .bind(format_timestamp(window.start()))
            .fetch_one(&self.pool)
            .await?;

        parse_units(row.try_get("units")?)
    }

    async fn ranked(
        &self,
        sql: &'static str,
        month: CalendarMonth,
        window: &VisibilityWindow,
        limit: Option<u32>,
    ) -> Result<Vec<LeaderboardEntry>, RepositoryError> {
        let mut query = sqlx::query(sql).bind(month_key(month)).bind(format_timestamp(window.start()));
        if let Some(limit) = limit {
            query = query.bind(i64::from(limit));
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(entry_from_row).collect()
    }
}

#[async_trait::async_trait]
impl KudosLedger for SqlKudosLedger {
    async fn append(&self, grant: &KudosGrant) -> Result<u64, LedgerError> {
        validate_grant(grant)?;
        let written = self.insert_grant(grant).await?;

        debug!(
            event_name = "ledger.append",
            sender = %grant.sender,
            recipients = grant.recipients.len(),
            rows = written,
            "kudos rows written"
        );
        Ok(written)
    }

    async fn monthly_stats(
        &self,
        member: &MemberId,
        month: CalendarMonth,
        window: &VisibilityWindow,
    ) -> Result<PeriodStats, LedgerError> {
        let sent = self.count_units(SENT_COUNT_SQL, member, month, window).await?;
        let received = self.count_units(RECEIVED_COUNT_SQL, member, month, window).await?;

        Ok(PeriodStats { member: member.clone(), sent, received })
    }

    async fn leaderboard(
        &self,
        month: CalendarMonth,
        window: &VisibilityWindow,
        limit: u32,
    ) -> Result<Leaderboard, LedgerError> {
        let top_recipients = self.ranked(TOP_RECIPIENTS_SQL, month, window, Some(limit)).await?;
        let top_sender = if top_recipients.is_empty() {
            None
        } else {
            self.ranked(TOP_SENDER_SQL, month, window, None).await?.into_iter().next()
        };

        Ok(Leaderboard { month, top_recipients, top_sender })
    }
}

fn format_timestamp(instant: DateTime<Utc>) -> String {
    instant.format(TIMESTAMP_FORMAT).to_string()
}

fn month_key(month: CalendarMonth) -> String {
    format!("{:02}", month.number())
}

fn entry_from_row(row: &SqliteRow) -> Result<LeaderboardEntry, RepositoryError> {
    let member: String = row.try_get("member")?;
    Ok(LeaderboardEntry { member: MemberId::new(&member), count: parse_units(row.try_get("units")?)? })
}

fn parse_units(value: i64) -> Result<u64, RepositoryError> {
    u64::try_from(value).map_err(|_| {
        RepositoryError::Decode(format!("invalid value for `units` (expected non-negative): {value}"))
    })
}
