use thiserror::Error;

use kudos_core::ledger::LedgerError;

pub mod ledger;
pub mod memory;

pub use ledger::SqlKudosLedger;
pub use memory::InMemoryKudosLedger;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<RepositoryError> for LedgerError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::Database(source) => LedgerError::Unavailable(source.to_string()),
            RepositoryError::Decode(detail) => LedgerError::Decode(detail),
        }
    }
}

#[cfg(test)]
mod tests {
    use kudos_core::ledger::LedgerError;

    use super::RepositoryError;

    #[test]
    fn repository_errors_become_ledger_errors() {
        let decode: LedgerError = RepositoryError::Decode("bad count".to_string()).into();
        assert_eq!(decode, LedgerError::Decode("bad count".to_string()));

        let database: LedgerError = RepositoryError::Database(sqlx::Error::PoolTimedOut).into();
        assert!(matches!(database, LedgerError::Unavailable(_)));
    }
}
