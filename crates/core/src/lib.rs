pub mod budget;
pub mod clock;
pub mod command;
pub mod config;
pub mod domain;
pub mod errors;
pub mod ledger;
pub mod month;
pub mod recipients;
pub mod responses;

pub use budget::{BudgetPolicy, BudgetRejection, BudgetRequest, Cap};
pub use clock::{Clock, FixedClock, SystemClock};
pub use command::{KudosCommand, MessageParser, ParserError};
pub use config::{AppConfig, ConfigError, KudosConfig, LoadOptions, LogFormat};
pub use domain::kudos::{KudosGrant, KudosTransaction, Leaderboard, LeaderboardEntry, PeriodStats};
pub use domain::member::{MemberId, MemberProfile};
pub use errors::{KudosError, KudosErrorKind};
pub use ledger::{validate_grant, KudosLedger, LedgerError};
pub use month::{CalendarMonth, VisibilityWindow};
pub use recipients::{DirectoryError, MemberDirectory, RecipientError, RecipientResolver};
pub use responses::{FirstChooser, RandomChooser, ResponseChooser};
