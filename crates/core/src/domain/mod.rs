pub mod kudos;
pub mod member;

pub use kudos::{KudosGrant, KudosTransaction, Leaderboard, LeaderboardEntry, PeriodStats};
pub use member::{MemberId, MemberProfile};
