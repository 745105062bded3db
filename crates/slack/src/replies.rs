//! Chat reply texts. Every user-visible string the bot sends is built here.

use kudos_core::budget::{BudgetRejection, Cap};
use kudos_core::config::KudosConfig;
use kudos_core::domain::kudos::{Leaderboard, PeriodStats};
use kudos_core::errors::KudosError;
use kudos_core::month::CalendarMonth;
use kudos_core::recipients::RecipientError;

pub const DEFAULT_SELF_GIFT_REPLY: &str = "No patting yourself on the back";
pub const BOT_GIFT_REPLY: &str = "PLEASE DO NOT FEED THE DONKEY";
pub const UNKNOWN_NAME: &str = "Unknown";
pub const STATS_FAILED_REPLY: &str = "Sorry, I encountered a problem and couldn't look up your stats";
pub const LADDER_FAILED_REPLY: &str =
    "Sorry, I encountered a problem and couldn't look up the current leaderboard";

/// Private note to a sender whose grant went through: the flavor line, the emoji once
/// per unit written, then a heart.
pub fn acknowledgement(config: &KudosConfig, flavor: Option<&str>, units: u64) -> String {
    let mut reply = flavor.unwrap_or_default().to_string();
    for _ in 0..units {
        reply.push_str(&format!(" :{}:", config.emoji));
    }
    reply.push_str(" :heart:");
    reply
}

/// Reply for a grant that was refused. `self_flavor` replaces the default self-gift text.
pub fn rejection(config: &KudosConfig, error: &KudosError, self_flavor: Option<&str>) -> String {
    let emoji = &config.emoji;
    match error {
        KudosError::Recipient(RecipientError::SelfGift { .. }) => {
            self_flavor.unwrap_or(DEFAULT_SELF_GIFT_REPLY).to_string()
        }
        KudosError::Recipient(RecipientError::BotGift) => BOT_GIFT_REPLY.to_string(),
        KudosError::Recipient(RecipientError::UnknownRecipient { handle }) => {
            format!("Who? I couldn't find @{} in this workspace", handle.to_lowercase())
        }
        KudosError::Budget(BudgetRejection::PerMessageCapExceeded { limit, .. }) => format!(
            "Thanks for sharing the :{emoji}:, unfortunately you can't send more than {limit} in a message"
        ),
        KudosError::Budget(BudgetRejection::GlobalCapExceeded { limit, .. }) => format!(
            "Thanks for sharing the :{emoji}:, unfortunately you can't send more than {limit} in a month"
        ),
        KudosError::Budget(BudgetRejection::LookupFailed(_)) => format!(
            "Thanks for sharing the :{emoji}:, unfortunately I could not find my {} store",
            config.plural
        ),
        KudosError::PersistFailed(_) => {
            format!("Thanks for sharing the :{emoji}:, unfortunately I had a problem saving them")
        }
        KudosError::AggregationFailed(_) => LADDER_FAILED_REPLY.to_string(),
    }
}

pub fn personal_stats(config: &KudosConfig, month: CalendarMonth, stats: &PeriodStats) -> String {
    let mut reply = format!(
        "Hey, so far in {month}, you have given *{}* {}, and received *{}*",
        stats.sent, config.plural, stats.received
    );
    if let Cap::Limited(limit) = config.monthly_limit {
        reply.push_str(&format!("\nYou can send a total of *{limit}* :{}: per month", config.emoji));
    }
    reply
}

/// `names` holds one display name per leaderboard entry, in rank order; missing names
/// render as a placeholder.
pub fn leaderboard(
    config: &KudosConfig,
    board: &Leaderboard,
    names: &[Option<String>],
    top_sender_name: Option<&str>,
) -> String {
    let emoji = &config.emoji;
    if board.is_empty() {
        return format!("In {}, no :{emoji}: were given :cry:", board.month);
    }

    let mut reply = format!("The standings for {}:", board.month);
    for (index, entry) in board.top_recipients.iter().enumerate() {
        let name = names.get(index).and_then(Option::as_deref).unwrap_or(UNKNOWN_NAME);
        reply.push_str(&format!("\n> {}. *{name}* received {} :{emoji}:", index + 1, entry.count));
    }

    if let Some(sender) = &board.top_sender {
        let name = top_sender_name.unwrap_or(UNKNOWN_NAME);
        reply.push_str(&format!("\n> \n> *{name}* gave the most! {} :{emoji}:", sender.count));
    }

    reply
}

pub fn help(config: &KudosConfig, bot_name: &str, flavor: Option<&str>) -> String {
    let emoji = &config.emoji;
    let mut reply = [
        format!("*Send {} to your friends:*", config.plural),
        format!(">Hey @alex, I like you, have a :{emoji}:"),
        format!(">:{emoji}: @alex @sam"),
        format!(">Great demo @sam, nicely done :{emoji}: :{emoji}:"),
        "*Other stuff:*".to_string(),
        format!(">`@{bot_name} me` Find out how many :{emoji}: you have"),
        format!(">`@{bot_name} ladder [month]` Find out who has the most :{emoji}:"),
        format!(">`@{bot_name} help` Print this message"),
    ]
    .join("\n");

    if let Cap::Limited(limit) = config.monthly_limit {
        reply.push_str(&format!("\nYou can send a total of *{limit}* {} per month", config.plural));
    }
    if let Some(flavor) = flavor {
        reply.push('\n');
        reply.push_str(flavor);
    }
    reply
}

#[cfg(test)]
mod tests {
    use kudos_core::budget::{BudgetRejection, Cap};
    use kudos_core::config::KudosConfig;
    use kudos_core::domain::kudos::{Leaderboard, LeaderboardEntry, PeriodStats};
    use kudos_core::domain::member::MemberId;
    use kudos_core::errors::KudosError;
    use kudos_core::ledger::LedgerError;
    use kudos_core::month::CalendarMonth;
    use kudos_core::recipients::RecipientError;

    use super::{acknowledgement, help, leaderboard, personal_stats, rejection};

    fn march() -> CalendarMonth {
        CalendarMonth::new(3).expect("march")
    }

    #[test]
    fn acknowledgement_repeats_emoji_per_unit() {
        let config = KudosConfig::default();

        assert_eq!(acknowledgement(&config, Some("Sharing is caring"), 2), "Sharing is caring :carrot: :carrot: :heart:");
        assert_eq!(acknowledgement(&config, None, 1), " :carrot: :heart:");
    }

    #[test]
    fn rejections_use_configured_emoji_and_limits() {
        let config = KudosConfig { emoji: "taco".to_string(), ..KudosConfig::default() };

        let per_message = KudosError::from(BudgetRejection::PerMessageCapExceeded { limit: 2, requested: 3 });
        assert_eq!(
            rejection(&config, &per_message, None),
            "Thanks for sharing the :taco:, unfortunately you can't send more than 2 in a message"
        );

        let monthly = KudosError::from(BudgetRejection::GlobalCapExceeded { limit: 5, already_sent: 3, proposed: 3 });
        assert_eq!(
            rejection(&config, &monthly, None),
            "Thanks for sharing the :taco:, unfortunately you can't send more than 5 in a month"
        );

        let persist = KudosError::PersistFailed(LedgerError::Unavailable("locked".to_string()));
        assert_eq!(
            rejection(&config, &persist, None),
            "Thanks for sharing the :taco:, unfortunately I had a problem saving them"
        );
    }

    #[test]
    fn self_gift_prefers_configured_flavor() {
        let config = KudosConfig::default();
        let error = KudosError::from(RecipientError::SelfGift { sender: MemberId::new("U1") });

        assert_eq!(rejection(&config, &error, None), "No patting yourself on the back");
        assert_eq!(rejection(&config, &error, Some("Nice try")), "Nice try");
    }

    #[test]
    fn unknown_recipient_names_the_handle() {
        let config = KudosConfig::default();
        let error = KudosError::from(RecipientError::UnknownRecipient { handle: "DUCK".to_string() });

        assert!(rejection(&config, &error, None).contains("@duck"));
    }

    #[test]
    fn personal_stats_mention_cap_only_when_limited() {
        let stats = PeriodStats { member: MemberId::new("U1"), sent: 4, received: 7 };
        let unlimited = KudosConfig::default();
        let limited = KudosConfig { monthly_limit: Cap::Limited(10), ..KudosConfig::default() };

        assert_eq!(
            personal_stats(&unlimited, march(), &stats),
            "Hey, so far in March, you have given *4* carrots, and received *7*"
        );
        assert_eq!(
            personal_stats(&limited, march(), &stats),
            "Hey, so far in March, you have given *4* carrots, and received *7*\nYou can send a total of *10* :carrot: per month"
        );
    }

    #[test]
    fn leaderboard_lists_ranks_and_top_sender() {
        let config = KudosConfig::default();
        let board = Leaderboard {
            month: march(),
            top_recipients: vec![
                LeaderboardEntry { member: MemberId::new("U1"), count: 5 },
                LeaderboardEntry { member: MemberId::new("U2"), count: 3 },
            ],
            top_sender: Some(LeaderboardEntry { member: MemberId::new("U3"), count: 6 }),
        };

        let rendered =
            leaderboard(&config, &board, &[Some("Alice".to_string()), None], Some("Carol"));

        assert_eq!(
            rendered,
            "The standings for March:\n> 1. *Alice* received 5 :carrot:\n> 2. *Unknown* received 3 :carrot:\n> \n> *Carol* gave the most! 6 :carrot:"
        );
    }

    #[test]
    fn empty_leaderboard_says_nothing_was_given() {
        let config = KudosConfig::default();
        let board = Leaderboard { month: march(), top_recipients: Vec::new(), top_sender: None };

        assert_eq!(leaderboard(&config, &board, &[], None), "In March, no :carrot: were given :cry:");
    }

    #[test]
    fn help_includes_bot_name_cap_and_flavor() {
        let config = KudosConfig { monthly_limit: Cap::Limited(20), ..KudosConfig::default() };

        let rendered = help(&config, "kudosbot", Some("Be kind!"));

        assert!(rendered.starts_with("*Send carrots to your friends:*"));
        assert!(rendered.contains("`@kudosbot ladder [month]`"));
        assert!(rendered.contains("\nYou can send a total of *20* carrots per month"));
        assert!(rendered.ends_with("\nBe kind!"));
    }
}
