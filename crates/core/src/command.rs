//! Message classification.
//!
//! Every incoming chat message is turned into exactly one [`KudosCommand`]. Pattern
//! matching stays inside [`MessageParser`]; callers only ever see the typed command.

use regex::Regex;
use thiserror::Error;

use crate::domain::member::MemberId;
use crate::month::CalendarMonth;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KudosCommand {
    /// `emoji_count` occurrences of the configured emoji addressed to `mentions`
    /// (raw tokens as typed, sigil included).
    Grant { emoji_count: u32, mentions: Vec<String> },
    Me,
    /// `month` is `None` when absent or not a recognized month name.
    Ladder { month: Option<CalendarMonth> },
    Help,
    Noop,
}

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("invalid message pattern: {0}")]
    Pattern(#[from] regex::Error),
}

pub struct MessageParser {
    bot: MemberId,
    emoji: Regex,
    mention: Regex,
    bot_command: Regex,
    ladder: Regex,
}

impl MessageParser {
    pub fn new(emoji: &str, bot: &MemberId) -> Result<Self, ParserError> {
        let emoji_pattern = format!(":{}:", regex::escape(&emoji.trim().to_lowercase()));
        let bot_pattern = format!(r"^<@{}> *(.*)$", regex::escape(&bot.as_str().to_lowercase()));

        Ok(Self {
            bot: bot.clone(),
            emoji: Regex::new(&emoji_pattern)?,
            mention: Regex::new(r"@[a-z]+[a-z0-9_-]+")?,
            bot_command: Regex::new(&bot_pattern)?,
            ladder: Regex::new(r"^ladder *([a-z]*)$")?,
        })
    }

    pub fn parse(&self, text: &str, sender: &MemberId) -> KudosCommand {
        let text = text.trim().to_lowercase();

        let emoji_count = self.emoji.find_iter(&text).count();
        let mentions: Vec<String> =
            self.mention.find_iter(&text).map(|found| found.as_str().to_string()).collect();

        if emoji_count > 0 && !mentions.is_empty() && sender != &self.bot {
            return KudosCommand::Grant {
                emoji_count: u32::try_from(emoji_count).unwrap_or(u32::MAX),
                mentions,
            };
        }

        match self.bot_command.captures(&text) {
            Some(captures) => {
                let remainder = captures.get(1).map(|found| found.as_str().trim()).unwrap_or("");
                self.classify_query(remainder)
            }
            None => KudosCommand::Noop,
        }
    }

    fn classify_query(&self, remainder: &str) -> KudosCommand {
        if remainder == "me" {
            return KudosCommand::Me;
        }

        if let Some(captures) = self.ladder.captures(remainder) {
            let month =
                captures.get(1).and_then(|found| CalendarMonth::parse(found.as_str()));
            return KudosCommand::Ladder { month };
        }

        KudosCommand::Help
    }
}
