use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use kudos_core::budget::{BudgetPolicy, BudgetRequest};
use kudos_core::clock::{Clock, SystemClock};
use kudos_core::command::{KudosCommand, MessageParser, ParserError};
use kudos_core::config::KudosConfig;
use kudos_core::domain::kudos::KudosGrant;
use kudos_core::domain::member::MemberId;
use kudos_core::errors::{KudosError, KudosErrorKind};
use kudos_core::ledger::{KudosLedger, LedgerError};
use kudos_core::month::{CalendarMonth, VisibilityWindow};
use kudos_core::recipients::{RecipientError, RecipientResolver};
use kudos_core::responses::{RandomChooser, ResponseChooser};

use crate::events::MessageEvent;
use crate::gateway::{BotIdentity, ChatGateway, GatewayError};
use crate::replies;

const ACK_REACTION: &str = "heart";

/// What happened to one message. Used for logging and assertions; replies have
/// already been sent by the time it is returned.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Interaction {
    Ignored,
    Granted { units: u64 },
    Rejected { kind: KudosErrorKind },
    Answered { command: &'static str },
    /// A reply was refused because the bot token is no longer valid. Nothing
    /// further was sent for the message.
    AuthInvalid,
}

/// Turns one chat message into ledger writes and replies.
///
/// Holds no state between messages; every decision re-reads the ledger.
pub struct CommandInterpreter<G: ?Sized, L: ?Sized> {
    gateway: Arc<G>,
    ledger: Arc<L>,
    config: Arc<KudosConfig>,
    bot: BotIdentity,
    parser: MessageParser,
    resolver: RecipientResolver,
    budget: BudgetPolicy,
    chooser: Arc<dyn ResponseChooser>,
    clock: Arc<dyn Clock>,
    store_timeout: Duration,
}

impl<G, L> CommandInterpreter<G, L>
where
    G: ChatGateway + ?Sized,
    L: KudosLedger + ?Sized,
{
    pub fn new(
        gateway: Arc<G>,
        ledger: Arc<L>,
        config: Arc<KudosConfig>,
        bot: BotIdentity,
    ) -> Result<Self, ParserError> {
        let parser = MessageParser::new(&config.emoji, &bot.id)?;
        let resolver = RecipientResolver::new(bot.id.clone());
        let budget = BudgetPolicy::new(config.monthly_limit, config.per_message_limit);
        let store_timeout = Duration::from_secs(config.store_timeout_secs.max(1));

        Ok(Self {
            gateway,
            ledger,
            config,
            bot,
            parser,
            resolver,
            budget,
            chooser: Arc::new(RandomChooser),
            clock: Arc::new(SystemClock),
            store_timeout,
        })
    }

    pub fn with_chooser(mut self, chooser: Arc<dyn ResponseChooser>) -> Self {
        self.chooser = chooser;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_store_timeout(mut self, store_timeout: Duration) -> Self {
        self.store_timeout = store_timeout;
        self
    }

    pub async fn handle(&self, message: &MessageEvent) -> Interaction {
        let command = self.parser.parse(&message.text, &message.sender);

        let interaction = match command {
            KudosCommand::Noop => return Interaction::Ignored,
            KudosCommand::Grant { emoji_count, mentions } => {
                self.grant(message, emoji_count, &mentions).await
            }
            KudosCommand::Me => self.personal_stats(message).await,
            KudosCommand::Ladder { month } => self.ladder(message, month).await,
            KudosCommand::Help => self.help(message).await,
        };

        info!(
            event_name = "kudos.message_handled",
            correlation_id = %message.event_ts,
            channel_id = %message.channel_id,
            sender = %message.sender,
            outcome = ?interaction,
            "handled chat message"
        );
        interaction
    }

    async fn grant(&self, message: &MessageEvent, emoji_count: u32, mentions: &[String]) -> Interaction {
        match self.try_grant(message, emoji_count, mentions).await {
            Ok(units) => {
                let flavor = self.chooser.choose(&self.config.kudos_responses);
                let text = replies::acknowledgement(&self.config, flavor, units);
                let reply = self
                    .gateway
                    .send_private_reply(&message.channel_id, &message.sender, &text)
                    .await;
                if self.auth_revoked(message, "send_private_reply", reply) {
                    return Interaction::AuthInvalid;
                }

                let reaction = self
                    .gateway
                    .add_reaction(&message.channel_id, &message.event_ts, ACK_REACTION)
                    .await;
                if self.auth_revoked(message, "add_reaction", reaction) {
                    return Interaction::AuthInvalid;
                }

                Interaction::Granted { units }
            }
            Err(error) => {
                let kind = error.kind();
                if kind.is_store_failure() {
                    warn!(
                        event_name = "kudos.grant_failed",
                        correlation_id = %message.event_ts,
                        error_kind = kind.as_str(),
                        error = %error,
                        "kudos grant failed on the ledger"
                    );
                }

                let self_flavor = match &error {
                    KudosError::Recipient(RecipientError::SelfGift { .. }) => {
                        self.chooser.choose(&self.config.self_responses)
                    }
                    _ => None,
                };
                let text = replies::rejection(&self.config, &error, self_flavor);
                let reply = self.gateway.send_channel_message(&message.channel_id, &text).await;
                if self.auth_revoked(message, "send_channel_message", reply) {
                    return Interaction::AuthInvalid;
                }

                Interaction::Rejected { kind }
            }
        }
    }

    async fn try_grant(
        &self,
        message: &MessageEvent,
        emoji_count: u32,
        mentions: &[String],
    ) -> Result<u64, KudosError> {
        let sender = &message.sender;
        let recipients = self.resolver.resolve(self.gateway.as_ref(), mentions, sender).await?;

        let request = BudgetRequest {
            emoji_count,
            recipient_count: u32::try_from(recipients.len()).unwrap_or(u32::MAX),
        };
        let window = self.window();
        let month = window.current_month();
        let this = self;
        let window_ref = &window;
        self.budget
            .authorize(&request, move || async move {
                this.bounded(this.ledger.monthly_stats(sender, month, window_ref))
                    .await
                    .map(|stats| stats.sent)
            })
            .await?;

        let grant = KudosGrant {
            sender: sender.clone(),
            recipients,
            units_per_recipient: emoji_count,
        };
        self.bounded(self.ledger.append(&grant)).await.map_err(KudosError::PersistFailed)
    }

    async fn personal_stats(&self, message: &MessageEvent) -> Interaction {
        let window = self.window();
        let month = window.current_month();

        let (text, interaction) =
            match self.bounded(self.ledger.monthly_stats(&message.sender, month, &window)).await {
                Ok(stats) => (
                    replies::personal_stats(&self.config, month, &stats),
                    Interaction::Answered { command: "me" },
                ),
                Err(error) => {
                    self.log_aggregation_failure(message, &error);
                    (
                        replies::STATS_FAILED_REPLY.to_string(),
                        Interaction::Rejected { kind: KudosErrorKind::AggregationFailed },
                    )
                }
            };

        let reply =
            self.gateway.send_private_reply(&message.channel_id, &message.sender, &text).await;
        if self.auth_revoked(message, "send_private_reply", reply) {
            return Interaction::AuthInvalid;
        }
        interaction
    }

    async fn ladder(&self, message: &MessageEvent, month: Option<CalendarMonth>) -> Interaction {
        let window = self.window();
        let month = month.unwrap_or_else(|| window.current_month());
        let limit = self.config.leaderboard_size;

        let (text, interaction) =
            match self.bounded(self.ledger.leaderboard(month, &window, limit)).await {
                Ok(board) => {
                    let mut names = Vec::with_capacity(board.top_recipients.len());
                    for entry in &board.top_recipients {
                        names.push(self.display_name(&entry.member).await);
                    }
                    let top_sender_name = match &board.top_sender {
                        Some(sender) => self.display_name(&sender.member).await,
                        None => None,
                    };

                    (
                        replies::leaderboard(&self.config, &board, &names, top_sender_name.as_deref()),
                        Interaction::Answered { command: "ladder" },
                    )
                }
                Err(error) => {
                    self.log_aggregation_failure(message, &error);
                    (
                        replies::LADDER_FAILED_REPLY.to_string(),
                        Interaction::Rejected { kind: KudosErrorKind::AggregationFailed },
                    )
                }
            };

        let reply = self.gateway.send_channel_message(&message.channel_id, &text).await;
        if self.auth_revoked(message, "send_channel_message", reply) {
            return Interaction::AuthInvalid;
        }
        interaction
    }

    async fn help(&self, message: &MessageEvent) -> Interaction {
        let flavor = self.chooser.choose(&self.config.help_responses);
        let text = replies::help(&self.config, &self.bot.name, flavor);

        let reply =
            self.gateway.send_private_reply(&message.channel_id, &message.sender, &text).await;
        if self.auth_revoked(message, "send_private_reply", reply) {
            return Interaction::AuthInvalid;
        }
        Interaction::Answered { command: "help" }
    }

    async fn display_name(&self, member: &MemberId) -> Option<String> {
        self.gateway
            .lookup_member(member)
            .await
            .ok()
            .map(|profile| profile.display_name)
            .filter(|name| !name.trim().is_empty())
    }

    fn window(&self) -> VisibilityWindow {
        VisibilityWindow::trailing(self.clock.now(), self.config.visibility_months)
    }

    async fn bounded<T, F>(&self, call: F) -> Result<T, LedgerError>
    where
        F: Future<Output = Result<T, LedgerError>>,
    {
        match tokio::time::timeout(self.store_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(LedgerError::TimedOut(self.store_timeout)),
        }
    }

    fn log_aggregation_failure(&self, message: &MessageEvent, error: &LedgerError) {
        warn!(
            event_name = "kudos.aggregation_failed",
            correlation_id = %message.event_ts,
            channel_id = %message.channel_id,
            error = %error,
            "kudos totals could not be read"
        );
    }

    /// Logs a failed delivery. Returns `true` only when the failure means the
    /// credentials are gone and the caller must stop sending.
    fn auth_revoked(
        &self,
        message: &MessageEvent,
        action: &'static str,
        result: Result<(), GatewayError>,
    ) -> bool {
        let Err(error) = result else {
            return false;
        };

        if error.is_auth_invalid() {
            warn!(
                event_name = "kudos.delivery_auth_invalid",
                correlation_id = %message.event_ts,
                channel_id = %message.channel_id,
                action,
                error = %error,
                "chat credentials were rejected"
            );
            return true;
        }

        warn!(
            event_name = "kudos.delivery_failed",
            correlation_id = %message.event_ts,
            channel_id = %message.channel_id,
            action,
            error = %error,
            "chat reply was not delivered"
        );
        false
    }
}
