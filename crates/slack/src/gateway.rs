use async_trait::async_trait;
use thiserror::Error;

use kudos_core::domain::member::MemberId;
use kudos_core::recipients::MemberDirectory;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("chat platform rejected the bot credentials: {0}")]
    AuthInvalid(String),
    #[error("chat api `{method}` failed: {error}")]
    Api { method: String, error: String },
    #[error("chat transport failed: {0}")]
    Transport(String),
}

impl GatewayError {
    pub fn is_auth_invalid(&self) -> bool {
        matches!(self, Self::AuthInvalid(_))
    }
}

/// Who the bot is on the connected workspace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BotIdentity {
    pub id: MemberId,
    pub name: String,
}

/// Outbound side of the chat transport. Member lookups come from [`MemberDirectory`].
#[async_trait]
pub trait ChatGateway: MemberDirectory {
    async fn send_channel_message(&self, channel_id: &str, text: &str) -> Result<(), GatewayError>;

    /// Visible only to `member`.
    async fn send_private_reply(
        &self,
        channel_id: &str,
        member: &MemberId,
        text: &str,
    ) -> Result<(), GatewayError>;

    async fn add_reaction(
        &self,
        channel_id: &str,
        message_ts: &str,
        name: &str,
    ) -> Result<(), GatewayError>;
}
