use async_trait::async_trait;
use thiserror::Error;

use crate::domain::member::{MemberId, MemberProfile};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("member lookup failed: {0}")]
pub struct DirectoryError(pub String);

/// Read-only view of the workspace member list.
#[async_trait]
pub trait MemberDirectory: Send + Sync {
    async fn lookup_member(&self, member: &MemberId) -> Result<MemberProfile, DirectoryError>;
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RecipientError {
    #[error("{sender} tried to send kudos to themselves")]
    SelfGift { sender: MemberId },
    #[error("kudos were addressed to the bot itself")]
    BotGift,
    #[error("`{handle}` is not a member of this workspace")]
    UnknownRecipient { handle: String },
}

/// Turns raw mention tokens into confirmed, distinct member identities.
///
/// Mentions share fate: the first invalid one abandons the whole grant.
#[derive(Clone, Debug)]
pub struct RecipientResolver {
    bot: MemberId,
}

impl RecipientResolver {
    pub fn new(bot: MemberId) -> Self {
        Self { bot }
    }

    pub async fn resolve<D>(
        &self,
        directory: &D,
        mentions: &[String],
        sender: &MemberId,
    ) -> Result<Vec<MemberId>, RecipientError>
    where
        D: MemberDirectory + ?Sized,
    {
        let mut verified: Vec<MemberId> = Vec::with_capacity(mentions.len());

        for mention in mentions {
            let candidate = MemberId::new(mention);

            if &candidate == sender {
                return Err(RecipientError::SelfGift { sender: sender.clone() });
            }
            if candidate == self.bot {
                return Err(RecipientError::BotGift);
            }
            if verified.contains(&candidate) {
                continue;
            }
            if candidate.is_empty() {
                return Err(RecipientError::UnknownRecipient { handle: mention.clone() });
            }

            match directory.lookup_member(&candidate).await {
                Ok(_) => verified.push(candidate),
                Err(_) => {
                    return Err(RecipientError::UnknownRecipient {
                        handle: candidate.as_str().to_string(),
                    })
                }
            }
        }

        Ok(verified)
    }
}
