//! Slack Events API payloads.
//!
//! An HTTP callback body is decoded into a [`SlackCallback`]: either the one-off URL
//! verification handshake, an [`IncomingEvent`] for the event loop, or something the
//! bot does not care about.

use serde::Deserialize;

use kudos_core::domain::member::MemberId;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageEvent {
    pub text: String,
    pub sender: MemberId,
    pub channel_id: String,
    /// Timestamp of the message itself; reactions are attached to it.
    pub event_ts: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IncomingEvent {
    Message(MessageEvent),
    TransportError { detail: String },
    AuthInvalid,
}

impl IncomingEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Message(_) => "message",
            Self::TransportError { .. } => "transport_error",
            Self::AuthInvalid => "auth_invalid",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SlackCallback {
    UrlVerification { challenge: String },
    Event { event_id: Option<String>, event: IncomingEvent },
    Ignored { reason: String },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum CallbackEnvelope {
    UrlVerification {
        challenge: String,
    },
    EventCallback {
        event: RawEvent,
        #[serde(default)]
        event_id: Option<String>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    subtype: Option<String>,
    #[serde(default)]
    bot_id: Option<String>,
    #[serde(default)]
    user: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    ts: Option<String>,
}

pub fn decode_callback(body: &[u8]) -> SlackCallback {
    let envelope = match serde_json::from_slice::<CallbackEnvelope>(body) {
        Ok(envelope) => envelope,
        Err(error) => {
            return SlackCallback::Event {
                event_id: None,
                event: IncomingEvent::TransportError {
                    detail: format!("undecodable callback body: {error}"),
                },
            }
        }
    };

    match envelope {
        CallbackEnvelope::UrlVerification { challenge } => {
            SlackCallback::UrlVerification { challenge }
        }
        CallbackEnvelope::EventCallback { event, event_id } => match classify_event(event) {
            Ok(event) => SlackCallback::Event { event_id, event },
            Err(reason) => SlackCallback::Ignored { reason },
        },
        CallbackEnvelope::Other => {
            SlackCallback::Ignored { reason: "unsupported callback type".to_string() }
        }
    }
}

fn classify_event(raw: RawEvent) -> Result<IncomingEvent, String> {
    match raw.kind.as_str() {
        "tokens_revoked" | "app_uninstalled" => Ok(IncomingEvent::AuthInvalid),
        "message" => {
            if let Some(subtype) = raw.subtype {
                return Err(format!("message subtype `{subtype}`"));
            }
            if raw.bot_id.is_some() {
                return Err("message posted by a bot".to_string());
            }

            let (Some(user), Some(channel_id), Some(event_ts)) = (raw.user, raw.channel, raw.ts)
            else {
                return Err("message without user, channel or ts".to_string());
            };

            Ok(IncomingEvent::Message(MessageEvent {
                text: raw.text.unwrap_or_default(),
                sender: MemberId::new(&user),
                channel_id,
                event_ts,
            }))
        }
        other => Err(format!("event type `{other}`")),
    }
}
