//! Slack side of the kudos bot.
//!
//! - **Events** (`events`) - decode Events API callbacks into [`events::IncomingEvent`]
//! - **Signature** (`signature`) - verify `x-slack-signature` on callbacks
//! - **Web API** (`web_api`) - [`gateway::ChatGateway`] over `chat.*`, `users.info`, `reactions.add`
//! - **Interpreter** (`interpreter`) - one message in, ledger writes and replies out
//! - **Runner** (`runner`) - the single-consumer event loop
//!
//! # Architecture
//!
//! ```text
//! HTTP callback → decode_callback → queue → EventLoop → CommandInterpreter → KudosLedger
//!                                                              ↓
//!                                                 ChatGateway ← replies
//! ```

pub mod events;
pub mod gateway;
pub mod interpreter;
pub mod replies;
pub mod runner;
pub mod signature;
pub mod web_api;

pub use events::{decode_callback, IncomingEvent, MessageEvent, SlackCallback};
pub use gateway::{BotIdentity, ChatGateway, GatewayError};
pub use interpreter::{CommandInterpreter, Interaction};
pub use runner::{event_channel, ChannelEventStream, EventLoop, EventStream, LoopExit, MessageHandler};
pub use signature::{SignatureError, SignatureVerifier};
pub use web_api::SlackWebApi;
