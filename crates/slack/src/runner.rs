use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use kudos_core::ledger::KudosLedger;

use crate::events::{IncomingEvent, MessageEvent};
use crate::gateway::ChatGateway;
use crate::interpreter::{CommandInterpreter, Interaction};

/// Source of decoded chat events. `None` means the source is gone for good.
#[async_trait]
pub trait EventStream: Send {
    async fn next_event(&mut self) -> Option<IncomingEvent>;
}

/// Receiving half of the bounded queue filled by the HTTP ingress.
pub struct ChannelEventStream {
    receiver: mpsc::Receiver<IncomingEvent>,
}

#[async_trait]
impl EventStream for ChannelEventStream {
    async fn next_event(&mut self) -> Option<IncomingEvent> {
        self.receiver.recv().await
    }
}

pub fn event_channel(capacity: usize) -> (mpsc::Sender<IncomingEvent>, ChannelEventStream) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    (sender, ChannelEventStream { receiver })
}

#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle_message(&self, message: &MessageEvent) -> Interaction;
}

#[async_trait]
impl<G, L> MessageHandler for CommandInterpreter<G, L>
where
    G: ChatGateway + ?Sized,
    L: KudosLedger + ?Sized,
{
    async fn handle_message(&self, message: &MessageEvent) -> Interaction {
        self.handle(message).await
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopExit {
    StreamClosed,
    AuthInvalid,
}

/// Processes events strictly one at a time; the next event is not pulled until the
/// current message has been fully handled.
pub struct EventLoop<H: ?Sized> {
    handler: Arc<H>,
}

impl<H> EventLoop<H>
where
    H: MessageHandler + ?Sized,
{
    pub fn new(handler: Arc<H>) -> Self {
        Self { handler }
    }

    pub async fn run<S>(&self, stream: &mut S) -> LoopExit
    where
        S: EventStream + ?Sized,
    {
        info!(event_name = "runtime.event_loop.started", "kudos event loop started");

        loop {
            let Some(event) = stream.next_event().await else {
                info!(event_name = "runtime.event_loop.stream_closed", "event stream closed");
                return LoopExit::StreamClosed;
            };

            match event {
                IncomingEvent::Message(message) => {
                    debug!(
                        event_name = "ingress.slack.message_received",
                        correlation_id = %message.event_ts,
                        channel_id = %message.channel_id,
                        sender = %message.sender,
                        "received chat message"
                    );
                    if self.handler.handle_message(&message).await == Interaction::AuthInvalid {
                        warn!(
                            event_name = "runtime.event_loop.auth_invalid",
                            correlation_id = %message.event_ts,
                            "chat credentials were rejected while replying; stopping event loop"
                        );
                        return LoopExit::AuthInvalid;
                    }
                }
                IncomingEvent::TransportError { detail } => {
                    warn!(
                        event_name = "ingress.slack.transport_error",
                        error = %detail,
                        "skipping undeliverable chat event"
                    );
                }
                IncomingEvent::AuthInvalid => {
                    warn!(
                        event_name = "runtime.event_loop.auth_invalid",
                        "chat credentials are no longer valid; stopping event loop"
                    );
                    return LoopExit::AuthInvalid;
                }
            }
        }
    }
}
