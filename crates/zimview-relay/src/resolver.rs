//! Relay Resolver
//!
//! Local end of the relay: answers content requests from the store.

use std::cell::Cell;

use smol::channel::{Receiver, Sender};
use zimview_archive::{ResourceStore, fetch};

use crate::{RelayError, RelayMessage};

/// Counters over a resolver's lifetime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    pub served: usize,
    pub not_found: usize,
    pub malformed: usize,
}

/// Answers `askForContent` requests
pub struct RelayResolver<S> {
    store: S,
    served: Cell<usize>,
    not_found: Cell<usize>,
    malformed: Cell<usize>,
}

impl<S: ResourceStore> RelayResolver<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            served: Cell::new(0),
            not_found: Cell::new(0),
            malformed: Cell::new(0),
        }
    }

    pub fn stats(&self) -> RelayStats {
        RelayStats {
            served: self.served.get(),
            not_found: self.not_found.get(),
            malformed: self.malformed.get(),
        }
    }

    /// Answer one decoded message
    pub async fn answer(&self, message: RelayMessage) -> RelayMessage {
        let title = match message {
            RelayMessage::AskForContent { title } => title,
            other => {
                tracing::error!("Invalid message received for {}", other.title());
                self.malformed.set(self.malformed.get() + 1);
                return RelayMessage::empty(other.title());
            }
        };

        tracing::debug!("Asked for content: {}", title);
        match fetch(&self.store, &title).await {
            Ok(resource) => {
                self.served.set(self.served.get() + 1);
                RelayMessage::give(&title, resource)
            }
            Err(err) => {
                tracing::error!("Title {} not available: {}", title, err);
                self.not_found.set(self.not_found.get() + 1);
                RelayMessage::empty(&title)
            }
        }
    }

    /// Answer one raw JSON request with a raw JSON reply
    pub async fn handle(&self, raw: &str) -> Result<String, RelayError> {
        let reply = match RelayMessage::decode(raw) {
            Ok(message) => self.answer(message).await,
            Err(err) => {
                tracing::error!("Malformed relay message: {}", err);
                self.malformed.set(self.malformed.get() + 1);
                RelayMessage::empty(&salvage_title(raw))
            }
        };
        reply.encode()
    }

    /// Serve requests until the request side closes.
    ///
    /// Returns the number of requests answered. Fails if replies can no
    /// longer be delivered.
    pub async fn serve(&self, requests: Receiver<String>, replies: Sender<String>) -> Result<usize, RelayError> {
        let mut answered = 0;
        while let Ok(raw) = requests.recv().await {
            let reply = self.handle(&raw).await?;
            replies
                .send(reply)
                .await
                .map_err(|_| RelayError::DeliveryChannel("reply channel closed".to_string()))?;
            answered += 1;
        }
        tracing::debug!("Relay request channel closed after {} request(s)", answered);
        Ok(answered)
    }
}

/// Best-effort title from a message that did not decode
fn salvage_title(raw: &str) -> String {
    serde_json::from_str::<serde_json::Value>(raw)
        .ok()
        .and_then(|value| value.get("title").and_then(|t| t.as_str()).map(str::to_string))
        .unwrap_or_default()
}
