//! zimview Content Relay
//!
//! Delivery strategy for views that live across a process boundary: the
//! view asks for a title, the relay resolves it through the store and sends
//! the bytes back. Messages are JSON:
//!
//! ```text
//! -> {"action":"askForContent","title":"I/m/Sine.png"}
//! <- {"action":"giveContent","title":"I/m/Sine.png","content":[137,80,...],"mimeType":"image/png"}
//! ```
//!
//! Every request gets an answer. Unknown titles and malformed requests are
//! answered with empty content so the remote side never waits forever.

mod message;
mod resolver;

pub use message::RelayMessage;
pub use resolver::{RelayResolver, RelayStats};

/// Relay error
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Delivery channel error: {0}")]
    DeliveryChannel(String),

    #[error("Cannot encode relay message: {0}")]
    Encode(#[from] serde_json::Error),
}
