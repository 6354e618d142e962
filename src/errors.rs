//! Error types for the stream engine.

use thiserror::Error;

use crate::subscription::SubscriptionId;

/// Errors surfaced by wiring and propagation.
///
/// Propagation is fail-fast: a subscriber that fails during `notify`
/// aborts delivery to subscribers registered after it in the same pass,
/// and the error travels back up the `emit` call chain wrapped with the
/// name of each node it crossed. Listener bodies that must never abort
/// a propagation pass should catch their own failures at the call site.
#[derive(Debug, Error)]
pub enum StreamError {
    /// `unsubscribe` was asked to remove a token that is not currently
    /// registered on the node, either because it was already removed or
    /// because the node itself has been dropped.
    #[error("no subscriber registered under token {token} on stream '{node}'")]
    UnknownSubscription {
        node: String,
        token: SubscriptionId,
    },

    /// A combinator was constructed with a degenerate input, e.g. an
    /// empty upstream set.
    #[error("{message}")]
    InvalidConfiguration { message: String },

    /// A subscriber failed while a value was being propagated through
    /// the named node.
    #[error("Stream operation failed at node '{node}'")]
    Propagation {
        node: String,
        #[source]
        source: Box<StreamError>,
    },

    /// A failure raised by a user-implemented [`crate::Subscriber`].
    #[error("{message}")]
    Listener { message: String },
}

impl StreamError {
    /// Build a [`StreamError::Listener`] from any displayable message.
    pub fn listener(message: impl Into<String>) -> Self {
        StreamError::Listener {
            message: message.into(),
        }
    }
}
