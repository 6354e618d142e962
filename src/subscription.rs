//! Subscription handles for removing registered listeners.

use std::cell::RefCell;
use std::fmt;
use std::rc::Weak;

use crate::errors::StreamError;
use crate::node::NodeCore;

/// Token identifying one registered listener on one stream node.
///
/// Tokens come from a per-node monotonically increasing counter
/// assigned at registration time; they are never derived from object
/// identity or addresses and are never reused within a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub(crate) fn new(raw: u64) -> Self {
        SubscriptionId(raw)
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle returned by [`crate::Stream::subscribe`].
///
/// Cancelling consumes the handle, so a single handle cannot remove
/// two listeners. Removing the same token twice through the
/// stream-level [`crate::Stream::unsubscribe`] reports
/// [`StreamError::UnknownSubscription`] rather than failing silently.
///
/// The handle holds only a weak reference to the node; it does not
/// keep the stream alive.
pub struct Subscription<T> {
    core: Weak<RefCell<NodeCore<T>>>,
    node: String,
    token: SubscriptionId,
}

impl<T> Subscription<T> {
    pub(crate) fn new(
        core: Weak<RefCell<NodeCore<T>>>,
        node: String,
        token: SubscriptionId,
    ) -> Self {
        Subscription { core, node, token }
    }

    /// The token under which the listener was registered.
    pub fn token(&self) -> SubscriptionId {
        self.token
    }

    /// Remove the listener this handle was created for.
    ///
    /// Exactly one entry is removed. Fails with
    /// [`StreamError::UnknownSubscription`] if the token was already
    /// removed through [`crate::Stream::unsubscribe`], or if the stream
    /// node no longer exists.
    pub fn cancel(self) -> Result<(), StreamError> {
        let Some(core) = self.core.upgrade() else {
            return Err(StreamError::UnknownSubscription {
                node: self.node,
                token: self.token,
            });
        };
        if core.borrow_mut().remove(self.token) {
            Ok(())
        } else {
            Err(StreamError::UnknownSubscription {
                node: self.node,
                token: self.token,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::{Stream, StreamError};

    fn record<T: Clone + 'static>(stream: &Stream<T>) -> Rc<RefCell<Vec<T>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let _ = stream.subscribe(move |value: &T| sink.borrow_mut().push(value.clone()));
        seen
    }

    #[test]
    fn cancel_stops_delivery() {
        let stream = Stream::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let sub = stream.subscribe(move |value: &i32| sink.borrow_mut().push(*value));

        stream.emit(1).unwrap();
        sub.cancel().unwrap();
        stream.emit(2).unwrap();

        assert_eq!(*seen.borrow(), vec![1]);
    }

    #[test]
    fn cancel_removes_only_its_own_listener() {
        let stream = Stream::new();
        let first = record(&stream);
        let sub = stream.subscribe(|_: &i32| {});
        let second = record(&stream);

        sub.cancel().unwrap();
        stream.emit(7).unwrap();

        assert_eq!(*first.borrow(), vec![7]);
        assert_eq!(*second.borrow(), vec![7]);
    }

    #[test]
    fn unsubscribing_a_cancelled_token_is_an_error() {
        let stream = Stream::new();
        let sub = stream.subscribe(|_: &i32| {});
        let token = sub.token();
        sub.cancel().unwrap();

        let err = stream.unsubscribe(token).unwrap_err();
        assert!(matches!(
            err,
            StreamError::UnknownSubscription { ref node, .. } if node == "source"
        ));
    }

    #[test]
    fn cancel_after_node_dropped_is_an_error() {
        let stream: Stream<i32> = Stream::named("orphan");
        let sub = stream.subscribe(|_| {});
        drop(stream);

        let err = sub.cancel().unwrap_err();
        assert!(matches!(
            err,
            StreamError::UnknownSubscription { ref node, .. } if node == "orphan"
        ));
    }

    #[test]
    fn tokens_are_unique_per_node() {
        let stream: Stream<i32> = Stream::new();
        let a = stream.subscribe(|_| {}).token();
        let b = stream.subscribe(|_| {}).token();
        assert_ne!(a, b);
    }
}
