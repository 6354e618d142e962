//! Stream node internals: subscriber registry and emission.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::trace;

use crate::errors::StreamError;
use crate::subscription::{Subscription, SubscriptionId};
use crate::Stream;

/// The capability required to receive values from a stream.
///
/// Derived operators satisfy it with forwarding closures; terminal
/// sinks are either plain closures handed to [`Stream::subscribe`] or
/// application types (a widget wrapper, a recorder) implementing the
/// trait directly and handed to [`Stream::register`].
///
/// A subscriber may fail. Propagation is fail-fast, so a failure
/// aborts delivery to subscribers registered later on the same node;
/// use [`StreamError::listener`] to surface application failures.
pub trait Subscriber<T> {
    fn notify(&mut self, value: &T) -> Result<(), StreamError>;
}

impl<T, F> Subscriber<T> for F
where
    F: FnMut(&T) -> Result<(), StreamError>,
{
    fn notify(&mut self, value: &T) -> Result<(), StreamError> {
        self(value)
    }
}

/// Registering a stream on another stream pipes values across:
/// everything emitted upstream is re-emitted on the registered stream.
impl<T: Clone + 'static> Subscriber<T> for Stream<T> {
    fn notify(&mut self, value: &T) -> Result<(), StreamError> {
        self.emit(value.clone())
    }
}

struct Entry<T> {
    token: SubscriptionId,
    subscriber: Rc<RefCell<dyn Subscriber<T>>>,
}

pub(crate) struct NodeCore<T> {
    pub(crate) name: String,
    next_token: u64,
    entries: Vec<Entry<T>>,
}

impl<T> NodeCore<T> {
    fn new(name: String) -> Self {
        NodeCore {
            name,
            next_token: 0,
            entries: Vec::new(),
        }
    }

    fn push(&mut self, subscriber: Rc<RefCell<dyn Subscriber<T>>>) -> SubscriptionId {
        let token = SubscriptionId::new(self.next_token);
        self.next_token += 1;
        self.entries.push(Entry { token, subscriber });
        token
    }

    /// Removes the first entry matching `token`. Tokens are unique per
    /// node, so at most one entry can match.
    pub(crate) fn remove(&mut self, token: SubscriptionId) -> bool {
        match self.entries.iter().position(|entry| entry.token == token) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    fn snapshot(&self) -> Vec<Rc<RefCell<dyn Subscriber<T>>>> {
        self.entries
            .iter()
            .map(|entry| Rc::clone(&entry.subscriber))
            .collect()
    }
}

impl<T: 'static> Stream<T> {
    /// Create a new source stream named `source`.
    pub fn new() -> Self {
        Self::named("source")
    }

    /// Create a new source stream with a diagnostic name.
    ///
    /// Derived nodes built by operators are named `{parent}.{op}`; the
    /// name shows up in propagation errors and trace output.
    pub fn named(name: impl Into<String>) -> Self {
        Stream {
            core: Rc::new(RefCell::new(NodeCore::new(name.into()))),
        }
    }

    pub fn name(&self) -> String {
        self.core.borrow().name.clone()
    }

    /// Append a subscriber to this node's listener list.
    ///
    /// No duplicate check is made: registering the same subscriber
    /// twice delivers each emission twice, which is occasionally wanted
    /// and otherwise the caller's mistake to avoid.
    pub fn register<S>(&self, subscriber: S) -> SubscriptionId
    where
        S: Subscriber<T> + 'static,
    {
        self.core
            .borrow_mut()
            .push(Rc::new(RefCell::new(subscriber)))
    }

    /// Register a plain callable and return a cancellation handle.
    pub fn subscribe<F>(&self, mut on_value: F) -> Subscription<T>
    where
        F: FnMut(&T) + 'static,
    {
        let token = self.register(move |value: &T| -> Result<(), StreamError> {
            on_value(value);
            Ok(())
        });
        Subscription::new(Rc::downgrade(&self.core), self.name(), token)
    }

    /// Remove the listener registered under `token`.
    ///
    /// Fails with [`StreamError::UnknownSubscription`] when the token
    /// is not currently registered, so removing twice is caught rather
    /// than silently removing somebody else's listener.
    pub fn unsubscribe(&self, token: SubscriptionId) -> Result<(), StreamError> {
        let mut core = self.core.borrow_mut();
        if core.remove(token) {
            Ok(())
        } else {
            Err(StreamError::UnknownSubscription {
                node: core.name.clone(),
                token,
            })
        }
    }

    /// Push a value into this node, synchronously notifying every
    /// currently-registered subscriber in registration order.
    ///
    /// Delivery iterates over a snapshot of the subscriber list taken
    /// when the call starts: a subscriber registered on this node
    /// during the pass does not see the in-flight value. Because
    /// propagation is a plain recursive call, an emission can trigger
    /// arbitrarily deep emission chains before this returns; wiring a
    /// cycle back into a node that is currently notifying is
    /// unsupported and will abort the process or exhaust the stack.
    ///
    /// A stream with zero subscribers accepts emissions as a no-op.
    pub fn emit(&self, value: T) -> Result<(), StreamError> {
        let (name, subscribers) = {
            let core = self.core.borrow();
            (core.name.clone(), core.snapshot())
        };
        trace!(target: "rivulet::emit", stream = %name, subscribers = subscribers.len());
        for subscriber in subscribers {
            subscriber
                .borrow_mut()
                .notify(&value)
                .map_err(|source| StreamError::Propagation {
                    node: name.clone(),
                    source: Box::new(source),
                })?;
        }
        Ok(())
    }
}

impl<T: 'static> Default for Stream<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use super::Subscriber;
    use crate::{Stream, StreamError};

    fn record<T: Clone + 'static>(stream: &Stream<T>) -> Rc<RefCell<Vec<T>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let _ = stream.subscribe(move |value: &T| sink.borrow_mut().push(value.clone()));
        seen
    }

    #[test]
    fn emit_with_no_subscribers_is_a_no_op() {
        let stream: Stream<i32> = Stream::new();
        stream.emit(1).unwrap();
    }

    #[test]
    fn subscribers_are_notified_in_registration_order() {
        let stream = Stream::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        for tag in ["first", "second", "third"] {
            let order = Rc::clone(&order);
            let _ = stream.subscribe(move |_: &i32| order.borrow_mut().push(tag));
        }

        stream.emit(0).unwrap();
        assert_eq!(*order.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn duplicate_registration_delivers_twice() {
        struct Counter(Rc<Cell<usize>>);
        impl Subscriber<i32> for Counter {
            fn notify(&mut self, _: &i32) -> Result<(), StreamError> {
                self.0.set(self.0.get() + 1);
                Ok(())
            }
        }

        let stream = Stream::new();
        let count = Rc::new(Cell::new(0));
        stream.register(Counter(Rc::clone(&count)));
        stream.register(Counter(Rc::clone(&count)));

        stream.emit(0).unwrap();
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn stream_registered_on_stream_pipes_values() {
        let upstream = Stream::new();
        let downstream: Stream<i32> = Stream::named("echo");
        let seen = record(&downstream);

        upstream.register(downstream.clone());
        upstream.emit(4).unwrap();
        upstream.emit(5).unwrap();

        assert_eq!(*seen.borrow(), vec![4, 5]);
    }

    #[test]
    fn subscriber_added_during_emit_misses_the_in_flight_value() {
        let stream: Stream<i32> = Stream::new();
        let late = Rc::new(RefCell::new(Vec::new()));
        let installed = Rc::new(Cell::new(false));

        let handle = stream.clone();
        let late_sink = Rc::clone(&late);
        let installed_flag = Rc::clone(&installed);
        let _ = stream.subscribe(move |_: &i32| {
            if !installed_flag.get() {
                installed_flag.set(true);
                let late_sink = Rc::clone(&late_sink);
                let _ = handle.subscribe(move |value: &i32| late_sink.borrow_mut().push(*value));
            }
        });

        stream.emit(1).unwrap();
        stream.emit(2).unwrap();

        assert_eq!(*late.borrow(), vec![2]);
    }

    #[test]
    fn failing_subscriber_aborts_delivery_to_later_subscribers() {
        struct Broken;
        impl Subscriber<i32> for Broken {
            fn notify(&mut self, _: &i32) -> Result<(), StreamError> {
                Err(StreamError::listener("sink rejected value"))
            }
        }

        let stream = Stream::named("input");
        let before = record(&stream);
        stream.register(Broken);
        let after = record(&stream);

        let err = stream.emit(9).unwrap_err();
        match err {
            StreamError::Propagation { node, source } => {
                assert_eq!(node, "input");
                assert!(matches!(*source, StreamError::Listener { .. }));
            }
            other => panic!("expected propagation error, got {other:?}"),
        }
        assert_eq!(*before.borrow(), vec![9]);
        assert!(after.borrow().is_empty());
    }

    #[test]
    fn propagation_errors_name_each_node_crossed() {
        struct Broken;
        impl Subscriber<i32> for Broken {
            fn notify(&mut self, _: &i32) -> Result<(), StreamError> {
                Err(StreamError::listener("boom"))
            }
        }

        let source = Stream::named("clicks");
        let doubled = source.map(|x: &i32| x * 2);
        doubled.register(Broken);

        let err = source.emit(1).unwrap_err();
        // Outermost wrap names the source, the inner wrap the derived node.
        match err {
            StreamError::Propagation { node, source } => {
                assert_eq!(node, "clicks");
                assert!(matches!(
                    *source,
                    StreamError::Propagation { ref node, .. } if node == "clicks.map"
                ));
            }
            other => panic!("expected propagation error, got {other:?}"),
        }
    }
}
