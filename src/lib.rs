//! # rivulet - push-based reactive streams
//!
//! A small functional-reactive core for wiring externally-driven events
//! into derived state without manual callback bookkeeping. Application
//! code builds a directed acyclic graph of stream nodes at setup time
//! (source, then operators, then sinks), after which source nodes are
//! driven through [`Stream::emit`]. Propagation is synchronous and
//! depth-first: `emit` returns only once every transitively-reachable
//! subscriber has processed the value.
//!
//! The engine owns nothing but propagation. There is no run loop, no
//! timer, no I/O and no background thread; connecting external event
//! sources to `emit`, and rendering emitted values, is the embedding
//! application's job.
//!
//! Example:
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use rivulet::Stream;
//!
//! let source = Stream::new();
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let sink = Rc::clone(&seen);
//! source.map(|x: &i32| x * 2).subscribe(move |x| sink.borrow_mut().push(*x));
//! source.emit(5).unwrap();
//! assert_eq!(*seen.borrow(), vec![10]);
//! ```

use std::cell::RefCell;
use std::rc::Rc;

// Module declarations
mod combinators;
mod errors;
mod helpers;
mod node;
mod operations;
mod store;
mod subscription;

// Re-exports
pub use combinators::{combine_latest, merge};
pub use errors::StreamError;
pub use helpers::{scan_reset, scan_reset_emit_seed};
pub use node::Subscriber;
pub use store::{Dedupe, Echo, Middleware, Store, Tape};
pub use subscription::{Subscription, SubscriptionId};

use node::NodeCore;

/// A node in the push-based event propagation graph.
///
/// A stream owns an ordered list of downstream subscribers and nothing
/// else; it holds no reference to whatever emits into it, so the graph
/// stays acyclic as long as wiring code never registers a stream as its
/// own (possibly indirect) upstream. Values pushed in with
/// [`Stream::emit`] are delivered synchronously, in registration order,
/// to every subscriber.
///
/// `Stream` is a cheap handle: cloning it yields another handle to the
/// same node, which is how operators hand their output stream both to
/// the caller and to the forwarding closure they register upstream.
///
/// The engine is single-threaded by construction (`Rc`/`RefCell`
/// internals, deliberately `!Send`). Wiring and emission must happen on
/// one thread; a multi-threaded host needs its own synchronization in
/// front of the graph.
pub struct Stream<T> {
    pub(crate) core: Rc<RefCell<NodeCore<T>>>,
}

impl<T> Clone for Stream<T> {
    fn clone(&self) -> Self {
        Stream {
            core: Rc::clone(&self.core),
        }
    }
}

impl<T> std::fmt::Debug for Stream<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stream").finish_non_exhaustive()
    }
}
