//! Fan-in combinators (merge, combine_latest).

use std::cell::RefCell;
use std::rc::Rc;

use crate::errors::StreamError;
use crate::Stream;

impl<T: Clone + 'static> Stream<T> {
    /// Merge this stream with another: any emission from either
    /// upstream is re-emitted immediately, so values interleave in
    /// arrival order, one event in, one event out.
    pub fn merge(&self, other: &Stream<T>) -> Stream<T> {
        let node = Stream::named(format!("{}.merge", self.name()));
        for upstream in [self, other] {
            let out = node.clone();
            upstream.register(move |value: &T| -> Result<(), StreamError> {
                out.emit(value.clone())
            });
        }
        node
    }

    /// Combine this stream (slot 0) with `others` (slots 1..), emitting
    /// the full latest-value snapshot on every upstream emission. See
    /// [`combine_latest`] for the snapshot semantics.
    pub fn combine_latest(&self, others: &[Stream<T>]) -> Stream<Vec<Option<T>>> {
        let mut streams = Vec::with_capacity(1 + others.len());
        streams.push(self.clone());
        streams.extend(others.iter().cloned());
        wire_combine_latest(&streams, format!("{}.combine_latest", self.name()))
    }
}

/// Merge a fixed, non-empty set of streams into one.
///
/// A plain multiplexer: no deduplication, no reordering, each upstream
/// emission re-emitted exactly once in the calling thread. The upstream
/// set cannot be changed after construction.
pub fn merge<T: Clone + 'static>(streams: &[Stream<T>]) -> Result<Stream<T>, StreamError> {
    if streams.is_empty() {
        return Err(StreamError::InvalidConfiguration {
            message: "merge requires at least one stream".to_string(),
        });
    }

    let node = Stream::named("merge");
    for upstream in streams {
        let out = node.clone();
        upstream.register(move |value: &T| -> Result<(), StreamError> { out.emit(value.clone()) });
    }
    Ok(node)
}

/// Combine the latest values of a fixed, non-empty set of streams.
///
/// Each upstream is assigned a slot; on any upstream emission the slot
/// updates and the *entire* slot array is emitted as a snapshot, even
/// while other slots are still unset (`None`). Early snapshots with
/// sentinel placeholders are required behavior, not a bug: consumers
/// rely on "latest known value of each slot" recalculation and must be
/// prepared for partially-populated snapshots.
///
/// ```
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// use rivulet::{combine_latest, Stream};
///
/// let a = Stream::new();
/// let b = Stream::new();
/// let latest = combine_latest(&[a.clone(), b.clone()]).unwrap();
/// let seen = Rc::new(RefCell::new(Vec::new()));
/// let sink = Rc::clone(&seen);
/// latest.subscribe(move |snapshot: &Vec<Option<i32>>| sink.borrow_mut().push(snapshot.clone()));
///
/// a.emit(5).unwrap();
/// b.emit(7).unwrap();
/// assert_eq!(
///     *seen.borrow(),
///     vec![vec![Some(5), None], vec![Some(5), Some(7)]]
/// );
/// ```
pub fn combine_latest<T: Clone + 'static>(
    streams: &[Stream<T>],
) -> Result<Stream<Vec<Option<T>>>, StreamError> {
    if streams.is_empty() {
        return Err(StreamError::InvalidConfiguration {
            message: "combine_latest requires at least one stream".to_string(),
        });
    }
    Ok(wire_combine_latest(streams, "combine_latest".to_string()))
}

/// Wires each upstream to its slot index and shares one state array.
/// The per-index closure acts as a tag node: it turns a raw emission
/// into an indexed slot update before the combine state is touched.
fn wire_combine_latest<T: Clone + 'static>(
    streams: &[Stream<T>],
    name: String,
) -> Stream<Vec<Option<T>>> {
    let node = Stream::named(name);
    let state: Rc<RefCell<Vec<Option<T>>>> = Rc::new(RefCell::new(vec![None; streams.len()]));

    for (index, upstream) in streams.iter().enumerate() {
        let state = Rc::clone(&state);
        let out = node.clone();
        upstream.register(move |value: &T| -> Result<(), StreamError> {
            let snapshot = {
                let mut slots = state.borrow_mut();
                slots[index] = Some(value.clone());
                slots.clone()
            };
            out.emit(snapshot)
        });
    }

    node
}
