//! Single-upstream operators (map, filter, scan, unique, log, flat_map).
//!
//! Every operator registers a forwarding subscriber on its upstream in
//! its constructor and hands back the derived stream, so chained calls
//! like `stream.map(f).filter(g)` build the graph depth-first. Operator
//! state (scan accumulator, last-seen value, current inner
//! subscription) lives inside the forwarding closure and is private to
//! that operator instance: building two `scan`s from one upstream
//! yields two independently-accumulating nodes.

use std::fmt::Debug;

use tracing::debug;

use crate::errors::StreamError;
use crate::subscription::SubscriptionId;
use crate::Stream;

impl<T: 'static> Stream<T> {
    /// Emit `transform(value)` for every upstream emission, exactly 1:1
    /// and in upstream order.
    pub fn map<U, F>(&self, mut transform: F) -> Stream<U>
    where
        U: 'static,
        F: FnMut(&T) -> U + 'static,
    {
        let child = Stream::named(format!("{}.map", self.name()));
        let out = child.clone();
        self.register(move |value: &T| -> Result<(), StreamError> {
            out.emit(transform(value))
        });
        child
    }

    /// Emit a fixed value for every upstream emission.
    ///
    /// This is the constant form of [`Stream::map`], resolved at the
    /// call site instead of probing the argument at runtime. Typical
    /// use is turning unit-valued trigger streams into deltas:
    /// `plus.map_to(1).merge(&minus.map_to(-1))`.
    pub fn map_to<U>(&self, value: U) -> Stream<U>
    where
        U: Clone + 'static,
    {
        let child = Stream::named(format!("{}.map_to", self.name()));
        let out = child.clone();
        self.register(move |_: &T| -> Result<(), StreamError> { out.emit(value.clone()) });
        child
    }

    /// Re-emit the value unchanged iff `predicate(value)` holds.
    ///
    /// Contract: the predicate selects values to KEEP. A value for
    /// which the predicate returns `false` is dropped. Callers chaining
    /// logic onto a filter depend on this direction; a drop-matching
    /// filter is spelled `filter(move |x| !pred(x))` at the call site.
    pub fn filter<F>(&self, mut predicate: F) -> Stream<T>
    where
        T: Clone,
        F: FnMut(&T) -> bool + 'static,
    {
        let child = Stream::named(format!("{}.filter", self.name()));
        let out = child.clone();
        self.register(move |value: &T| -> Result<(), StreamError> {
            if predicate(value) {
                out.emit(value.clone())
            } else {
                Ok(())
            }
        });
        child
    }

    /// Fold upstream values into running state, emitting every
    /// intermediate state.
    ///
    /// On each upstream emission the state advances to
    /// `combine(&state, value)` and the new state is emitted, so the
    /// output is 1:1 with the input.
    ///
    /// ```
    /// use std::cell::RefCell;
    /// use std::rc::Rc;
    ///
    /// use rivulet::Stream;
    ///
    /// let clicks = Stream::new();
    /// let totals = clicks.scan(0, |total, step: &i32| total + step);
    /// let seen = Rc::new(RefCell::new(Vec::new()));
    /// let sink = Rc::clone(&seen);
    /// totals.subscribe(move |total| sink.borrow_mut().push(*total));
    ///
    /// for step in [1, -1, 1, 1] {
    ///     clicks.emit(step).unwrap();
    /// }
    /// assert_eq!(*seen.borrow(), vec![1, 0, 1, 2]);
    /// ```
    pub fn scan<S, F>(&self, initial: S, mut combine: F) -> Stream<S>
    where
        S: Clone + 'static,
        F: FnMut(&S, &T) -> S + 'static,
    {
        let child = Stream::named(format!("{}.scan", self.name()));
        let out = child.clone();
        let mut state = initial;
        self.register(move |value: &T| -> Result<(), StreamError> {
            state = combine(&state, value);
            out.emit(state.clone())
        });
        child
    }

    /// Suppress consecutive duplicates: a value is re-emitted only when
    /// it differs from the last value emitted. The first value is
    /// always emitted.
    pub fn unique(&self) -> Stream<T>
    where
        T: Clone + PartialEq,
    {
        let child = Stream::named(format!("{}.unique", self.name()));
        let out = child.clone();
        let mut last_emitted: Option<T> = None;
        self.register(move |value: &T| -> Result<(), StreamError> {
            if last_emitted.as_ref() != Some(value) {
                last_emitted = Some(value.clone());
                out.emit(value.clone())
            } else {
                Ok(())
            }
        });
        child
    }

    /// Pass-through identity operator that writes each value to the
    /// diagnostic channel (a `debug!` event under the `rivulet::log`
    /// target) before forwarding it unchanged. Emission count, order
    /// and values are untouched.
    pub fn log(&self) -> Stream<T>
    where
        T: Clone + Debug,
    {
        let child = Stream::named(format!("{}.log", self.name()));
        let out = child.clone();
        let name = self.name();
        self.register(move |value: &T| -> Result<(), StreamError> {
            debug!(target: "rivulet::log", stream = %name, value = ?value);
            out.emit(value.clone())
        });
        child
    }

    /// For every upstream value, call `method(value)` to obtain an
    /// inner stream and forward that stream's emissions downstream.
    ///
    /// Inner subscriptions accumulate: emissions from every inner
    /// stream ever produced keep flowing, interleaved, for as long as
    /// those streams live. There is no automatic cleanup, so a
    /// long-lived upstream driving this operator grows its subscription
    /// set without bound: acceptable for session-scoped wiring, wrong
    /// for a long-running service. Use [`Stream::flat_map_latest`] when
    /// only the most recent inner stream should contribute.
    pub fn flat_map<U, F>(&self, mut method: F) -> Stream<U>
    where
        U: Clone + 'static,
        F: FnMut(&T) -> Stream<U> + 'static,
    {
        let child = Stream::named(format!("{}.flat_map", self.name()));
        let out = child.clone();
        self.register(move |value: &T| -> Result<(), StreamError> {
            let inner = method(value);
            let forward = out.clone();
            inner.register(move |v: &U| -> Result<(), StreamError> { forward.emit(v.clone()) });
            Ok(())
        });
        child
    }

    /// Like [`Stream::flat_map`], but only the latest inner stream is
    /// ever forwarded: before subscribing to a new inner stream the
    /// previous inner subscription is torn down. On the very first
    /// upstream value there is no previous subscription and the
    /// teardown is skipped.
    ///
    /// This switch is what gives "reset" semantics their teeth: an
    /// accumulator chain reseeded through [`crate::scan_reset`] stops
    /// contributing the moment the reset stream fires again, because
    /// its forwarding subscription no longer exists. The superseded
    /// inner stream itself keeps running against its own upstreams; it
    /// just no longer reaches this operator's downstream.
    pub fn flat_map_latest<U, F>(&self, mut method: F) -> Stream<U>
    where
        U: Clone + 'static,
        F: FnMut(&T) -> Stream<U> + 'static,
    {
        let child = Stream::named(format!("{}.flat_map_latest", self.name()));
        let out = child.clone();
        let mut current: Option<(Stream<U>, SubscriptionId)> = None;
        self.register(move |value: &T| -> Result<(), StreamError> {
            if let Some((previous, token)) = current.take() {
                previous.unsubscribe(token)?;
            }
            let inner = method(value);
            let forward = out.clone();
            let token =
                inner.register(move |v: &U| -> Result<(), StreamError> { forward.emit(v.clone()) });
            current = Some((inner, token));
            Ok(())
        });
        child
    }
}
