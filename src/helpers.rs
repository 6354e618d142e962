//! Composition helpers built from the core operators.

use crate::Stream;

/// Accumulate `stream` with `accumulator`, reseeding from `reset`.
///
/// Every `reset` emission becomes a fresh seed: the helper
/// flat-map-latests into `stream.scan(seed, accumulator)`, so the
/// previous accumulator chain stops contributing downstream the moment
/// a new seed arrives. Nothing is emitted until a seed has arrived and
/// `stream` fires; the seed itself is not re-emitted (see
/// [`scan_reset_emit_seed`] for that variant).
///
/// Superseded scan nodes stay subscribed to `stream` and keep
/// accumulating silently; only their forwarding into the result is torn
/// down. That matches the session-scoped wiring this helper exists for
/// and is the documented cost of [`Stream::flat_map_latest`].
pub fn scan_reset<T, S, F>(stream: &Stream<T>, accumulator: F, reset: &Stream<S>) -> Stream<S>
where
    T: 'static,
    S: Clone + 'static,
    F: Fn(&S, &T) -> S + Clone + 'static,
{
    let stream = stream.clone();
    reset.flat_map_latest(move |seed: &S| stream.scan(seed.clone(), accumulator.clone()))
}

/// Like [`scan_reset`], but each `reset` emission also re-emits the
/// seed itself before accumulation resumes.
///
/// Built as the merge of the reset stream with the reseeded
/// accumulator, so a reset both surfaces immediately and becomes the
/// base of subsequent accumulation:
/// seeds `10, 20` followed by a `+1` click yield `10, 20, 21`.
pub fn scan_reset_emit_seed<T, S, F>(
    stream: &Stream<T>,
    accumulator: F,
    reset: &Stream<S>,
) -> Stream<S>
where
    T: 'static,
    S: Clone + 'static,
    F: Fn(&S, &T) -> S + Clone + 'static,
{
    reset.merge(&scan_reset(stream, accumulator, reset))
}
