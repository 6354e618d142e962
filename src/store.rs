//! A small redux-style store built on top of the stream engine.
//!
//! Actions dispatched into the store run through a middleware chain,
//! then through the reducer; every resulting state is emitted on the
//! store's state stream. The store holds no logic of its own beyond
//! that wiring: the reducer is a `scan` over the action stream.

use std::cell::RefCell;
use std::rc::Rc;

use crate::errors::StreamError;
use crate::subscription::Subscription;
use crate::Stream;

/// A dispatch interceptor.
///
/// Middlewares wrap dispatch in registration order: the first
/// middleware in the list sees every action first and decides whether
/// (and how often) to call `next`. An action only reaches the reducer
/// once it has passed the whole chain.
pub trait Middleware<A> {
    fn handle(
        &mut self,
        action: A,
        next: &mut dyn FnMut(A) -> Result<(), StreamError>,
    ) -> Result<(), StreamError>;
}

/// Drops an action when it equals the previously dispatched action.
#[derive(Default)]
pub struct Dedupe<A> {
    previous: Option<A>,
}

impl<A> Dedupe<A> {
    pub fn new() -> Self {
        Dedupe { previous: None }
    }
}

impl<A: Clone + PartialEq> Middleware<A> for Dedupe<A> {
    fn handle(
        &mut self,
        action: A,
        next: &mut dyn FnMut(A) -> Result<(), StreamError>,
    ) -> Result<(), StreamError> {
        let repeated = self.previous.as_ref() == Some(&action);
        self.previous = Some(action.clone());
        if repeated {
            Ok(())
        } else {
            next(action)
        }
    }
}

/// Forwards every action twice. Mostly useful for exercising the
/// middleware chain itself.
#[derive(Default)]
pub struct Echo;

impl Echo {
    pub fn new() -> Self {
        Echo
    }
}

impl<A: Clone> Middleware<A> for Echo {
    fn handle(
        &mut self,
        action: A,
        next: &mut dyn FnMut(A) -> Result<(), StreamError>,
    ) -> Result<(), StreamError> {
        next(action.clone())?;
        next(action)
    }
}

/// Records every action that reaches it, then forwards unchanged.
///
/// The tape is a shared handle: clone it, hand one clone to the store
/// and keep the other to inspect the recording.
pub struct Tape<A> {
    actions: Rc<RefCell<Vec<A>>>,
}

impl<A> Tape<A> {
    pub fn new() -> Self {
        Tape {
            actions: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// The actions recorded so far, in arrival order.
    pub fn actions(&self) -> Vec<A>
    where
        A: Clone,
    {
        self.actions.borrow().clone()
    }
}

impl<A> Default for Tape<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Clone for Tape<A> {
    fn clone(&self) -> Self {
        Tape {
            actions: Rc::clone(&self.actions),
        }
    }
}

impl<A: Clone> Middleware<A> for Tape<A> {
    fn handle(
        &mut self,
        action: A,
        next: &mut dyn FnMut(A) -> Result<(), StreamError>,
    ) -> Result<(), StreamError> {
        self.actions.borrow_mut().push(action.clone());
        next(action)
    }
}

/// Redux-style store: dispatched actions are reduced into states and
/// every state change is observable as a stream.
pub struct Store<S, A> {
    actions: Stream<A>,
    states: Stream<S>,
    middlewares: Rc<RefCell<Vec<Box<dyn Middleware<A>>>>>,
    current: Rc<RefCell<S>>,
}

impl<S, A> Store<S, A>
where
    S: Clone + 'static,
    A: 'static,
{
    pub fn new<R>(initial: S, reducer: R) -> Self
    where
        R: FnMut(&S, &A) -> S + 'static,
    {
        Self::with_middlewares(initial, reducer, Vec::new())
    }

    pub fn with_middlewares<R>(
        initial: S,
        reducer: R,
        middlewares: Vec<Box<dyn Middleware<A>>>,
    ) -> Self
    where
        R: FnMut(&S, &A) -> S + 'static,
    {
        let actions = Stream::named("store.actions");
        let states = actions.scan(initial.clone(), reducer);
        let current = Rc::new(RefCell::new(initial));
        let cache = Rc::clone(&current);
        let _ = states.subscribe(move |state: &S| *cache.borrow_mut() = state.clone());
        Store {
            actions,
            states,
            middlewares: Rc::new(RefCell::new(middlewares)),
            current,
        }
    }

    /// Run an action through the middleware chain and the reducer.
    pub fn dispatch(&self, action: A) -> Result<(), StreamError> {
        fn run<A>(
            middlewares: &mut [Box<dyn Middleware<A>>],
            actions: &Stream<A>,
            action: A,
        ) -> Result<(), StreamError>
        where
            A: 'static,
        {
            if let Some((head, rest)) = middlewares.split_first_mut() {
                let mut next = |action: A| run(&mut *rest, actions, action);
                head.handle(action, &mut next)
            } else {
                actions.emit(action)
            }
        }

        let mut middlewares = self.middlewares.borrow_mut();
        run(middlewares.as_mut_slice(), &self.actions, action)
    }

    /// Observe every state produced by the reducer.
    pub fn subscribe<F>(&self, on_state: F) -> Subscription<S>
    where
        F: FnMut(&S) + 'static,
    {
        self.states.subscribe(on_state)
    }

    /// The stream of states, for wiring into further operators.
    pub fn states(&self) -> &Stream<S> {
        &self.states
    }

    /// The most recent state (the initial state before any dispatch).
    pub fn state(&self) -> S {
        self.current.borrow().clone()
    }
}
