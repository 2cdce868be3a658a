use std::{cell::RefCell, fmt, rc::Rc};

use crate::error::ErrorKind;

/// Outcome of a settled write.
pub type WriteOutcome = std::result::Result<(), ErrorKind>;

type Listener = Box<dyn FnOnce(&WriteOutcome)>;

#[derive(Default)]
struct PromiseState {
    outcome: Option<WriteOutcome>,
    listeners: Vec<Listener>,
}

/// The settling half of a one-shot write completion.
///
/// Settlement consumes the promise, so each promise succeeds or fails
/// exactly once by construction. Channels are pinned to a single loop
/// thread, so the shared state uses `Rc` and no locks.
pub struct WritePromise {
    state: Rc<RefCell<PromiseState>>,
}

/// The observing half of a one-shot write completion.
#[derive(Clone)]
pub struct PromiseHandle {
    state: Rc<RefCell<PromiseState>>,
}

impl WritePromise {
    /// Creates a linked promise/handle pair.
    pub fn pair() -> (WritePromise, PromiseHandle) {
        let state = Rc::new(RefCell::new(PromiseState::default()));
        (WritePromise { state: state.clone() }, PromiseHandle { state })
    }

    /// Settles the promise successfully.
    pub fn succeed(self) {
        self.settle(Ok(()));
    }

    /// Settles the promise with `error`.
    pub fn fail(self, error: ErrorKind) {
        self.settle(Err(error));
    }

    fn settle(self, outcome: WriteOutcome) {
        let listeners = {
            let mut state = self.state.borrow_mut();
            debug_assert!(state.outcome.is_none(), "write promise settled twice");
            state.outcome = Some(outcome.clone());
            std::mem::take(&mut state.listeners)
        };
        // The borrow is released before listeners run; a listener may
        // inspect the handle again.
        for listener in listeners {
            listener(&outcome);
        }
    }
}

impl PromiseHandle {
    /// Returns true once the write has succeeded or failed.
    pub fn is_done(&self) -> bool {
        self.state.borrow().outcome.is_some()
    }

    /// Returns the settled outcome, or `None` while the write is pending.
    pub fn outcome(&self) -> Option<WriteOutcome> {
        self.state.borrow().outcome.clone()
    }

    /// Runs `listener` when the write settles, or immediately if it already has.
    pub fn on_complete<F>(&self, listener: F)
    where
        F: FnOnce(&WriteOutcome) + 'static,
    {
        let settled = self.state.borrow().outcome.clone();
        match settled {
            Some(outcome) => listener(&outcome),
            None => self.state.borrow_mut().listeners.push(Box::new(listener)),
        }
    }
}

impl fmt::Debug for WritePromise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WritePromise")
            .field("settled", &self.state.borrow().outcome.is_some())
            .finish()
    }
}

impl fmt::Debug for PromiseHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PromiseHandle")
            .field("outcome", &self.state.borrow().outcome)
            .finish()
    }
}
