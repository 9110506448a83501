// src/deferred.rs — Settle-once result handle with callback registration
//
// A `Deferred` is resolved or rejected exactly once. Handlers registered
// before that are queued and run in registration order; handlers registered
// afterwards run immediately with the stored outcome. A panicking handler is
// logged and does not stop the others.

use std::any::Any;
use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::infra::errors::WkError;

type SuccessFn<T> = Box<dyn FnOnce(&T) + Send>;
type ErrorFn = Box<dyn FnOnce(&WkError) + Send>;
type CompleteFn = Box<dyn FnOnce() + Send>;

enum State<T> {
    Pending {
        success: Vec<SuccessFn<T>>,
        error: Vec<ErrorFn>,
        complete: Vec<CompleteFn>,
    },
    Resolved(Arc<T>),
    Rejected(Arc<WkError>),
}

pub struct Deferred<T> {
    state: Arc<Mutex<State<T>>>,
}

impl<T> Clone for Deferred<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<T> Default for Deferred<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = match &*self.lock() {
            State::Pending { .. } => "pending",
            State::Resolved(_) => "resolved",
            State::Rejected(_) => "rejected",
        };
        f.debug_struct("Deferred").field("state", &status).finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".into()
    }
}

fn guarded(f: impl FnOnce()) {
    if let Err(payload) = catch_unwind(AssertUnwindSafe(f)) {
        tracing::warn!("Error in deferred handler: {}", panic_message(payload.as_ref()));
    }
}

impl<T> Deferred<T> {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State::Pending {
                success: Vec::new(),
                error: Vec::new(),
                complete: Vec::new(),
            })),
        }
    }

    /// Already-resolved handle.
    pub fn resolved(value: T) -> Self {
        let d = Self::new();
        d.resolve(value);
        d
    }

    /// Already-rejected handle.
    pub fn rejected(error: WkError) -> Self {
        let d = Self::new();
        d.reject(error);
        d
    }

    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_settled(&self) -> bool {
        !matches!(&*self.lock(), State::Pending { .. })
    }

    pub fn is_resolved(&self) -> bool {
        matches!(&*self.lock(), State::Resolved(_))
    }

    pub fn is_rejected(&self) -> bool {
        matches!(&*self.lock(), State::Rejected(_))
    }

    /// The stored outcome once settled.
    pub fn outcome(&self) -> Option<Result<Arc<T>, Arc<WkError>>> {
        match &*self.lock() {
            State::Pending { .. } => None,
            State::Resolved(v) => Some(Ok(v.clone())),
            State::Rejected(e) => Some(Err(e.clone())),
        }
    }

    pub fn on_success(&self, f: impl FnOnce(&T) + Send + 'static) -> &Self {
        let value = {
            let mut state = self.lock();
            match &mut *state {
                State::Pending { success, .. } => {
                    success.push(Box::new(f));
                    return self;
                }
                State::Resolved(v) => v.clone(),
                State::Rejected(_) => return self,
            }
        };
        guarded(|| f(&value));
        self
    }

    pub fn on_error(&self, f: impl FnOnce(&WkError) + Send + 'static) -> &Self {
        let error = {
            let mut state = self.lock();
            match &mut *state {
                State::Pending { error, .. } => {
                    error.push(Box::new(f));
                    return self;
                }
                State::Rejected(e) => e.clone(),
                State::Resolved(_) => return self,
            }
        };
        guarded(|| f(&error));
        self
    }

    /// Runs after success or error handlers, whichever path was taken.
    pub fn on_complete(&self, f: impl FnOnce() + Send + 'static) -> &Self {
        {
            let mut state = self.lock();
            if let State::Pending { complete, .. } = &mut *state {
                complete.push(Box::new(f));
                return self;
            }
        }
        guarded(f);
        self
    }

    pub fn then(
        &self,
        success: impl FnOnce(&T) + Send + 'static,
        error: impl FnOnce(&WkError) + Send + 'static,
    ) -> &Self {
        self.on_success(success).on_error(error)
    }

    /// Settle with a value. Returns false if already settled.
    pub fn resolve(&self, value: T) -> bool {
        let value = Arc::new(value);
        let (success, complete) = {
            let mut state = self.lock();
            if !matches!(&*state, State::Pending { .. }) {
                tracing::debug!("Ignoring resolve on settled deferred");
                return false;
            }
            match std::mem::replace(&mut *state, State::Resolved(value.clone())) {
                State::Pending {
                    success, complete, ..
                } => (success, complete),
                _ => return false,
            }
        };
        for f in success {
            guarded(|| f(&value));
        }
        for f in complete {
            guarded(f);
        }
        true
    }

    /// Settle with an error. Returns false if already settled.
    pub fn reject(&self, error: WkError) -> bool {
        let error = Arc::new(error);
        let (errors, complete) = {
            let mut state = self.lock();
            if !matches!(&*state, State::Pending { .. }) {
                tracing::debug!("Ignoring reject on settled deferred");
                return false;
            }
            match std::mem::replace(&mut *state, State::Rejected(error.clone())) {
                State::Pending {
                    error: errors,
                    complete,
                    ..
                } => (errors, complete),
                _ => return false,
            }
        };
        for f in errors {
            guarded(|| f(&error));
        }
        for f in complete {
            guarded(f);
        }
        true
    }

    pub fn settle(&self, result: Result<T, WkError>) -> bool {
        match result {
            Ok(v) => self.resolve(v),
            Err(e) => self.reject(e),
        }
    }

    /// Await `fut` and settle with its result.
    pub async fn settle_from(&self, fut: impl Future<Output = Result<T, WkError>>) -> bool {
        self.settle(fut.await)
    }
}
