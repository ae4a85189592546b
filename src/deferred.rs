use crate::state::{Settlement, State};
use crate::{Promise, Status};
use futures::future::{self, FutureExt, Ready};
use std::fmt;
use std::future::IntoFuture;
use std::sync::Arc;

/// A future together with the controls to settle it from outside.
///
/// `Deferred` is a handle: clones share the same state, so any clone can
/// settle it and every clone sees the same [`Status`]. Only the first
/// `resolve`/`reject` has an effect, later calls are silently ignored.
///
/// # Examples
///
/// ```
/// use deferred::{Deferred, Status};
/// use futures::executor::block_on;
///
/// let deferred = Deferred::<i32, String>::new();
/// deferred.resolve(1).resolve(2).reject("too late".into());
/// assert_eq!(deferred.status(), Status::Resolved);
/// assert_eq!(block_on(deferred.promise()), Ok(1));
/// ```
pub struct Deferred<T, E> {
    state: Arc<State<T, E>>,
}

impl<T, E> Deferred<T, E> {
    /// A pending deferred.
    pub fn new() -> Self {
        Deferred {
            state: State::pending(None),
        }
    }

    /// A deferred that is already settled with `outcome`.
    ///
    /// `Err` gives a `Rejected` deferred and `Ok` a `Resolved` one, observable
    /// right away without polling.
    pub fn settled(outcome: Result<T, E>) -> Self {
        Deferred {
            state: State::settled(outcome),
        }
    }

    pub fn resolved(value: T) -> Self {
        let deferred = Self::new();
        deferred.resolve(value);
        deferred
    }

    pub fn rejected(error: E) -> Self {
        let deferred = Self::new();
        deferred.reject(error);
        deferred
    }

    /// The future this deferred settles.
    pub fn promise(&self) -> Promise<T, E> {
        Promise::new(self.state.clone())
    }

    pub fn status(&self) -> Status {
        self.state.status()
    }

    pub fn is_pending(&self) -> bool {
        self.status().is_pending()
    }

    pub fn is_resolved(&self) -> bool {
        self.status().is_resolved()
    }

    pub fn is_rejected(&self) -> bool {
        self.status().is_rejected()
    }

    /// Resolve with `value` if still pending, otherwise do nothing.
    pub fn resolve(&self, value: T) -> &Self {
        self.state.settle(Settlement::Value(Ok(value)));
        self
    }

    /// Reject with `error` if still pending, otherwise do nothing.
    ///
    /// The error is handed to consumers exactly as given.
    pub fn reject(&self, error: E) -> &Self {
        self.state.settle(Settlement::Value(Err(error)));
        self
    }

    /// `resolve` detached from this handle.
    ///
    /// ```
    /// use deferred::Deferred;
    /// use futures::executor::block_on;
    /// use std::thread;
    ///
    /// let deferred = Deferred::<&str, ()>::new();
    /// let resolve = deferred.resolver();
    /// thread::spawn(move || resolve("done")).join().unwrap();
    /// assert_eq!(block_on(deferred.promise()), Ok("done"));
    /// ```
    pub fn resolver(&self) -> impl Fn(T) + Clone {
        let deferred = self.clone();
        move |value| {
            deferred.resolve(value);
        }
    }

    /// `reject` detached from this handle.
    pub fn rejecter(&self) -> impl Fn(E) + Clone {
        let deferred = self.clone();
        move |error| {
            deferred.reject(error);
        }
    }
}

impl<T, E> Deferred<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// A pending deferred that follows `base`.
    ///
    /// When `base` completes its outcome settles this deferred, unless it was
    /// settled first by other means, in which case the outcome of `base` is
    /// discarded. The base future is driven by whoever polls the promise.
    ///
    /// ```
    /// use deferred::Deferred;
    /// use futures::executor::block_on;
    /// use futures::future;
    ///
    /// let wrapped = Deferred::<i32, ()>::wrap(future::ready(Ok(7)));
    /// assert_eq!(block_on(wrapped.promise()), Ok(7));
    ///
    /// let overridden = Deferred::<i32, ()>::wrap(future::ready(Ok(7)));
    /// overridden.resolve(42);
    /// assert_eq!(block_on(overridden.promise()), Ok(42));
    /// ```
    pub fn wrap<B>(base: B) -> Self
    where
        B: IntoFuture<Output = Result<T, E>>,
        B::IntoFuture: Send + 'static,
    {
        Deferred {
            state: State::pending(Some(base.into_future().boxed())),
        }
    }

    /// Resolve with the eventual outcome of `future` if still pending.
    ///
    /// The status becomes `Resolved` right away, while the promise waits for
    /// `future` and takes on its outcome, failure included.
    pub fn resolve_with<F>(&self, future: F) -> &Self
    where
        F: IntoFuture<Output = Result<T, E>>,
        F::IntoFuture: Send + 'static,
    {
        self.state
            .settle(Settlement::Adopt(future.into_future().boxed()));
        self
    }
}

impl<T, E> Deferred<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Chain handlers onto the promise, returning a new deferred for their
    /// result.
    ///
    /// `on_succeed` runs with the value, `on_fail` with the error. Whatever
    /// future the handler returns settles the new deferred, which can still
    /// be resolved or rejected directly before that happens.
    pub fn then<U, F, S, R, Fs, Fr>(&self, on_succeed: S, on_fail: R) -> Deferred<U, F>
    where
        U: Send + 'static,
        F: Send + 'static,
        S: FnOnce(T) -> Fs + Send + 'static,
        R: FnOnce(E) -> Fr + Send + 'static,
        Fs: IntoFuture<Output = Result<U, F>>,
        Fs::IntoFuture: Send + 'static,
        Fr: IntoFuture<Output = Result<U, F>>,
        Fr::IntoFuture: Send + 'static,
    {
        let source = self.promise();
        Deferred::wrap(async move {
            match source.await {
                Ok(value) => on_succeed(value).await,
                Err(error) => on_fail(error).await,
            }
        })
    }

    /// `then` without a failure handler: errors pass through unchanged.
    ///
    /// ```
    /// use deferred::Deferred;
    /// use futures::executor::block_on;
    /// use futures::future::ready;
    ///
    /// let deferred = Deferred::<i32, ()>::resolved(10);
    /// let doubled = deferred
    ///     .and_then(|value| ready(Ok(value)))
    ///     .and_then(|value| ready(Ok(value * 2)));
    /// assert_eq!(block_on(doubled.promise()), Ok(20));
    /// ```
    pub fn and_then<U, S, Fs>(&self, on_succeed: S) -> Deferred<U, E>
    where
        U: Send + 'static,
        S: FnOnce(T) -> Fs + Send + 'static,
        Fs: IntoFuture<Output = Result<U, E>>,
        Fs::IntoFuture: Send + 'static,
    {
        self.then(on_succeed, |error| -> Ready<Result<U, E>> { future::err(error) })
    }

    /// `then` without a success handler: values pass through unchanged.
    pub fn catch<F, R, Fr>(&self, on_fail: R) -> Deferred<T, F>
    where
        F: Send + 'static,
        R: FnOnce(E) -> Fr + Send + 'static,
        Fr: IntoFuture<Output = Result<T, F>>,
        Fr::IntoFuture: Send + 'static,
    {
        self.then(|value| -> Ready<Result<T, F>> { future::ok(value) }, on_fail)
    }
}

impl<T, E> Default for Deferred<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> Clone for Deferred<T, E> {
    fn clone(&self) -> Self {
        self.state.acquire_handle();
        Deferred {
            state: self.state.clone(),
        }
    }
}

impl<T, E> Drop for Deferred<T, E> {
    fn drop(&mut self) {
        self.state.release_handle();
    }
}

impl<T, E> From<Result<T, E>> for Deferred<T, E> {
    fn from(outcome: Result<T, E>) -> Self {
        Self::settled(outcome)
    }
}

impl<T, E> fmt::Debug for Deferred<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("status", &self.status())
            .finish()
    }
}

impl<T: Clone, E: Clone> IntoFuture for Deferred<T, E> {
    type Output = Result<T, E>;
    type IntoFuture = Promise<T, E>;

    fn into_future(self) -> Self::IntoFuture {
        self.promise()
    }
}

impl<T: Clone, E: Clone> IntoFuture for &Deferred<T, E> {
    type Output = Result<T, E>;
    type IntoFuture = Promise<T, E>;

    fn into_future(self) -> Self::IntoFuture {
        self.promise()
    }
}
