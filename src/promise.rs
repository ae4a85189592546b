use crate::state::State;
use crate::{Error, Status};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

/// The future side of a [`Deferred`](crate::Deferred).
///
/// A promise can have many consumers: clones share one outcome and each
/// of them resolves to its own copy of it, which is why awaiting needs
/// `T: Clone` and `E: Clone`.
///
/// # Examples
///
/// ```
/// use deferred::Deferred;
/// use futures::executor::block_on;
/// use std::thread;
///
/// let deferred = Deferred::<String, ()>::new();
/// let promise = deferred.promise();
/// let promise2 = promise.clone();
/// let task1 = thread::spawn(move || block_on(promise));
/// let task2 = thread::spawn(move || block_on(promise2));
/// deferred.resolve("Hi".into());
/// assert_eq!(task1.join().expect("The task1 thread has panicked."), Ok("Hi".into()));
/// assert_eq!(task2.join().expect("The task2 thread has panicked."), Ok("Hi".into()));
/// ```
pub struct Promise<T, E> {
    state: Arc<State<T, E>>,
}

impl<T, E> Promise<T, E> {
    pub(crate) fn new(state: Arc<State<T, E>>) -> Self {
        Promise { state }
    }

    /// Status of the deferred this promise belongs to.
    pub fn status(&self) -> Status {
        self.state.status()
    }

    /// Outcome if it is already known, without waiting or driving anything.
    ///
    /// Returns [`Error::Pending`] while nothing is known yet (this includes a
    /// deferred resolved with a future that has not completed), and
    /// [`Error::Abandoned`] once every `Deferred` handle was dropped with
    /// nothing left that could settle it.
    pub fn try_outcome(&self) -> Result<Result<T, E>, Error>
    where
        T: Clone,
        E: Clone,
    {
        self.state.try_outcome()
    }
}

impl<T, E> Clone for Promise<T, E> {
    fn clone(&self) -> Self {
        Promise {
            state: self.state.clone(),
        }
    }
}

impl<T, E> fmt::Debug for Promise<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Promise")
            .field("status", &self.status())
            .finish()
    }
}

impl<T: Clone, E: Clone> Future for Promise<T, E> {
    type Output = Result<T, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.state.poll_outcome(cx)
    }
}
