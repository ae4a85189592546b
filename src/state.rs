//! Shared settlement state behind a [`Deferred`](crate::Deferred) and every
//! [`Promise`](crate::Promise) handed out from it.
//!
//! All settlement, from direct `resolve`/`reject` calls or from a wrapped
//! base future completing, goes through [`State::settle`]. The check of
//! `Pending` and the transition happen under one lock, so the first writer
//! wins no matter which thread or source it comes from.
//!
//! The state never spawns anything. Futures it has to observe (a wrapped
//! base future, a future adopted by `resolve_with`) are kept as a [`Source`]
//! and polled by whichever consumer polls the promise next.
use crate::{Error, Status};
use futures::future::BoxFuture;
use futures::task::{self, ArcWake};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll, Waker};
use tracing::{debug, trace};

pub(crate) type Outcome<T, E> = Result<T, E>;

/// A future the state is waiting on.
pub(crate) enum Source<T, E> {
    /// Wrapped base future. Its outcome still has to pass the `Pending` guard.
    Base(BoxFuture<'static, Outcome<T, E>>),
    /// Future adopted by `resolve_with`. The status is already `Resolved`.
    Adopted(BoxFuture<'static, Outcome<T, E>>),
}

impl<T, E> Source<T, E> {
    fn poll(&mut self, cx: &mut Context<'_>) -> Poll<Outcome<T, E>> {
        match self {
            Source::Base(future) | Source::Adopted(future) => future.as_mut().poll(cx),
        }
    }
}

/// What a settlement call carries into the state.
pub(crate) enum Settlement<T, E> {
    Value(Outcome<T, E>),
    Adopt(BoxFuture<'static, Outcome<T, E>>),
}

impl<T, E> Settlement<T, E> {
    fn status(&self) -> Status {
        match self {
            Settlement::Value(Ok(_)) | Settlement::Adopt(_) => Status::Resolved,
            Settlement::Value(Err(_)) => Status::Rejected,
        }
    }
}

struct Inner<T, E> {
    status: Status,
    outcome: Option<Outcome<T, E>>,
    source: Option<Source<T, E>>,
    // A consumer has taken `source` out to poll it.
    driving: bool,
    // Live `Deferred` handles.
    handles: usize,
    abandoned: bool,
}

impl<T, E> Inner<T, E> {
    /// Guarded transition out of `Pending`.
    ///
    /// On success returns the displaced base source, on failure hands the
    /// settlement back. Either way the caller drops it after unlocking.
    fn settle(
        &mut self,
        settlement: Settlement<T, E>,
    ) -> Result<Option<Source<T, E>>, Settlement<T, E>> {
        if !self.status.is_pending() {
            return Err(settlement);
        }
        self.status = settlement.status();
        let displaced = self.source.take();
        match settlement {
            Settlement::Value(outcome) => self.outcome = Some(outcome),
            Settlement::Adopt(future) => self.source = Some(Source::Adopted(future)),
        }
        Ok(displaced)
    }
}

/// Wakers of every consumer waiting on the promise.
///
/// It is also the waker sources are polled with, so progress made by a
/// source reaches all consumers, not only the one that happened to drive it.
#[derive(Debug, Default)]
struct Wakers {
    list: Mutex<Vec<Waker>>,
}

impl Wakers {
    fn register(&self, waker: &Waker) {
        let mut list = lock(&self.list);
        if !list.iter().any(|registered| registered.will_wake(waker)) {
            list.push(waker.clone());
        }
    }

    fn wake_all(&self) {
        let drained: Vec<Waker> = lock(&self.list).drain(..).collect();
        for waker in drained {
            waker.wake();
        }
    }
}

impl ArcWake for Wakers {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        arc_self.wake_all();
    }
}

pub(crate) struct State<T, E> {
    inner: Mutex<Inner<T, E>>,
    wakers: Arc<Wakers>,
}

fn lock<G>(mutex: &Mutex<G>) -> MutexGuard<'_, G> {
    // Poisoning is ignored: every critical section leaves the data consistent.
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T, E> State<T, E> {
    fn with(inner: Inner<T, E>) -> Arc<Self> {
        Arc::new(State {
            inner: Mutex::new(inner),
            wakers: Arc::new(Wakers::default()),
        })
    }

    pub(crate) fn pending(base: Option<BoxFuture<'static, Outcome<T, E>>>) -> Arc<Self> {
        Self::with(Inner {
            status: Status::Pending,
            outcome: None,
            source: base.map(Source::Base),
            driving: false,
            handles: 1,
            abandoned: false,
        })
    }

    pub(crate) fn settled(outcome: Outcome<T, E>) -> Arc<Self> {
        let status = if outcome.is_ok() {
            Status::Resolved
        } else {
            Status::Rejected
        };
        Self::with(Inner {
            status,
            outcome: Some(outcome),
            source: None,
            driving: false,
            handles: 1,
            abandoned: false,
        })
    }

    fn lock(&self) -> MutexGuard<'_, Inner<T, E>> {
        lock(&self.inner)
    }

    pub(crate) fn status(&self) -> Status {
        self.lock().status
    }

    /// First-writer-wins settlement. Returns whether this call settled.
    pub(crate) fn settle(&self, settlement: Settlement<T, E>) -> bool {
        let attempted = settlement.status();
        let mut inner = self.lock();
        let result = inner.settle(settlement);
        let current = inner.status;
        drop(inner);
        match result {
            Ok(_displaced) => {
                trace!(status = %current, "deferred settled");
                self.wakers.wake_all();
                true
            }
            Err(_ignored) => {
                trace!(status = %current, %attempted, "deferred already settled, ignoring");
                false
            }
        }
    }

    pub(crate) fn acquire_handle(&self) {
        self.lock().handles += 1;
    }

    pub(crate) fn release_handle(&self) {
        let mut inner = self.lock();
        inner.handles = inner.handles.saturating_sub(1);
        let abandoned = inner.handles == 0
            && inner.status.is_pending()
            && inner.source.is_none()
            && !inner.driving;
        if abandoned {
            inner.abandoned = true;
        }
        drop(inner);
        if abandoned {
            debug!("deferred dropped while pending, its promise can no longer settle");
            self.wakers.wake_all();
        }
    }

    /// Outcome without polling any source.
    pub(crate) fn try_outcome(&self) -> Result<Outcome<T, E>, Error>
    where
        T: Clone,
        E: Clone,
    {
        let inner = self.lock();
        match &inner.outcome {
            Some(outcome) => Ok(outcome.clone()),
            None if inner.abandoned => Err(Error::Abandoned),
            None => Err(Error::Pending),
        }
    }

    /// Poll for the outcome, driving the pending source if there is one.
    pub(crate) fn poll_outcome(&self, cx: &mut Context<'_>) -> Poll<Outcome<T, E>>
    where
        T: Clone,
        E: Clone,
    {
        loop {
            let mut source = {
                let mut inner = self.lock();
                if let Some(outcome) = &inner.outcome {
                    return Poll::Ready(outcome.clone());
                }
                // Registered under the state lock, so a settlement that lands
                // after the check above always finds this waker.
                self.wakers.register(cx.waker());
                match inner.source.take() {
                    Some(source) => {
                        inner.driving = true;
                        source
                    }
                    None => return Poll::Pending,
                }
            };

            let waker = task::waker(self.wakers.clone());
            match source.poll(&mut Context::from_waker(&waker)) {
                Poll::Ready(outcome) => self.finish(source, outcome),
                Poll::Pending => {
                    self.restore(source);
                    return Poll::Pending;
                }
            }
        }
    }

    fn finish(&self, source: Source<T, E>, outcome: Outcome<T, E>) {
        let mut inner = self.lock();
        inner.driving = false;
        match source {
            Source::Base(_) => {
                let result = inner.settle(Settlement::Value(outcome));
                let current = inner.status;
                drop(inner);
                match result {
                    Ok(_displaced) => {
                        trace!(status = %current, "deferred settled by base future");
                        self.wakers.wake_all();
                    }
                    Err(_ignored) => {
                        trace!(status = %current, "base future settled late, discarding outcome");
                    }
                }
            }
            Source::Adopted(_) => {
                inner.outcome = Some(outcome);
                drop(inner);
                trace!("adopted future settled");
                self.wakers.wake_all();
            }
        }
    }

    fn restore(&self, source: Source<T, E>) {
        let mut inner = self.lock();
        inner.driving = false;
        // Base futures are dropped once the deferred has settled.
        let keep = inner.source.is_none()
            && (matches!(source, Source::Adopted(_)) || inner.status.is_pending());
        let stale = if keep {
            inner.source = Some(source);
            None
        } else {
            Some(source)
        };
        drop(inner);
        drop(stale);
    }
}
