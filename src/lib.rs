//! A deferred is a future whose `resolve`/`reject` controls live outside the
//! code that produces the value.
//!
//! Create a [`Deferred`], hand its [`Promise`] to whoever waits for the
//! value, and settle it from anywhere holding the deferred (or one of its
//! clones). Settlement happens once: the first `resolve` or `reject` wins
//! and every later call is a silent no-op.
//!
//! ```
//! use deferred::{Deferred, Status};
//! use futures::executor::block_on;
//! use std::thread;
//!
//! let deferred = Deferred::<String, String>::new();
//! let promise = deferred.promise();
//!
//! let waiter = thread::spawn(move || block_on(promise));
//! deferred.resolve("🍓".into());
//! deferred.reject("ignored".into());
//!
//! assert_eq!(deferred.status(), Status::Resolved);
//! assert_eq!(waiter.join().expect("The waiter thread has panicked."), Ok("🍓".into()));
//! ```
//!
//! The crate runs nothing on its own. Futures a deferred depends on (a
//! wrapped base future, a future passed to `resolve_with`, `then` handlers)
//! make progress when somebody polls the promise.
mod deferred;
mod promise;
mod state;
mod status;

pub use deferred::Deferred;
pub use promise::Promise;
pub use status::Status;

use thiserror::Error;

/// Why [`Promise::try_outcome`] has no outcome to report.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error("the deferred has not settled yet")]
    Pending,
    #[error("every deferred handle was dropped before it settled")]
    Abandoned,
}
