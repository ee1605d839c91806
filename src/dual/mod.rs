//! Dual-mode operations.
//!
//! A [`DualFn`] pairs a blocking implementation with a suspending one behind a
//! single contract `A -> Result<T, E>`. Which one runs is decided at the call
//! site:
//!
//! ```no_run
//! # async fn demo() -> std::io::Result<()> {
//! use dualfs::fs;
//! use dualfs::options::Encoding;
//!
//! let text = fs::read_file("Cargo.toml", Encoding::Utf8).await?; // suspending
//! let same = fs::read_file("Cargo.toml", Encoding::Utf8).sync()?; // blocking
//! assert_eq!(text, same);
//! # Ok(())
//! # }
//! ```
//!
//! Operations can also be written once as a body generic over [`Mode`] with
//! [`DualFn::compose`]. Inside the body, other dual calls are awaited with
//! [`DualCall::run`], which keeps them in the caller's mode. In blocking mode
//! every nested call resolves on its first poll, so [`DualFn::sync`] drives
//! the whole body on the calling thread without an executor.

mod driver;

use std::fmt;
use std::future::IntoFuture;
use std::io;

use futures::future::{BoxFuture, FutureExt};
use tracing::{trace, warn};

use crate::error::DualError;

/// Execution model a dual call runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Runs to completion on the calling thread.
    Blocking,
    /// Returns a future that yields to the async runtime.
    Suspending,
}

/// The two implementations of one logical operation.
pub struct Impls<A, T, E = io::Error> {
    pub blocking: fn(A) -> Result<T, E>,
    pub suspending: fn(A) -> BoxFuture<'static, Result<T, E>>,
}

impl<A, T, E> Clone for Impls<A, T, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<A, T, E> Copy for Impls<A, T, E> {}

type Body<A, T, E> = fn(Mode, A) -> BoxFuture<'static, Result<T, E>>;

enum Imp<A, T, E> {
    Pair(Impls<A, T, E>),
    Composed(Body<A, T, E>),
}

impl<A, T, E> Clone for Imp<A, T, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<A, T, E> Copy for Imp<A, T, E> {}

/// One operation callable in either [`Mode`].
///
/// Holds only function pointers, so it is `Copy`, `Send + Sync` and can be
/// built in a `static`.
pub struct DualFn<A, T, E = io::Error> {
    name: &'static str,
    imp: Imp<A, T, E>,
}

impl<A, T, E> Clone for DualFn<A, T, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<A, T, E> Copy for DualFn<A, T, E> {}

impl<A, T, E> fmt::Debug for DualFn<A, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.imp {
            Imp::Pair(_) => "pair",
            Imp::Composed(_) => "composed",
        };
        f.debug_struct("DualFn")
            .field("name", &self.name)
            .field("kind", &kind)
            .finish()
    }
}

impl<A, T, E> DualFn<A, T, E> {
    /// Builds an operation from an explicit blocking/suspending pair.
    pub const fn new(name: &'static str, impls: Impls<A, T, E>) -> Self {
        Self {
            name,
            imp: Imp::Pair(impls),
        }
    }

    /// Builds an operation from one body that is told which mode it runs in.
    ///
    /// The body must only await dual calls run in the given mode; anything
    /// that stays pending makes [`DualFn::sync`] fail with
    /// [`DualError::SuspendedInBlockingMode`].
    pub const fn compose(name: &'static str, body: Body<A, T, E>) -> Self {
        Self {
            name,
            imp: Imp::Composed(body),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Runs the blocking implementation on the calling thread.
    pub fn sync(&self, args: A) -> Result<T, E>
    where
        E: From<DualError>,
    {
        trace!(op = self.name, mode = ?Mode::Blocking, "dispatch");
        match self.imp {
            Imp::Pair(impls) => (impls.blocking)(args),
            Imp::Composed(body) => match driver::poll_once(body(Mode::Blocking, args)) {
                Some(result) => result,
                None => {
                    warn!(op = self.name, "composed body suspended in blocking mode");
                    Err(DualError::SuspendedInBlockingMode { op: self.name }.into())
                }
            },
        }
    }
}

impl<A, T, E> DualFn<A, T, E>
where
    A: Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    /// Runs the suspending implementation.
    pub fn call(&self, args: A) -> BoxFuture<'static, Result<T, E>> {
        self.run(Mode::Suspending, args)
    }

    /// Returns a future running the implementation for `mode`.
    ///
    /// In [`Mode::Blocking`] the future does the blocking work when first
    /// polled and is ready immediately afterwards.
    pub fn run(&self, mode: Mode, args: A) -> BoxFuture<'static, Result<T, E>> {
        trace!(op = self.name, ?mode, "dispatch");
        match (self.imp, mode) {
            (Imp::Pair(impls), Mode::Suspending) => (impls.suspending)(args),
            (Imp::Pair(impls), Mode::Blocking) => {
                let blocking = impls.blocking;
                async move { blocking(args) }.boxed()
            }
            (Imp::Composed(body), mode) => body(mode, args),
        }
    }

    /// Binds arguments, leaving the mode to the call site.
    pub fn bind(&self, args: A) -> DualCall<A, T, E> {
        DualCall { op: *self, args }
    }
}

/// An operation with its arguments bound.
///
/// `.await` runs it suspending, [`DualCall::sync`] runs it blocking.
#[must_use = "dual calls do nothing unless awaited or run with `.sync()`"]
pub struct DualCall<A, T, E = io::Error> {
    op: DualFn<A, T, E>,
    args: A,
}

impl<A, T, E> DualCall<A, T, E> {
    pub fn op(&self) -> &DualFn<A, T, E> {
        &self.op
    }

    pub fn sync(self) -> Result<T, E>
    where
        E: From<DualError>,
    {
        self.op.sync(self.args)
    }
}

impl<A, T, E> DualCall<A, T, E>
where
    A: Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    /// Runs in the given mode; used inside composed bodies.
    pub fn run(self, mode: Mode) -> BoxFuture<'static, Result<T, E>> {
        self.op.run(mode, self.args)
    }
}

impl<A, T, E> IntoFuture for DualCall<A, T, E>
where
    A: Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    type Output = Result<T, E>;
    type IntoFuture = BoxFuture<'static, Result<T, E>>;

    fn into_future(self) -> Self::IntoFuture {
        self.op.call(self.args)
    }
}
