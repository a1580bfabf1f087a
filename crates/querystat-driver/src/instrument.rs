//! Generic connection instrumentation.

use std::error::Error as StdError;
use std::future::Future;
use std::sync::OnceLock;
use std::time::Instant;

use querystat_core::{QueryObserver, RowCounts, SharedObserver};

/// A connection with an optional, one-time registered observer.
///
/// Registration is idempotent: once an observer is attached every later
/// `register` call is ignored, so a dispatch is never reported twice.
pub struct Instrumented<C> {
    inner: C,
    observer: OnceLock<SharedObserver>,
}

impl<C> Instrumented<C> {
    /// Wrap a connection without an observer.
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            observer: OnceLock::new(),
        }
    }

    /// Attach `observer`. Returns `false` if one was already attached.
    pub fn register(&self, observer: SharedObserver) -> bool {
        match self.observer.set(observer) {
            Ok(()) => {
                tracing::debug!("query observer registered");
                true
            }
            Err(_) => {
                tracing::debug!("query observer already registered, ignoring");
                false
            }
        }
    }

    /// Whether an observer is attached.
    pub fn is_instrumented(&self) -> bool {
        self.observer.get().is_some()
    }

    /// The attached observer.
    pub fn observer(&self) -> Option<&SharedObserver> {
        self.observer.get()
    }

    /// Access the wrapped connection. Calls made directly are not reported.
    pub fn inner(&self) -> &C {
        &self.inner
    }

    /// Unwrap the connection.
    pub fn into_inner(self) -> C {
        self.inner
    }

    /// Run `op` as one reported dispatch of `query`.
    ///
    /// `rows` extracts row counts from a successful result. The result of
    /// `op` is returned unchanged.
    pub fn dispatch<T, E, F, R>(&self, query: &str, op: F, rows: R) -> Result<T, E>
    where
        F: FnOnce(&C) -> Result<T, E>,
        R: FnOnce(&T) -> RowCounts,
        E: StdError,
    {
        let Some(observer) = self.observer.get() else {
            return op(&self.inner);
        };

        let guard = DispatchGuard::start(&**observer, query);
        let result = op(&self.inner);
        match &result {
            Ok(value) => guard.succeed(rows(value)),
            Err(error) => guard.fail(error),
        }
        result
    }

    /// Async variant of [`dispatch`](Self::dispatch).
    ///
    /// If the returned future is dropped before `op` resolves, the dispatch is
    /// reported as abandoned so the in-flight gauge does not leak.
    pub async fn dispatch_async<'a, T, E, F, Fut, R>(
        &'a self,
        query: &str,
        op: F,
        rows: R,
    ) -> Result<T, E>
    where
        F: FnOnce(&'a C) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        R: FnOnce(&T) -> RowCounts,
        E: StdError,
    {
        let Some(observer) = self.observer.get() else {
            return op(&self.inner).await;
        };

        let guard = DispatchGuard::start(&**observer, query);
        let result = op(&self.inner).await;
        match &result {
            Ok(value) => guard.succeed(rows(value)),
            Err(error) => guard.fail(error),
        }
        result
    }
}

impl<C: std::fmt::Debug> std::fmt::Debug for Instrumented<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instrumented")
            .field("inner", &self.inner)
            .field("instrumented", &self.is_instrumented())
            .finish()
    }
}

/// One in-flight dispatch.
///
/// Created with `on_query` already reported. Completing consumes the guard,
/// so a dispatch can complete at most once; dropping it uncompleted reports
/// `on_abandoned`.
pub struct DispatchGuard<'a> {
    observer: &'a dyn QueryObserver,
    query: &'a str,
    started: Instant,
    completed: bool,
}

impl<'a> DispatchGuard<'a> {
    /// Report the start of a dispatch.
    pub fn start(observer: &'a dyn QueryObserver, query: &'a str) -> Self {
        observer.on_query();
        Self {
            observer,
            query,
            started: Instant::now(),
            completed: false,
        }
    }

    /// Wall-clock milliseconds since the dispatch started.
    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    /// Report success.
    pub fn succeed(mut self, rows: RowCounts) {
        self.completed = true;
        self.observer.on_result(self.query, self.elapsed_ms(), rows);
    }

    /// Report failure.
    pub fn fail(mut self, error: &dyn StdError) {
        self.completed = true;
        self.observer.on_error(self.query, self.elapsed_ms(), error);
    }
}

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        if !self.completed {
            self.observer.on_abandoned();
        }
    }
}
