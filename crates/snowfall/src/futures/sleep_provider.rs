use core::{future::Future, time::Duration};

/// A trait that abstracts over how to sleep for a given [`Duration`] in async
/// contexts.
///
/// This keeps the async helpers independent of any particular runtime.
pub trait SleepProvider {
    /// Returns a future that completes after roughly `dur`.
    ///
    /// The future must be `Send` so generation futures can move across
    /// threads.
    fn sleep_for(dur: Duration) -> impl Future<Output = ()> + Send;
}
