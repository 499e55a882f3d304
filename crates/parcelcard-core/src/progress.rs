/// Sink for batch progress events.
///
/// The core reports counts; rendering (progress bars, logging) is the
/// caller's concern.
pub trait ProgressReporter: Send + Sync {
    /// A phase with `total` items is starting.
    fn begin(&self, _total: u64) {}

    /// One more item finished; `completed` counts monotonically up to
    /// `total`, in completion order.
    fn item_done(&self, _completed: u64, _total: u64) {}

    /// The phase is over.
    fn finish(&self) {}
}

/// Reporter that discards all events.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
