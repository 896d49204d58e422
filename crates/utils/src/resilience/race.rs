//! Race several candidate operations against a deadline.
//!
//! Candidates run as spawned tasks. The first `Success` wins; when the race
//! resolves, every remaining candidate is aborted and awaited before
//! returning, so nothing keeps running in the background.

use crate::sync::CancellationToken;
use std::future::Future;
use std::time::Duration;
use tether_core::{attributes, Failure, Outcome, SharedSink, EVENT_RACE_RESOLVED};
use tokio::task::JoinSet;
use tokio::time::sleep;

/// Why a race finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resolution {
    Winner,
    AllFailed,
    TimedOut,
    Cancelled,
}

impl Resolution {
    const fn as_str(self) -> &'static str {
        match self {
            Resolution::Winner => "winner",
            Resolution::AllFailed => "all_failed",
            Resolution::TimedOut => "timed_out",
            Resolution::Cancelled => "cancelled",
        }
    }
}

/// Configurable timeout race
#[derive(Clone, Default)]
pub struct TimeoutRace {
    cancellation: Option<CancellationToken>,
    sink: Option<SharedSink>,
}

impl TimeoutRace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = Some(cancellation);
        self
    }

    pub fn with_sink(mut self, sink: SharedSink) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Run `operations` concurrently and return the first success.
    ///
    /// If every candidate finishes without success before `timeout_ms`, the
    /// last failure received is returned (or `InProgress` if all of them
    /// reported progress only). Otherwise a concurrency timeout is returned
    /// once the deadline passes.
    pub async fn run<I, Fut, T>(&self, timeout_ms: u64, operations: I) -> Outcome<T>
    where
        I: IntoIterator<Item = Fut>,
        Fut: Future<Output = Outcome<T>> + Send + 'static,
        T: Send + 'static,
    {
        let mut set = JoinSet::new();
        for operation in operations {
            set.spawn(operation);
        }
        let candidates = set.len();
        if candidates == 0 {
            return Outcome::Error(Failure::invalid_input(
                "operations",
                "race needs at least one operation",
            ));
        }

        let cancellation = self.cancellation.clone().unwrap_or_default();
        let deadline = sleep(Duration::from_millis(timeout_ms));
        tokio::pin!(deadline);

        let mut last_failure: Option<Failure> = None;
        let (outcome, resolution) = loop {
            tokio::select! {
                biased;
                _ = cancellation.cancelled() => {
                    break (Outcome::Error(Failure::cancelled("race")), Resolution::Cancelled);
                }
                joined = set.join_next() => match joined {
                    Some(Ok(Outcome::Success(value))) => {
                        break (Outcome::Success(value), Resolution::Winner);
                    }
                    Some(Ok(Outcome::Error(failure))) => last_failure = Some(failure),
                    Some(Ok(Outcome::InProgress)) => {}
                    Some(Err(join_error)) => last_failure = Some(Failure::from(join_error)),
                    None => {
                        let outcome = match last_failure.take() {
                            Some(failure) => Outcome::Error(failure),
                            None => Outcome::InProgress,
                        };
                        break (outcome, Resolution::AllFailed);
                    }
                },
                _ = &mut deadline => {
                    break (
                        Outcome::Error(Failure::timeout(format!(
                            "no operation succeeded within {timeout_ms}ms"
                        ))),
                        Resolution::TimedOut,
                    );
                }
            }
        };

        let abandoned = set.len();
        // Abort and wait, so no candidate makes progress after we return
        set.shutdown().await;

        tracing::debug!(
            candidates,
            abandoned,
            resolution = resolution.as_str(),
            "Timeout race resolved"
        );
        if let Some(sink) = &self.sink {
            sink.emit(
                EVENT_RACE_RESOLVED,
                &attributes([
                    ("resolution", resolution.as_str().to_string()),
                    ("candidates", candidates.to_string()),
                    ("abandoned", abandoned.to_string()),
                ]),
            );
        }
        outcome
    }
}

/// Run `operations` concurrently and return the first success, or a timeout
/// failure if none succeeds within `timeout_ms`.
pub async fn race_with_timeout<I, Fut, T>(timeout_ms: u64, operations: I) -> Outcome<T>
where
    I: IntoIterator<Item = Fut>,
    Fut: Future<Output = Outcome<T>> + Send + 'static,
    T: Send + 'static,
{
    TimeoutRace::new().run(timeout_ms, operations).await
}
