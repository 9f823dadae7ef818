//! Commit-activity polling.
//!
//! The stats endpoint is a polling protocol smuggled into a plain
//! request/response API: the server may answer "still computing" many times
//! before the weekly series exists. [`ActivityPoller`] is the explicit state
//! machine for that protocol. It is pure, so the attempt ceiling and backoff
//! schedule are testable without HTTP or timers; [`poll`] is the async
//! driver that feeds it probes.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::Result;
use crate::github::ActivityProbe;
use crate::types::CommitActivityWeek;

/// Maximum requests per poll, counting the first.
pub const MAX_ATTEMPTS: u32 = 6;

const BASE_DELAY: Duration = Duration::from_millis(250);

/// Exponential backoff for a 1-based attempt number: 500ms, 1s, 2s, 4s, 8s.
pub fn backoff_delay(attempt: u32) -> Duration {
    BASE_DELAY * 2u32.saturating_pow(attempt)
}

/// What the driver should do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStep {
    /// Wait out the delay, then issue the next request.
    Retry { delay: Duration },
    /// Terminal: the weekly series arrived.
    Ready(Vec<CommitActivityWeek>),
    /// Terminal: attempt ceiling reached while still processing. Callers
    /// treat this as an empty series, never as an error.
    Exhausted,
}

/// State machine for one commit-activity poll.
#[derive(Debug, Default)]
pub struct ActivityPoller {
    attempt: u32,
}

impl ActivityPoller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests issued so far.
    pub fn attempts(&self) -> u32 {
        self.attempt
    }

    /// Feed the outcome of one probe.
    ///
    /// A "processing" answer schedules a retry using the server hint when
    /// present, the exponential schedule otherwise.
    pub fn on_probe(&mut self, probe: ActivityProbe) -> PollStep {
        self.attempt += 1;
        match probe {
            ActivityProbe::Ready(weeks) => PollStep::Ready(weeks),
            ActivityProbe::Processing { retry_after } => {
                if self.attempt >= MAX_ATTEMPTS {
                    PollStep::Exhausted
                } else {
                    PollStep::Retry {
                        delay: retry_after.unwrap_or_else(|| backoff_delay(self.attempt)),
                    }
                }
            }
        }
    }

    /// Feed a transport failure. Transport errors carry no server hint, so
    /// the exponential schedule always applies.
    pub fn on_transport_error(&mut self) -> PollStep {
        self.attempt += 1;
        if self.attempt >= MAX_ATTEMPTS {
            PollStep::Exhausted
        } else {
            PollStep::Retry {
                delay: backoff_delay(self.attempt),
            }
        }
    }
}

/// Drive one poll to a terminal state.
///
/// `probe` issues a single request. Every terminal state yields a (possibly
/// empty) series; no error ever propagates to the caller.
pub async fn poll<F, Fut>(mut probe: F) -> Vec<CommitActivityWeek>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<ActivityProbe>>,
{
    let mut poller = ActivityPoller::new();
    loop {
        let step = match probe().await {
            Ok(outcome) => poller.on_probe(outcome),
            Err(err) => {
                warn!(
                    "commit activity request failed (attempt {}/{}): {}",
                    poller.attempts() + 1,
                    MAX_ATTEMPTS,
                    err
                );
                poller.on_transport_error()
            }
        };
        match step {
            PollStep::Ready(weeks) => {
                debug!("commit activity ready: {} weeks", weeks.len());
                return weeks;
            }
            PollStep::Exhausted => {
                debug!(
                    "commit activity still unavailable after {} attempts; treating as empty",
                    MAX_ATTEMPTS
                );
                return Vec::new();
            }
            PollStep::Retry { delay } => {
                debug!("commit activity not ready; retrying in {:?}", delay);
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    fn week(total: u64) -> CommitActivityWeek {
        CommitActivityWeek {
            week: 1_700_000_000,
            total,
            days: vec![],
        }
    }

    fn processing() -> ActivityProbe {
        ActivityProbe::Processing { retry_after: None }
    }

    #[test]
    fn backoff_schedule_doubles_from_500ms() {
        assert_eq!(backoff_delay(1), Duration::from_millis(500));
        assert_eq!(backoff_delay(2), Duration::from_millis(1000));
        assert_eq!(backoff_delay(3), Duration::from_millis(2000));
        assert_eq!(backoff_delay(5), Duration::from_millis(8000));
    }

    #[test]
    fn ready_is_terminal_on_any_attempt() {
        let mut poller = ActivityPoller::new();
        for _ in 0..MAX_ATTEMPTS - 1 {
            assert!(matches!(poller.on_probe(processing()), PollStep::Retry { .. }));
        }
        // last allowed attempt can still succeed
        match poller.on_probe(ActivityProbe::Ready(vec![week(3)])) {
            PollStep::Ready(weeks) => assert_eq!(weeks.len(), 1),
            other => panic!("expected ready, got {other:?}"),
        }
        assert_eq!(poller.attempts(), MAX_ATTEMPTS);
    }

    #[test]
    fn exhausts_after_max_processing_answers() {
        let mut poller = ActivityPoller::new();
        for _ in 0..MAX_ATTEMPTS - 1 {
            assert!(matches!(poller.on_probe(processing()), PollStep::Retry { .. }));
        }
        assert_eq!(poller.on_probe(processing()), PollStep::Exhausted);
    }

    #[test]
    fn transport_errors_count_against_the_attempt_ceiling() {
        let mut poller = ActivityPoller::new();
        assert!(matches!(poller.on_transport_error(), PollStep::Retry { .. }));
        assert!(matches!(poller.on_probe(processing()), PollStep::Retry { .. }));
        assert!(matches!(poller.on_transport_error(), PollStep::Retry { .. }));
        assert!(matches!(poller.on_probe(processing()), PollStep::Retry { .. }));
        assert!(matches!(poller.on_transport_error(), PollStep::Retry { .. }));
        assert_eq!(poller.on_transport_error(), PollStep::Exhausted);
        assert_eq!(poller.attempts(), MAX_ATTEMPTS);
    }

    #[test]
    fn server_hint_overrides_backoff_schedule() {
        let mut poller = ActivityPoller::new();
        let step = poller.on_probe(ActivityProbe::Processing {
            retry_after: Some(Duration::from_secs(7)),
        });
        assert_eq!(
            step,
            PollStep::Retry {
                delay: Duration::from_secs(7)
            }
        );
    }

    fn scripted(
        responses: Vec<Result<ActivityProbe>>,
    ) -> (
        Arc<Mutex<VecDeque<Result<ActivityProbe>>>>,
        Arc<Mutex<u32>>,
    ) {
        (
            Arc::new(Mutex::new(responses.into())),
            Arc::new(Mutex::new(0)),
        )
    }

    async fn run_poll(
        script: Arc<Mutex<VecDeque<Result<ActivityProbe>>>>,
        calls: Arc<Mutex<u32>>,
    ) -> Vec<CommitActivityWeek> {
        poll(move || {
            let script = Arc::clone(&script);
            let calls = Arc::clone(&calls);
            async move {
                *calls.lock().unwrap() += 1;
                script
                    .lock()
                    .unwrap()
                    .pop_front()
                    .unwrap_or_else(|| Ok(ActivityProbe::Processing { retry_after: None }))
            }
        })
        .await
    }

    #[tokio::test(start_paused = true)]
    async fn returns_series_after_processing_answers() {
        let series: Vec<CommitActivityWeek> = (0..10u64).map(week).collect();
        let (script, calls) = scripted(vec![
            Ok(processing()),
            Ok(processing()),
            Ok(processing()),
            Ok(ActivityProbe::Ready(series.clone())),
        ]);
        let result = run_poll(script, Arc::clone(&calls)).await;
        assert_eq!(result, series);
        assert_eq!(*calls.lock().unwrap(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn all_processing_answers_yield_empty_series() {
        let (script, calls) = scripted((0..MAX_ATTEMPTS).map(|_| Ok(processing())).collect());
        let result = run_poll(script, Arc::clone(&calls)).await;
        assert!(result.is_empty());
        assert_eq!(*calls.lock().unwrap(), MAX_ATTEMPTS);
    }

    #[tokio::test(start_paused = true)]
    async fn never_exceeds_attempt_ceiling_with_mixed_failures() {
        let (script, calls) = scripted(vec![
            Err(Error::Decode("connection reset".into())),
            Ok(processing()),
            Err(Error::Decode("connection reset".into())),
            Ok(processing()),
            Err(Error::Decode("connection reset".into())),
            Ok(processing()),
            // anything past the ceiling must never be requested
            Ok(ActivityProbe::Ready(vec![week(9)])),
        ]);
        let result = run_poll(script, Arc::clone(&calls)).await;
        assert!(result.is_empty());
        assert_eq!(*calls.lock().unwrap(), MAX_ATTEMPTS);
    }

    #[tokio::test(start_paused = true)]
    async fn transport_errors_recover_before_the_ceiling() {
        let (script, calls) = scripted(vec![
            Err(Error::Decode("connection reset".into())),
            Ok(ActivityProbe::Ready(vec![week(2), week(5)])),
        ]);
        let result = run_poll(script, Arc::clone(&calls)).await;
        assert_eq!(result.len(), 2);
        assert_eq!(*calls.lock().unwrap(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_ready_series_is_a_valid_terminal_state() {
        let (script, calls) = scripted(vec![Ok(ActivityProbe::Ready(vec![]))]);
        let result = run_poll(script, Arc::clone(&calls)).await;
        assert!(result.is_empty());
        assert_eq!(*calls.lock().unwrap(), 1);
    }
}
