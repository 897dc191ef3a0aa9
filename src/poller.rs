//! ReadinessPoller: asks the server whether a node's results are in yet.
//!
//! A "not ready" answer is retried after a fixed interval. Probe errors are
//! either retried with capped exponential backoff or end the loop, depending
//! on `ErrorPolicy`. An optional attempt cap turns an endless wait into
//! `WatchError::PollTimeout`.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::NodeId;
use crate::error::{Result, WatchError};
use crate::transport::AuditApi;

/// What to do when a readiness probe itself fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Keep probing, backing off between failures.
    #[default]
    Retry,
    /// Give up on the first failed probe. The node stays pending.
    Stop,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: Option<u32>,
    pub max_backoff: Duration,
    pub on_error: ErrorPolicy,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(2000),
            max_attempts: Some(150),
            max_backoff: Duration::from_secs(30),
            on_error: ErrorPolicy::Retry,
        }
    }
}

impl PollPolicy {
    /// Delay after the `streak`-th consecutive probe error (1-based).
    pub fn backoff(&self, streak: u32) -> Duration {
        let factor = 2u32.saturating_pow(streak.saturating_sub(1));
        self.interval
            .checked_mul(factor)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Unchecked,
    Pending,
    Ready,
}

pub struct ReadinessPoller<'a, A: AuditApi + ?Sized> {
    api: &'a A,
    node: &'a NodeId,
    policy: &'a PollPolicy,
    state: Readiness,
    attempts: u32,
}

impl<'a, A: AuditApi + ?Sized> ReadinessPoller<'a, A> {
    pub fn new(api: &'a A, node: &'a NodeId, policy: &'a PollPolicy) -> Self {
        Self {
            api,
            node,
            policy,
            state: Readiness::Unchecked,
            attempts: 0,
        }
    }

    pub fn state(&self) -> Readiness {
        self.state
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Issue one probe. Ready is terminal: once reached no further probes go out.
    pub async fn check_ready(&mut self) -> Result<bool> {
        if self.state == Readiness::Ready {
            return Ok(true);
        }
        self.attempts += 1;
        let ready = self.api.check_ready(self.node).await?;
        self.state = if ready {
            Readiness::Ready
        } else {
            Readiness::Pending
        };
        Ok(ready)
    }

    /// Probe until the node is ready.
    ///
    /// Cancellation is the caller's job: drop the future (e.g. from a
    /// `tokio::select!` against a cancellation token).
    pub async fn run(&mut self) -> Result<()> {
        let mut error_streak = 0u32;
        loop {
            let delay = match self.check_ready().await {
                Ok(true) => {
                    debug!(node = %self.node, attempts = self.attempts, "node ready");
                    return Ok(());
                }
                Ok(false) => {
                    error_streak = 0;
                    self.policy.interval
                }
                Err(e) => {
                    if self.policy.on_error == ErrorPolicy::Stop {
                        return Err(e);
                    }
                    error_streak += 1;
                    let delay = self.policy.backoff(error_streak);
                    warn!(
                        node = %self.node,
                        attempt = self.attempts,
                        retry_in_ms = delay.as_millis() as u64,
                        error = %e,
                        "readiness probe failed"
                    );
                    delay
                }
            };

            if let Some(max) = self.policy.max_attempts {
                if self.attempts >= max {
                    return Err(WatchError::PollTimeout {
                        node: self.node.clone(),
                        attempts: self.attempts,
                    });
                }
            }

            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::fake::{poll_error, FakeApi};
    use tokio::time::Instant;

    fn policy(on_error: ErrorPolicy, max_attempts: Option<u32>) -> PollPolicy {
        PollPolicy {
            on_error,
            max_attempts,
            ..Default::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn waits_fixed_interval_between_not_ready_answers() {
        let api = FakeApi::with_nodes(&["n1"]).script("n1", vec![Ok(false), Ok(false), Ok(false)]);
        let node = NodeId::from("n1");
        let policy = PollPolicy::default();
        let mut poller = ReadinessPoller::new(&api, &node, &policy);
        assert_eq!(poller.state(), Readiness::Unchecked);

        let start = Instant::now();
        poller.run().await.unwrap();

        assert_eq!(poller.state(), Readiness::Ready);
        assert_eq!(poller.attempts(), 4);
        assert_eq!(start.elapsed(), Duration::from_millis(6000));
    }

    #[tokio::test(start_paused = true)]
    async fn ready_on_first_probe_does_not_sleep() {
        let api = FakeApi::with_nodes(&["n1"]);
        let node = NodeId::from("n1");
        let policy = PollPolicy::default();
        let mut poller = ReadinessPoller::new(&api, &node, &policy);

        let start = Instant::now();
        poller.run().await.unwrap();
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(api.probes_for("n1"), 1);

        // Ready is terminal.
        assert!(poller.check_ready().await.unwrap());
        assert_eq!(api.probes_for("n1"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_policy_gives_up_on_first_error() {
        let api = FakeApi::with_nodes(&["n1"])
            .script("n1", vec![Ok(false), Err(poll_error("n1")), Ok(true)]);
        let node = NodeId::from("n1");
        let policy = policy(ErrorPolicy::Stop, None);
        let mut poller = ReadinessPoller::new(&api, &node, &policy);

        let err = poller.run().await.unwrap_err();
        assert_eq!(err.kind(), "poll");
        assert_eq!(poller.state(), Readiness::Pending);
        assert_eq!(api.probes_for("n1"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_policy_backs_off_after_errors() {
        let api = FakeApi::with_nodes(&["n1"]).script(
            "n1",
            vec![
                Err(poll_error("n1")),
                Err(poll_error("n1")),
                Ok(false),
                Err(poll_error("n1")),
            ],
        );
        let node = NodeId::from("n1");
        let policy = policy(ErrorPolicy::Retry, None);
        let mut poller = ReadinessPoller::new(&api, &node, &policy);

        let start = Instant::now();
        poller.run().await.unwrap();

        // 2s + 4s after the first two errors, 2s after "false",
        // then the streak restarts at 2s.
        assert_eq!(start.elapsed(), Duration::from_secs(10));
        assert_eq!(poller.attempts(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn attempt_cap_times_out() {
        let api = FakeApi::with_nodes(&["n1"]).script("n1", (0..10).map(|_| Ok(false)).collect());
        let node = NodeId::from("n1");
        let policy = policy(ErrorPolicy::Retry, Some(3));
        let mut poller = ReadinessPoller::new(&api, &node, &policy);

        match poller.run().await {
            Err(WatchError::PollTimeout { attempts, .. }) => assert_eq!(attempts, 3),
            other => panic!("expected timeout, got {other:?}"),
        }
        assert_eq!(api.probes_for("n1"), 3);
    }

    #[test]
    fn backoff_doubles_up_to_cap() {
        let policy = PollPolicy {
            interval: Duration::from_secs(2),
            max_backoff: Duration::from_secs(30),
            ..Default::default()
        };
        let delays: Vec<u64> = (1..=6).map(|n| policy.backoff(n).as_secs()).collect();
        assert_eq!(delays, [2, 4, 8, 16, 30, 30]);
        assert_eq!(policy.backoff(200), Duration::from_secs(30));
    }
}
