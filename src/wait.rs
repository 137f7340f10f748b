//! Convergence waits for asynchronous platform operations.
//!
//! Most mutations are accepted immediately and finish in the background. A
//! prober reads the current status once; [`wait_for_state`] calls it on a
//! fixed interval until the status reaches a target, hits an error status,
//! or the timeout expires.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::{Instant, sleep};

use crate::error::ProviderError;

/// Status reported for a resource the platform no longer knows about.
pub const NOT_FOUND_STATUS: &str = "null";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10 * 60);
pub const DEFAULT_NOT_FOUND_CHECKS: u32 = 20;

/// Outcome of a single status probe.
#[derive(Debug, Clone, PartialEq)]
pub enum Probe<T> {
    Found { resource: T, status: String },
    NotFound,
}

impl<T> Probe<T> {
    pub fn found(resource: T, status: impl Into<String>) -> Self {
        Probe::Found {
            resource,
            status: status.into(),
        }
    }

    pub fn from_option<F>(resource: Option<T>, status_of: F) -> Self
    where
        F: FnOnce(&T) -> String,
    {
        match resource {
            Some(resource) => {
                let status = status_of(&resource);
                Probe::Found { resource, status }
            }
            None => Probe::NotFound,
        }
    }

    pub fn status(&self) -> &str {
        match self {
            Probe::Found { status, .. } => status,
            Probe::NotFound => NOT_FOUND_STATUS,
        }
    }

    pub fn into_resource(self) -> Option<T> {
        match self {
            Probe::Found { resource, .. } => Some(resource),
            Probe::NotFound => None,
        }
    }
}

/// Pending and target status sets plus timing for one wait.
///
/// A vanished resource only counts as converged when [`NOT_FOUND_STATUS`] is
/// listed in `target`.
#[derive(Debug, Clone)]
pub struct StateChange {
    pub pending: &'static [&'static str],
    pub target: &'static [&'static str],
    pub errors: &'static [&'static str],
    pub interval: Duration,
    pub timeout: Duration,
    pub not_found_checks: u32,
}

impl StateChange {
    pub fn new(pending: &'static [&'static str], target: &'static [&'static str]) -> Self {
        Self {
            pending,
            target,
            errors: &[],
            interval: crate::config::DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
            not_found_checks: DEFAULT_NOT_FOUND_CHECKS,
        }
    }

    pub fn with_errors(mut self, errors: &'static [&'static str]) -> Self {
        self.errors = errors;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_not_found_checks(mut self, checks: u32) -> Self {
        self.not_found_checks = checks;
        self
    }

    fn is_target(&self, status: &str) -> bool {
        self.target.contains(&status)
    }

    fn is_pending(&self, status: &str) -> bool {
        self.pending.contains(&status)
    }

    fn is_error(&self, status: &str) -> bool {
        self.errors.contains(&status)
    }
}

#[derive(Debug, Error)]
pub enum WaitError {
    #[error(
        "timeout while waiting for {id} to become {target} (last status: {last_status}, timeout: {timeout:?})"
    )]
    Timeout {
        id: String,
        target: String,
        last_status: String,
        timeout: Duration,
    },

    #[error("unexpected status '{status}' for {id}, wanted one of: {expected}")]
    UnexpectedState {
        id: String,
        status: String,
        expected: String,
    },

    #[error("{id} reached failure status '{status}'")]
    TerminalState { id: String, status: String },

    #[error("{id} not found after {checks} checks")]
    NotFound { id: String, checks: u32 },
}

/// Polls `probe` until the resource converges.
///
/// The first probe happens immediately, so a resource that is already at a
/// target status costs exactly one call. Returns the converged resource, or
/// `None` when convergence means the resource is gone.
pub async fn wait_for_state<T, F, Fut>(
    id: &str,
    change: &StateChange,
    probe: F,
) -> Result<Option<T>, ProviderError>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<Probe<T>, ProviderError>>,
{
    let deadline = Instant::now() + change.timeout;
    let mut not_found = 0u32;

    loop {
        let result = probe(id.to_string()).await?;
        let status = result.status().to_string();
        tracing::debug!(id, status = %status, "probed status");

        if change.is_target(&status) {
            return Ok(result.into_resource());
        }

        if change.is_error(&status) {
            return Err(WaitError::TerminalState {
                id: id.to_string(),
                status,
            }
            .into());
        }

        let pending = change.is_pending(&status);
        if matches!(result, Probe::NotFound) && !pending {
            not_found += 1;
            if not_found > change.not_found_checks {
                return Err(WaitError::NotFound {
                    id: id.to_string(),
                    checks: change.not_found_checks,
                }
                .into());
            }
        } else if !pending {
            return Err(WaitError::UnexpectedState {
                id: id.to_string(),
                status,
                expected: change
                    .pending
                    .iter()
                    .chain(change.target)
                    .copied()
                    .collect::<Vec<_>>()
                    .join(", "),
            }
            .into());
        } else {
            not_found = 0;
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(WaitError::Timeout {
                id: id.to_string(),
                target: change.target.join("|"),
                last_status: status,
                timeout: change.timeout,
            }
            .into());
        }

        sleep(change.interval.min(deadline - now)).await;
    }
}

/// Issues a mutation and waits for the resource it names to converge.
///
/// The mutation yields the resource id. When it fails nothing is polled.
/// A timeout after an accepted mutation is still an error; the platform may
/// finish the work later.
pub async fn mutate_and_wait<T, M, F, Fut>(
    mutation: M,
    change: &StateChange,
    probe: F,
) -> Result<(String, Option<T>), ProviderError>
where
    M: Future<Output = Result<String, ProviderError>>,
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<Probe<T>, ProviderError>>,
{
    let id = mutation.await?;
    tracing::info!(id = %id, target = ?change.target, "mutation accepted, waiting");
    let converged = wait_for_state(&id, change, probe).await?;
    Ok((id, converged))
}

/// Fixed-backoff retry for operations the platform rejects while another
/// change to the same object is in flight.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub return_codes: &'static [&'static str],
    pub attempts: u32,
    pub backoff: Duration,
}

pub async fn retry_on_return_codes<T, F, Fut>(
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                let retryable = err
                    .return_code()
                    .is_some_and(|code| policy.return_codes.contains(&code.as_str()));
                if !retryable || attempt >= policy.attempts {
                    return Err(err);
                }
                tracing::warn!(attempt, error = %err, "retrying after concurrent change");
                sleep(policy.backoff).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn scripted<'a>(
        script: &'a [&'static str],
        calls: &'a AtomicUsize,
    ) -> impl Fn(String) -> std::future::Ready<Result<Probe<&'static str>, ProviderError>> + 'a
    {
        move |_id| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            let status = script[n.min(script.len() - 1)];
            let probe = if status == NOT_FOUND_STATUS {
                Probe::NotFound
            } else {
                Probe::found(status, status)
            };
            std::future::ready(Ok(probe))
        }
    }

    fn busy_error() -> ProviderError {
        ApiError::Api {
            status: 400,
            body: r#"{"responseError":{"returnCode":"1007052","returnMessage":"busy"}}"#
                .to_string(),
        }
        .into()
    }

    #[tokio::test(start_paused = true)]
    async fn test_converges_after_pending() {
        let calls = AtomicUsize::new(0);
        let change = StateChange::new(&["INIT", "CREATING"], &["RUN"]);
        let result = wait_for_state("vpc-1", &change, scripted(&["INIT", "CREATING", "RUN"], &calls))
            .await
            .unwrap();
        assert_eq!(result, Some("RUN"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_already_converged_probes_once() {
        let calls = AtomicUsize::new(0);
        let change = StateChange::new(&["CREATING"], &["RUN"]);
        let start = Instant::now();
        wait_for_state("vpc-1", &change, scripted(&["RUN"], &calls))
            .await
            .unwrap();
        wait_for_state("vpc-1", &change, scripted(&["RUN"], &calls))
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(Instant::now(), start);
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_found_as_explicit_target() {
        let calls = AtomicUsize::new(0);
        let change = StateChange::new(&["RUN", "TERMTING"], &[NOT_FOUND_STATUS]);
        let result = wait_for_state("vpc-1", &change, scripted(&["TERMTING", "null"], &calls))
            .await
            .unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_found_is_not_inferred_as_success() {
        let calls = AtomicUsize::new(0);
        let change = StateChange::new(&["CREATING"], &["RUN"]).with_not_found_checks(2);
        let err = wait_for_state("vpc-1", &change, scripted(&["null"], &calls))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ProviderError::Wait(WaitError::NotFound { checks: 2, .. })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_names_last_status() {
        let calls = AtomicUsize::new(0);
        let change = StateChange::new(&["CREATING"], &["RUN"])
            .with_interval(Duration::from_secs(3))
            .with_timeout(Duration::from_secs(10));
        let err = wait_for_state("vpc-9", &change, scripted(&["CREATING"], &calls))
            .await
            .unwrap_err();
        match err {
            ProviderError::Wait(WaitError::Timeout {
                id, last_status, ..
            }) => {
                assert_eq!(id, "vpc-9");
                assert_eq!(last_status, "CREATING");
            }
            other => panic!("expected timeout, got {:?}", other),
        }
        // probes at 0s, 3s, 6s, 9s and at the 10s deadline
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_status_is_terminal() {
        let calls = AtomicUsize::new(0);
        let change = StateChange::new(&["CREATING"], &["RUNNING"]).with_errors(&["ERROR"]);
        let err = wait_for_state("cluster-1", &change, scripted(&["CREATING", "ERROR"], &calls))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "cluster-1 reached failure status 'ERROR'");
    }

    #[tokio::test(start_paused = true)]
    async fn test_unexpected_status() {
        let calls = AtomicUsize::new(0);
        let change = StateChange::new(&["CREATING"], &["RUN"]);
        let err = wait_for_state("vpc-1", &change, scripted(&["STOPPED"], &calls))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "unexpected status 'STOPPED' for vpc-1, wanted one of: CREATING, RUN"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_error_propagates() {
        let change = StateChange::new(&["CREATING"], &["RUN"]);
        let result: Result<Option<()>, _> = wait_for_state("vpc-1", &change, |_id| async {
            Err(ProviderError::Config("boom".to_string()))
        })
        .await;
        assert!(matches!(result, Err(ProviderError::Config(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_mutation_failure_skips_poll() {
        let calls = AtomicUsize::new(0);
        let change = StateChange::new(&["CREATING"], &["RUN"]);
        let result = mutate_and_wait(
            async { Err(ProviderError::Config("rejected".to_string())) },
            &change,
            scripted(&["RUN"], &calls),
        )
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mutation_then_converge() {
        let calls = AtomicUsize::new(0);
        let change = StateChange::new(&["CREATING"], &["RUN"]);
        let (id, resource) = mutate_and_wait(
            async { Ok("vpc-42".to_string()) },
            &change,
            scripted(&["CREATING", "RUN"], &calls),
        )
        .await
        .unwrap();
        assert_eq!(id, "vpc-42");
        assert_eq!(resource, Some("RUN"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_on_matching_return_code() {
        let calls = AtomicUsize::new(0);
        let policy = RetryPolicy {
            return_codes: &["1007052"],
            attempts: 5,
            backoff: Duration::from_secs(2),
        };
        let result = retry_on_return_codes(&policy, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move { if n < 2 { Err(busy_error()) } else { Ok(n) } }
        })
        .await
        .unwrap();
        assert_eq!(result, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_gives_up_after_attempts() {
        let calls = AtomicUsize::new(0);
        let policy = RetryPolicy {
            return_codes: &["1007052"],
            attempts: 3,
            backoff: Duration::from_secs(2),
        };
        let result: Result<(), _> = retry_on_return_codes(&policy, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(busy_error()) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_does_not_retry_other_errors() {
        let calls = AtomicUsize::new(0);
        let policy = RetryPolicy {
            return_codes: &["1007052"],
            attempts: 5,
            backoff: Duration::from_secs(2),
        };
        let result: Result<(), _> = retry_on_return_codes(&policy, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ProviderError::Config("nope".to_string())) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
