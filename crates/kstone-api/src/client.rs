// Invoker for the `openstack` CLI
//
// Wraps a `Runner` with argument construction, transient-failure retry and
// output decoding. The client is stateless apart from its retry policy;
// credentials are passed in with every call.

use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::Error;
use crate::invocation::{Format, Invocation};
use crate::output::{self, Record};
use crate::transport::{CommandEnv, Runner};

/// How long to keep retrying transient failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total budget measured from the first attempt. Zero means one attempt.
    pub request_timeout: Duration,
    /// Pause between attempts.
    pub retry_interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(60),
            retry_interval: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            request_timeout: Duration::ZERO,
            retry_interval: Duration::ZERO,
        }
    }
}

/// Blocking client for the `openstack` CLI.
///
/// All methods return decoded stdout; a non-zero exit surfaces as a
/// classified [`Error`].
pub struct CliClient<R> {
    runner: R,
    retry: RetryPolicy,
}

impl<R: Runner> CliClient<R> {
    pub fn new(runner: R, retry: RetryPolicy) -> Self {
        Self { runner, retry }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Run an invocation, retrying transient failures within the policy
    /// budget, and return raw stdout.
    pub fn invoke(&self, invocation: &Invocation, env: &CommandEnv) -> Result<String, Error> {
        let argv = invocation.argv();
        let secrets = invocation.secrets();
        let started = Instant::now();
        let mut attempt: u32 = 1;

        loop {
            debug!(argv = ?invocation.redacted_argv(), attempt, "invoking");
            match self.runner.run(&argv, env).map_err(|e| e.redact(&secrets)) {
                Ok(stdout) => return Ok(stdout),
                Err(err) if err.is_transient() && started.elapsed() < self.retry.request_timeout => {
                    warn!(
                        error = %err,
                        attempt,
                        retry_in = ?self.retry.retry_interval,
                        "transient failure, retrying"
                    );
                    thread::sleep(self.retry.retry_interval);
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Run a `list` invocation and decode its CSV rows.
    pub fn list(&self, invocation: &Invocation, env: &CommandEnv) -> Result<Vec<Record>, Error> {
        debug_assert_eq!(invocation.format(), Some(Format::Csv));
        let stdout = self.invoke(invocation, env)?;
        output::parse_csv(&stdout)
    }

    /// Run a `show` or `create` invocation and decode its shell output.
    ///
    /// `Ok(None)` means the tool printed nothing. A not-found failure is
    /// still returned as an error; deciding what absence means is up to
    /// the caller.
    pub fn show(&self, invocation: &Invocation, env: &CommandEnv) -> Result<Option<Record>, Error> {
        debug_assert_eq!(invocation.format(), Some(Format::Shell));
        let stdout = self.invoke(invocation, env)?;
        Ok(output::parse_shell(&stdout))
    }

    /// Run a `set` or `delete` invocation, discarding stdout.
    pub fn execute(&self, invocation: &Invocation, env: &CommandEnv) -> Result<(), Error> {
        self.invoke(invocation, env).map(|_| ())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use super::*;
    use crate::invocation::{Action, Resource};

    /// Replays a fixed sequence of results and counts calls.
    struct Replay {
        results: RefCell<VecDeque<Result<String, Error>>>,
        calls: RefCell<u32>,
    }

    impl Replay {
        fn new(results: Vec<Result<String, Error>>) -> Self {
            Self {
                results: RefCell::new(results.into()),
                calls: RefCell::new(0),
            }
        }
    }

    impl Runner for Replay {
        fn run(&self, _argv: &[String], _env: &CommandEnv) -> Result<String, Error> {
            *self.calls.borrow_mut() += 1;
            self.results
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Ok(String::new()))
        }
    }

    fn unavailable() -> Error {
        Error::from_failure("openstack domain list", Some(1), "Service Unavailable (HTTP 503)")
    }

    fn quick_retry() -> RetryPolicy {
        RetryPolicy {
            request_timeout: Duration::from_secs(5),
            retry_interval: Duration::ZERO,
        }
    }

    #[test]
    fn retries_transient_failures_until_success() {
        let replay = Replay::new(vec![Err(unavailable()), Err(unavailable()), Ok("ok".into())]);
        let client = CliClient::new(&replay, quick_retry());
        let out = client
            .invoke(&Invocation::new(Resource::Domain, Action::List), &CommandEnv::new())
            .unwrap();
        assert_eq!(out, "ok");
        assert_eq!(*replay.calls.borrow(), 3);
    }

    #[test]
    fn zero_timeout_means_single_attempt() {
        let replay = Replay::new(vec![Err(unavailable()), Ok("never".into())]);
        let client = CliClient::new(&replay, RetryPolicy::none());
        let err = client
            .invoke(&Invocation::new(Resource::Domain, Action::List), &CommandEnv::new())
            .unwrap_err();
        assert!(err.is_transient());
        assert_eq!(*replay.calls.borrow(), 1);
    }

    #[test]
    fn not_found_is_never_retried() {
        let missing = Error::from_failure(
            "openstack user show no_user",
            Some(1),
            "No user with a name or ID of 'no_user' exists.",
        );
        let replay = Replay::new(vec![Err(missing), Ok("never".into())]);
        let client = CliClient::new(&replay, quick_retry());
        let err = client
            .show(
                &Invocation::new(Resource::User, Action::Show).arg("no_user"),
                &CommandEnv::new(),
            )
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(*replay.calls.borrow(), 1);
    }

    #[test]
    fn show_decodes_empty_body_as_none() {
        let replay = Replay::new(vec![Ok("\n".into())]);
        let client = CliClient::new(&replay, RetryPolicy::none());
        let shown = client
            .show(
                &Invocation::new(Resource::Domain, Action::Show).arg("nope"),
                &CommandEnv::new(),
            )
            .unwrap();
        assert!(shown.is_none());
    }
}
