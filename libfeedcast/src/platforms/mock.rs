//! In-process platform for tests
//!
//! `MockPlatform` never touches the network. It can reject its credentials,
//! fail a chosen post, or add latency, and it keeps a log of every message
//! that went out. It is compiled into every build so integration tests in
//! `tests/` can use it.

use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::sleep;

use crate::error::{PlatformError, Result};
use crate::platforms::Platform;

/// Scripted behavior for a [`MockPlatform`]
#[derive(Debug, Clone)]
pub struct MockBehavior {
    pub name: String,
    /// `Some(msg)` makes `authenticate` fail with `msg`
    pub reject_credentials: Option<String>,
    /// 1-based post call that fails
    pub fail_on_post: Option<usize>,
    /// Keep failing every post after `fail_on_post`
    pub fail_all_after: bool,
    pub post_error: String,
    /// Added before every call
    pub latency: Duration,
}

impl Default for MockBehavior {
    fn default() -> Self {
        Self {
            name: "mock".to_string(),
            reject_credentials: None,
            fail_on_post: None,
            fail_all_after: false,
            post_error: "Mock posting failed".to_string(),
            latency: Duration::ZERO,
        }
    }
}

#[derive(Debug, Default)]
struct CallLog {
    auth_calls: usize,
    post_calls: usize,
    posted: Vec<String>,
}

/// Shared view of a mock's call log
///
/// Stays valid after the platform is boxed and handed to the service.
#[derive(Debug, Clone, Default)]
pub struct MockCalls {
    log: Arc<Mutex<CallLog>>,
}

impl MockCalls {
    fn lock(&self) -> MutexGuard<'_, CallLog> {
        self.log.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn auth_call_count(&self) -> usize {
        self.lock().auth_calls
    }

    pub fn post_call_count(&self) -> usize {
        self.lock().post_calls
    }

    /// Messages that were accepted, in order
    pub fn posted_content(&self) -> Vec<String> {
        self.lock().posted.clone()
    }
}

pub struct MockPlatform {
    behavior: MockBehavior,
    calls: MockCalls,
    authenticated: bool,
}

impl MockPlatform {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            calls: MockCalls::default(),
            authenticated: false,
        }
    }

    /// Accepts its credentials and every post
    pub fn success(name: &str) -> Self {
        Self::new(MockBehavior {
            name: name.to_string(),
            ..Default::default()
        })
    }

    /// Like [`MockPlatform::success`], but usable without `authenticate`
    pub fn authenticated(name: &str) -> Self {
        Self::success(name).skip_auth()
    }

    pub fn auth_failure(name: &str, error: &str) -> Self {
        Self::new(MockBehavior {
            name: name.to_string(),
            reject_credentials: Some(error.to_string()),
            ..Default::default()
        })
    }

    /// Authenticated; only post number `n` (1-based) fails
    pub fn fail_on_post(name: &str, n: usize, error: &str) -> Self {
        Self::new(MockBehavior {
            name: name.to_string(),
            fail_on_post: Some(n),
            post_error: error.to_string(),
            ..Default::default()
        })
        .skip_auth()
    }

    /// Authenticated; every post fails
    pub fn post_failure(name: &str, error: &str) -> Self {
        let mut platform = Self::fail_on_post(name, 1, error);
        platform.behavior.fail_all_after = true;
        platform
    }

    /// Authenticated; every call waits `latency` first
    pub fn with_delay(name: &str, latency: Duration) -> Self {
        Self::new(MockBehavior {
            name: name.to_string(),
            latency,
            ..Default::default()
        })
        .skip_auth()
    }

    fn skip_auth(mut self) -> Self {
        self.authenticated = true;
        self
    }

    pub fn calls(&self) -> MockCalls {
        self.calls.clone()
    }

    pub fn auth_call_count(&self) -> usize {
        self.calls.auth_call_count()
    }

    pub fn post_call_count(&self) -> usize {
        self.calls.post_call_count()
    }

    pub fn posted_content(&self) -> Vec<String> {
        self.calls.posted_content()
    }

    async fn simulate_latency(&self) {
        if !self.behavior.latency.is_zero() {
            sleep(self.behavior.latency).await;
        }
    }
}

#[async_trait]
impl Platform for MockPlatform {
    async fn authenticate(&mut self) -> Result<()> {
        self.calls.lock().auth_calls += 1;
        self.simulate_latency().await;

        if let Some(reason) = &self.behavior.reject_credentials {
            return Err(PlatformError::Authentication(reason.clone()).into());
        }

        self.authenticated = true;
        Ok(())
    }

    async fn post(&self, message: &str) -> Result<String> {
        let call = {
            let mut log = self.calls.lock();
            log.post_calls += 1;
            log.post_calls
        };

        if !self.authenticated {
            return Err(PlatformError::Authentication("Not authenticated".to_string()).into());
        }

        self.simulate_latency().await;

        let fails = match self.behavior.fail_on_post {
            Some(n) if self.behavior.fail_all_after => call >= n,
            Some(n) => call == n,
            None => false,
        };
        if fails {
            return Err(PlatformError::Posting(self.behavior.post_error.clone()).into());
        }

        self.calls.lock().posted.push(message.to_string());
        Ok(format!("{}:mock-{}", self.behavior.name, uuid::Uuid::new_v4()))
    }

    fn name(&self) -> &str {
        &self.behavior.name
    }
}
