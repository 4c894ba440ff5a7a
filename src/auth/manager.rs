//! Cached credential with proactive background refresh.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use secrecy::SecretString;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::{IssuedToken, TokenSource};
use crate::Result;

/// A token closer than this to expiry is treated as expired.
pub const DEFAULT_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Wait before retrying after a failed background refresh when the token
/// is already due.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

struct Inner {
    source: Arc<dyn TokenSource>,
    cache: RwLock<Option<IssuedToken>>,
    margin: chrono::Duration,
    retry_delay: Duration,
}

struct RefreshTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Shares one credential between readers and one background refresher.
///
/// Readers take the read lock; a refresh holds the write lock for its whole
/// duration and re-checks freshness after acquiring it, so concurrent
/// callers that all saw a stale token trigger a single fetch.
#[derive(Clone)]
pub struct TokenManager {
    inner: Arc<Inner>,
    task: Arc<Mutex<Option<RefreshTask>>>,
}

impl TokenManager {
    pub fn new(source: Arc<dyn TokenSource>) -> Self {
        Self {
            inner: Arc::new(Inner {
                source,
                cache: RwLock::new(None),
                margin: to_chrono(DEFAULT_REFRESH_MARGIN),
                retry_delay: DEFAULT_RETRY_DELAY,
            }),
            task: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_margin(self, margin: Duration) -> Self {
        self.reconfigure(|inner| inner.margin = to_chrono(margin))
    }

    pub fn with_retry_delay(self, delay: Duration) -> Self {
        self.reconfigure(|inner| inner.retry_delay = delay)
    }

    fn reconfigure(self, apply: impl FnOnce(&mut Inner)) -> Self {
        let mut inner = Inner {
            source: Arc::clone(&self.inner.source),
            cache: RwLock::new(None),
            margin: self.inner.margin,
            retry_delay: self.inner.retry_delay,
        };
        apply(&mut inner);
        Self {
            inner: Arc::new(inner),
            task: self.task,
        }
    }

    /// Current credential, fetching a new one when missing or inside the
    /// refresh margin.
    pub async fn get(&self) -> Result<SecretString> {
        {
            let cache = self.inner.cache.read().await;
            if let Some(token) = cache.as_ref()
                && token.is_fresh(self.inner.margin)
            {
                return Ok(token.token.clone());
            }
        }
        self.inner.refresh().await
    }

    /// Replace the cached credential.
    pub async fn set(&self, token: IssuedToken) {
        *self.inner.cache.write().await = Some(token);
    }

    pub async fn invalidate(&self) {
        *self.inner.cache.write().await = None;
    }

    pub async fn expires_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.inner.cache.read().await.as_ref().map(|t| t.expires_at)
    }

    /// Spawn the refresh loop. It stops when `parent` is cancelled or on
    /// [`TokenManager::stop`]. Calling `start` while a loop runs is a no-op.
    pub fn start(&self, parent: &CancellationToken) {
        let mut task = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        if task.as_ref().is_some_and(|t| !t.handle.is_finished()) {
            return;
        }

        let cancel = parent.child_token();
        let inner = Arc::clone(&self.inner);
        let token = cancel.clone();
        let handle = tokio::spawn(async move { inner.run(token).await });
        tracing::debug!(source = self.inner.source.name(), "Credential refresh task started");
        *task = Some(RefreshTask { cancel, handle });
    }

    /// Cancel the refresh loop and wait for it to exit.
    pub async fn stop(&self) {
        let task = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            task.cancel.cancel();
            if let Err(e) = task.handle.await {
                tracing::warn!(error = %e, "Credential refresh task ended abnormally");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|t| !t.handle.is_finished())
    }
}

impl Inner {
    async fn refresh(&self) -> Result<SecretString> {
        let mut cache = self.cache.write().await;
        if let Some(token) = cache.as_ref()
            && token.is_fresh(self.margin)
        {
            return Ok(token.token.clone());
        }

        let issued = self.source.fetch().await?;
        tracing::info!(
            source = self.source.name(),
            expires_at = %issued.expires_at,
            "Credential refreshed"
        );
        let token = issued.token.clone();
        *cache = Some(issued);
        Ok(token)
    }

    async fn until_refresh(&self) -> Duration {
        self.cache
            .read()
            .await
            .as_ref()
            .map(|t| t.until_refresh(self.margin))
            .unwrap_or(Duration::ZERO)
    }

    async fn run(self: Arc<Self>, cancel: CancellationToken) {
        let mut retry_after: Option<Duration> = None;

        loop {
            let wait = match retry_after.take() {
                Some(wait) => wait,
                None => self.until_refresh().await,
            };

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(wait) => {}
            }

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                result = self.refresh() => result,
            };

            match result {
                Ok(_) => {
                    // Tokens that expire inside the margin are due immediately.
                    if self.until_refresh().await.is_zero() {
                        tracing::warn!(
                            retry_ms = self.retry_delay.as_millis() as u64,
                            "Refreshed credential expires within the refresh margin"
                        );
                        retry_after = Some(self.retry_delay);
                    }
                }
                Err(e) => {
                    let delay = wait.max(self.retry_delay);
                    tracing::warn!(
                        error = %e,
                        retry_ms = delay.as_millis() as u64,
                        "Background credential refresh failed"
                    );
                    retry_after = Some(delay);
                }
            }
        }

        tracing::debug!("Credential refresh task stopped");
    }
}

fn to_chrono(duration: Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::zero())
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("source", &self.inner.source.name())
            .field("running", &self.is_running())
            .finish()
    }
}
