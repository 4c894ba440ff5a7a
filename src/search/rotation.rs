//! API-key rotation for search providers.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio_util::sync::CancellationToken;

use crate::client::RetryConfig;
use crate::{Error, Result};

/// Statuses that mean "this key is unusable right now, try the next one".
pub const ROTATABLE_STATUS_CODES: &[u16] = &[401, 403, 429];

/// Called after a rotation with 1-based `(from, to, total)` key positions.
pub type RotationCallback = Arc<dyn Fn(usize, usize, usize) + Send + Sync>;

/// Ordered API keys with a forward-only cursor.
#[derive(Debug, Default)]
pub struct KeyRotator {
    keys: Vec<String>,
    current: AtomicUsize,
}

impl KeyRotator {
    pub fn new(keys: Vec<String>) -> Self {
        Self {
            keys,
            current: AtomicUsize::new(0),
        }
    }

    pub fn current_key(&self) -> Option<&str> {
        self.keys.get(self.current_index()).map(String::as_str)
    }

    pub fn current_index(&self) -> usize {
        self.current.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Advance to the next key and return its index, or `None` when the
    /// current key is the last one.
    pub fn rotate(&self) -> Option<usize> {
        let total = self.keys.len();
        self.current
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |i| {
                (i + 1 < total).then_some(i + 1)
            })
            .ok()
            .map(|previous| previous + 1)
    }
}

fn should_rotate(error: &Error) -> bool {
    matches!(error, Error::Api { status: Some(status), .. } if ROTATABLE_STATUS_CODES.contains(status))
}

/// Run `search` with the current key, rotating to the next key on 401, 403
/// or 429.
///
/// With at most one key the call is made once and its error returned as is.
/// Otherwise up to [`RetryConfig::search`] attempts are made with backoff in
/// between. Running out of keys yields [`Error::KeysExhausted`]; running out
/// of attempts yields [`Error::RetriesExhausted`].
pub async fn search_with_rotation<T, F, Fut>(
    rotator: &KeyRotator,
    provider: &str,
    cancel: &CancellationToken,
    on_rotate: Option<&RotationCallback>,
    mut search: F,
) -> Result<T>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let key = || rotator.current_key().unwrap_or_default().to_string();

    if rotator.len() <= 1 {
        return tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::Cancelled),
            result = search(key()) => result,
        };
    }

    let retry = RetryConfig::search();
    let mut attempt = 0;

    loop {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        attempt += 1;

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            result = search(key()) => result,
        };

        let error = match result {
            Ok(value) => return Ok(value),
            Err(e) if !should_rotate(&e) => return Err(e),
            Err(e) => e,
        };

        let from = rotator.current_index();
        let Some(to) = rotator.rotate() else {
            tracing::warn!(provider, error = %error, "Search API keys exhausted");
            return Err(Error::KeysExhausted {
                provider: provider.to_string(),
                source: Box::new(error),
            });
        };

        tracing::warn!(
            provider,
            status = error.status_code(),
            from = from + 1,
            to = to + 1,
            total = rotator.len(),
            "Rotating search API key"
        );
        if let Some(callback) = on_rotate {
            callback(from + 1, to + 1, rotator.len());
        }

        if attempt >= retry.max_attempts {
            return Err(Error::RetriesExhausted {
                attempts: attempt,
                source: Box::new(error),
            });
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            _ = tokio::time::sleep(retry.backoff.delay_for(attempt)) => {}
        }
    }
}
