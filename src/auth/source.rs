//! Credential source trait.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::SecretString;

use crate::Result;

/// A bearer credential together with its validity window.
#[derive(Clone, Debug)]
pub struct IssuedToken {
    pub token: SecretString,
    pub expires_at: DateTime<Utc>,
    /// Issuer's hint for when to refresh, informational only.
    pub refresh_in: Option<Duration>,
}

impl IssuedToken {
    pub fn new(token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            token: SecretString::from(token.into()),
            expires_at,
            refresh_in: None,
        }
    }

    pub fn with_refresh_in(mut self, refresh_in: Duration) -> Self {
        self.refresh_in = Some(refresh_in);
        self
    }

    /// Still usable `margin` from now.
    pub fn is_fresh(&self, margin: chrono::Duration) -> bool {
        Utc::now() + margin < self.expires_at
    }

    /// Time left until the token enters the refresh margin.
    pub fn until_refresh(&self, margin: chrono::Duration) -> Duration {
        (self.expires_at - margin - Utc::now())
            .to_std()
            .unwrap_or(Duration::ZERO)
    }
}

/// Issues fresh credentials from some upstream authority.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Source name for logging.
    fn name(&self) -> &str {
        "token"
    }

    async fn fetch(&self) -> Result<IssuedToken>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_freshness() {
        let margin = chrono::Duration::seconds(60);

        let token = IssuedToken::new("t", Utc::now() + chrono::Duration::hours(1));
        assert!(token.is_fresh(margin));
        assert!(token.until_refresh(margin) > Duration::from_secs(3000));

        let token = IssuedToken::new("t", Utc::now() + chrono::Duration::seconds(30));
        assert!(!token.is_fresh(margin));
        assert_eq!(token.until_refresh(margin), Duration::ZERO);
    }
}
