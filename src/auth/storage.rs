//! File-based GitHub token storage.

use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};

use crate::{Error, Result};

pub const GITHUB_TOKEN_FILE: &str = "github-token";

/// `<data_dir>/ai-agent/github-token`
pub fn github_token_path() -> Option<PathBuf> {
    crate::config::data_dir().map(|dir| dir.join(GITHUB_TOKEN_FILE))
}

fn default_path() -> Result<PathBuf> {
    github_token_path()
        .ok_or_else(|| Error::Config("could not determine the user data directory".into()))
}

pub async fn load_github_token() -> Result<SecretString> {
    load_github_token_at(&default_path()?).await
}

pub async fn load_github_token_at(path: &Path) -> Result<SecretString> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::auth("not logged in, please authenticate first"));
        }
        Err(e) => return Err(Error::auth(format!("failed to read token: {}", e))),
    };

    let token = content.trim();
    if token.is_empty() {
        return Err(Error::auth("token file is empty, please authenticate again"));
    }
    Ok(SecretString::from(token.to_string()))
}

pub async fn save_github_token(token: &SecretString) -> Result<()> {
    save_github_token_at(&default_path()?, token).await
}

/// Write the token readable by the owner only.
pub async fn save_github_token_at(path: &Path, token: &SecretString) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(path).await?;
    tokio::io::AsyncWriteExt::write_all(&mut file, token.expose_secret().as_bytes()).await?;
    tokio::io::AsyncWriteExt::flush(&mut file).await?;
    tracing::debug!(path = %path.display(), "GitHub token saved");
    Ok(())
}

pub async fn delete_github_token() -> Result<()> {
    delete_github_token_at(&default_path()?).await
}

/// Removing a token that does not exist is not an error.
pub async fn delete_github_token_at(path: &Path) -> Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
