use linkshard_core::{ShortCode, Store, StoreError};
use std::sync::Arc;
use tracing::instrument;

type Result<T> = std::result::Result<T, StoreError>;

/// Longest long URL accepted by [`LinkService::assign`].
pub const MAX_URL_LEN: usize = 2048;

/// The two operations a transport layer calls, with input validation.
///
/// The pipeline itself trusts its input. This facade rejects malformed
/// long URLs and short codes with [`StoreError::InvalidInput`] before they
/// reach it.
#[derive(Clone)]
pub struct LinkService {
    store: Arc<dyn Store>,
}

impl LinkService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    #[instrument(skip(self), err)]
    pub async fn assign(&self, long_url: &str) -> Result<ShortCode> {
        validate_url(long_url)?;
        self.store.assign(long_url).await
    }

    #[instrument(skip(self), err)]
    pub async fn resolve(&self, code: &str) -> Result<String> {
        let code = ShortCode::new(code)?;
        self.store.resolve(&code).await
    }
}

/// Accepts absolute `http`/`https` URLs with a non-empty host.
fn validate_url(url: &str) -> Result<()> {
    if url.is_empty() {
        return Err(StoreError::InvalidInput("URL cannot be empty".to_string()));
    }
    if url.len() > MAX_URL_LEN {
        return Err(StoreError::InvalidInput(format!(
            "URL is longer than {MAX_URL_LEN} bytes"
        )));
    }
    if url.chars().any(char::is_whitespace) {
        return Err(StoreError::InvalidInput(
            "URL must not contain whitespace".to_string(),
        ));
    }

    let Some((scheme, rest)) = url.split_once("://") else {
        return Err(StoreError::InvalidInput(format!(
            "URL must have a valid scheme and host: {url}"
        )));
    };

    let scheme = scheme.to_ascii_lowercase();
    if scheme != "http" && scheme != "https" {
        return Err(StoreError::InvalidInput(format!(
            "URL scheme must be http or https: {scheme}"
        )));
    }

    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host = authority.rsplit('@').next().unwrap_or_default();
    if host.is_empty() || host.starts_with(':') {
        return Err(StoreError::InvalidInput(format!("URL has no host: {url}")));
    }

    Ok(())
}
