//! URL signer for backends without native presigning.
//!
//! The in-memory store has no HTTP surface of its own, so links point at a
//! configured base URL and carry the method and expiry as query parameters.
//! Nothing verifies them; this exists for development setups and tests.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use http::Method;
use object_store::path::Path;
use object_store::signer::Signer;
use url::Url;

#[derive(Debug, Clone)]
pub struct LocalSigner {
    base: Url,
}

impl LocalSigner {
    pub fn new(base_url: &str) -> Result<Self, url::ParseError> {
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self { base })
    }
}

#[async_trait]
impl Signer for LocalSigner {
    async fn signed_url(
        &self,
        method: Method,
        path: &Path,
        expires_in: Duration,
    ) -> object_store::Result<Url> {
        let mut url = self
            .base
            .join(path.as_ref())
            .map_err(|e| object_store::Error::Generic {
                store: "local-signer",
                source: Box::new(e),
            })?;
        let expires = (SystemTime::now() + expires_in)
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        url.query_pairs_mut()
            .append_pair("method", method.as_str())
            .append_pair("expires", &expires.to_string());
        Ok(url)
    }
}
