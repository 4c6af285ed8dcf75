/*!
 * External capabilities used by the translation client.
 *
 * This module contains the two seams the pipeline talks through:
 * - `Translator`: the remote text-translation service
 * - `EgressSource`: a supplier of network egress identities (proxies)
 *
 * Implementations:
 * - `deeplx`: DeepLX-compatible HTTP endpoint
 * - `proxy_pool`: static proxy list and direct egress
 * - `mock`: scripted implementations for tests
 */

use async_trait::async_trait;
use std::fmt::{self, Debug};

use crate::errors::ProviderError;

/// Network path used for an outbound translation request
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EgressIdentity {
    proxy_url: String,
}

impl EgressIdentity {
    pub fn new(proxy_url: impl Into<String>) -> Self {
        Self {
            proxy_url: proxy_url.into(),
        }
    }

    /// Proxy URL, e.g. `http://10.0.0.1:8080`
    pub fn proxy_url(&self) -> &str {
        &self.proxy_url
    }
}

impl fmt::Display for EgressIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.proxy_url)
    }
}

/// Common trait for translation services
///
/// A call may fail transiently; retrying is the caller's concern.
#[async_trait]
pub trait Translator: Send + Sync + Debug {
    /// Translate `text` from `source_language` to `target_language`
    ///
    /// # Arguments
    /// * `egress` - Identity to route the request through, `None` for direct
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
        egress: Option<&EgressIdentity>,
    ) -> Result<String, ProviderError>;
}

/// Supplier of egress identities
#[async_trait]
pub trait EgressSource: Send + Sync + Debug {
    /// Next identity to use, or `None` for direct/local egress
    async fn next_identity(&self) -> Option<EgressIdentity>;
}

pub mod deeplx;
pub mod mock;
pub mod proxy_pool;

pub use deeplx::DeepLx;
pub use proxy_pool::{DirectEgress, ProxyPool};
