use async_trait::async_trait;
use rand::Rng;

use super::{EgressIdentity, EgressSource};

/// Picks a random proxy from a fixed list for every rotation
#[derive(Debug, Clone, Default)]
pub struct ProxyPool {
    proxies: Vec<String>,
}

impl ProxyPool {
    pub fn new(proxies: Vec<String>) -> Self {
        Self { proxies }
    }

    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }
}

#[async_trait]
impl EgressSource for ProxyPool {
    async fn next_identity(&self) -> Option<EgressIdentity> {
        if self.proxies.is_empty() {
            return None;
        }
        let index = rand::rng().random_range(0..self.proxies.len());
        Some(EgressIdentity::new(self.proxies[index].clone()))
    }
}

/// Always uses the local network path
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectEgress;

#[async_trait]
impl EgressSource for DirectEgress {
    async fn next_identity(&self) -> Option<EgressIdentity> {
        None
    }
}
