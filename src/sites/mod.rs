use std::collections::HashMap;
use std::sync::Arc;

use crate::core::config::SiteConfig;
use crate::core::error::{Result, SpiderError};
use crate::interfaces::Site;
use crate::network::HttpService;

pub mod jjwxc;

// ============================================================================
// 站点注册表
// ============================================================================

type SiteFactory = Box<dyn Fn(SiteConfig, Arc<HttpService>) -> Result<Arc<dyn Site>> + Send + Sync>;

pub struct SiteRegistry {
    factories: HashMap<String, SiteFactory>,
}

impl SiteRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            factories: HashMap::new(),
        };
        registry.register(jjwxc::SITE_ID, |cfg, http| {
            Ok(Arc::new(jjwxc::Jjwxc::new(cfg, http)?))
        });
        registry
    }

    pub fn register<F>(&mut self, id: &str, factory: F)
    where
        F: Fn(SiteConfig, Arc<HttpService>) -> Result<Arc<dyn Site>> + Send + Sync + 'static,
    {
        self.factories.insert(id.to_string(), Box::new(factory));
    }

    pub fn create(
        &self,
        id: &str,
        config: SiteConfig,
        http: Arc<HttpService>,
    ) -> Result<Arc<dyn Site>> {
        let factory = self
            .factories
            .get(id)
            .ok_or_else(|| SpiderError::UnknownSite(id.to_string()))?;
        factory(config, http)
    }

    pub fn list(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.factories.keys().map(|s| s.as_str()).collect();
        ids.sort_unstable();
        ids
    }
}

impl Default for SiteRegistry {
    fn default() -> Self {
        Self::new()
    }
}
