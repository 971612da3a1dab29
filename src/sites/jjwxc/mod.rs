//! 晋江文学城站点模块
//!
//! 目录页 `onebook.php`，评论页 `comment.php`，页面编码为 GBK。

mod extractor;
mod fetcher;
mod indexer;
mod selectors;

use std::sync::Arc;

use url::Url;

use crate::core::config::SiteConfig;
use crate::core::error::Result;
use crate::interfaces::{CommentExtractor, CommentFetcher, Indexer, Site};
use crate::network::{HttpService, SiteClient};

pub use self::extractor::JjwxcExtractor;
pub use self::fetcher::JjwxcFetcher;
pub use self::indexer::JjwxcIndexer;
pub use self::selectors::SiteSelectors;

pub const SITE_ID: &str = "jjwxc";

const DEFAULT_BASE_URL: &str = "https://www.jjwxc.net/";

/// 晋江文学城站点实现
pub struct Jjwxc {
    config: SiteConfig,
    indexer: JjwxcIndexer,
    fetcher: JjwxcFetcher,
    extractor: JjwxcExtractor,
}

impl Jjwxc {
    pub fn new(config: SiteConfig, http: Arc<HttpService>) -> Result<Self> {
        let base = parse_base(config.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL))?;
        let client = SiteClient::new(http, encoding_rs::GBK);

        Ok(Self {
            indexer: JjwxcIndexer::new(base.clone(), client.clone()),
            fetcher: JjwxcFetcher::new(base, client),
            extractor: JjwxcExtractor,
            config,
        })
    }
}

/// 解析站点根地址，保证以 `/` 结尾以便拼接相对路径
fn parse_base(raw: &str) -> Result<Url> {
    let mut base = Url::parse(raw.trim())?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    Ok(base)
}

impl Site for Jjwxc {
    fn id(&self) -> &str {
        SITE_ID
    }

    fn config(&self) -> &SiteConfig {
        &self.config
    }

    fn indexer(&self) -> &dyn Indexer {
        &self.indexer
    }

    fn fetcher(&self) -> &dyn CommentFetcher {
        &self.fetcher
    }

    fn extractor(&self) -> &dyn CommentExtractor {
        &self.extractor
    }
}
