use async_trait::async_trait;
use tracing::debug;
use url::Url;

use crate::core::error::Result;
use crate::interfaces::{CommentFetcher, PageQuery};
use crate::network::SiteClient;

/// 晋江评论页获取器
pub struct JjwxcFetcher {
    base: Url,
    client: SiteClient,
}

impl JjwxcFetcher {
    pub fn new(base: Url, client: SiteClient) -> Self {
        Self { base, client }
    }

    fn build_url(&self, query: &PageQuery<'_>) -> Result<Url> {
        let mut url = self.base.join("comment.php")?;
        url.query_pairs_mut()
            .append_pair("novelid", query.novel_id)
            .append_pair("chapterid", &query.chapter.to_string())
            .append_pair("page", &query.page.to_string());
        Ok(url)
    }
}

#[async_trait]
impl CommentFetcher for JjwxcFetcher {
    async fn fetch_page(&self, query: PageQuery<'_>) -> Result<String> {
        let url = self.build_url(&query)?;
        debug!("获取评论页: {}", url);
        self.client.get_text(url, query.cookie).await
    }
}
