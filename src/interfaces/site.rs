//! 站点定义
//!
//! 定义了站点需要实现的核心接口：目录索引器、评论页获取器与评论提取器。

use async_trait::async_trait;

use crate::core::config::SiteConfig;
use crate::core::error::Result;
use crate::core::model::{ChapterDirectory, PageExtraction};

/// 评论页定位参数
#[derive(Debug, Clone, Copy)]
pub struct PageQuery<'a> {
    pub novel_id: &'a str,
    pub chapter: u32,
    /// 从 1 开始
    pub page: u32,
    pub cookie: Option<&'a str>,
}

/// 索引器 Trait - 负责获取作品的章节目录
#[async_trait]
pub trait Indexer: Send + Sync {
    async fn fetch_directory(&self, novel_id: &str) -> Result<ChapterDirectory>;
}

/// 评论页获取器 Trait - 负责获取单页原始评论标记
#[async_trait]
pub trait CommentFetcher: Send + Sync {
    async fn fetch_page(&self, query: PageQuery<'_>) -> Result<String>;
}

/// 评论提取器 Trait
///
/// 每种观测到的页面结构对应一个实现，上游改版时只需新增实现。
pub trait CommentExtractor: Send + Sync {
    /// 提取策略名称 (用于日志)
    fn name(&self) -> &str;

    /// 解析单页标记；单条评论解析失败只记录日志并跳过
    fn extract(&self, html: &str) -> PageExtraction;
}

/// 站点定义 Trait
pub trait Site: Send + Sync {
    /// 站点唯一标识
    fn id(&self) -> &str;

    /// 站点配置
    fn config(&self) -> &SiteConfig;

    fn indexer(&self) -> &dyn Indexer;

    fn fetcher(&self) -> &dyn CommentFetcher;

    fn extractor(&self) -> &dyn CommentExtractor;
}
