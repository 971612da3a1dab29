//! 评论采集调度器
//!
//! 负责协调一次采集的生命周期：目录 -> 按章并发翻页 -> 汇总

use std::sync::Arc;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::core::config::AppConfig;
use crate::core::error::{Result, SpiderError};
use crate::core::event::{EventSender, SpiderEvent};
use crate::core::model::{ChapterDirectory, ChapterHarvest, CommentRecord, CrawlRequest};
use crate::interfaces::Site;

use super::context::RuntimeContext;
use super::harvester::harvest_chapter;
use super::throttle::Throttle;

/// 评论采集引擎
pub struct CrawlEngine {
    site: Arc<dyn Site>,
    concurrency: usize,
    max_pages: u32,
    throttle: Throttle,
    events: Option<EventSender>,
    cancel: CancellationToken,
}

impl CrawlEngine {
    pub fn new(site: Arc<dyn Site>, config: &AppConfig) -> Self {
        let concurrency = site
            .config()
            .concurrent_tasks
            .unwrap_or(config.spider.concurrency);

        Self {
            site,
            concurrency,
            max_pages: config.spider.max_pages,
            throttle: Throttle::from_config(&config.spider.delay),
            events: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = Some(events);
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    #[cfg(test)]
    pub fn with_throttle(mut self, throttle: Throttle) -> Self {
        self.throttle = throttle;
        self
    }

    fn emit(&self, event: SpiderEvent) {
        if let Some(ref sender) = self.events {
            sender.emit(event);
        }
    }

    /// 执行采集，返回按章节完成顺序汇总的评论
    pub async fn run(&self, request: CrawlRequest) -> Result<Vec<CommentRecord>> {
        if request.chapters.is_empty() {
            return Err(SpiderError::Custom("未选择任何章节".into()));
        }

        self.emit(SpiderEvent::CrawlStarted {
            site_id: self.site.id().to_string(),
            novel_id: request.novel_id.clone(),
            total_chapters: request.chapters.len(),
        });

        let directory = self.load_directory(&request.novel_id).await;
        self.emit(SpiderEvent::DirectoryLoaded {
            chapters: directory.len(),
        });

        let ctx = Arc::new(RuntimeContext::new(
            self.site.clone(),
            Arc::new(directory),
            self.concurrency,
            self.throttle,
            self.max_pages,
            request.novel_id,
            request.cookie,
            self.events.clone(),
            self.cancel.clone(),
        ));

        let mut join_set = JoinSet::new();
        for chapter in request.chapters {
            join_set.spawn(run_chapter(ctx.clone(), chapter));
        }

        let mut records = Vec::new();
        while let Some(res) = join_set.join_next().await {
            match res {
                Ok((_, Ok(harvest))) => {
                    info!(
                        "第 {} 章采集结束 ({}): {} 条评论，共 {} 页",
                        harvest.chapter,
                        harvest.outcome,
                        harvest.records.len(),
                        harvest.pages_fetched
                    );
                    self.emit(SpiderEvent::ChapterCompleted {
                        chapter: harvest.chapter,
                        comments: harvest.records.len(),
                        outcome: harvest.outcome,
                    });
                    records.extend(harvest.records);
                }
                Ok((chapter, Err(e))) => {
                    error!("爬取第 {} 章时出错: {}", chapter, e);
                    self.emit(SpiderEvent::ChapterFailed {
                        chapter,
                        error: e.to_string(),
                    });
                }
                Err(e) => {
                    error!("并发调度错误: {}", e);
                }
            }
        }

        info!("采集完成，共 {} 条评论", records.len());
        self.emit(SpiderEvent::CrawlCompleted {
            comments: records.len(),
        });
        Ok(records)
    }

    /// 目录获取失败不影响采集，标题回退为未知章节
    async fn load_directory(&self, novel_id: &str) -> ChapterDirectory {
        match self.site.indexer().fetch_directory(novel_id).await {
            Ok(directory) => {
                if directory.is_empty() {
                    warn!("未解析到任何章节标题");
                }
                directory
            }
            Err(e) => {
                error!("获取章节标题时出错: {}", e);
                ChapterDirectory::new()
            }
        }
    }
}

/// 单章任务：持有并发许可直至翻页与章节间等待都结束
async fn run_chapter(ctx: Arc<RuntimeContext>, chapter: u32) -> (u32, Result<ChapterHarvest>) {
    let _permit = match ctx.semaphore.acquire().await {
        Ok(permit) => permit,
        Err(e) => return (chapter, Err(SpiderError::Custom(e.to_string()))),
    };

    info!("开始爬取第 {} 章", chapter);
    let result = harvest_chapter(&ctx, chapter).await;
    ctx.throttle.pause(&ctx.cancel).await;
    (chapter, result)
}
