//! 引擎运行时上下文 (Runtime Context)
//!
//! 维护章节任务间的共享状态与并发配额。

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::core::event::{EventSender, SpiderEvent};
use crate::core::model::ChapterDirectory;
use crate::interfaces::Site;

use super::throttle::Throttle;

/// 章节任务运行时上下文
///
/// 目录在任何任务启动前构建完毕，之后只读共享。
pub struct RuntimeContext {
    /// 目标站点抽象实现
    pub site: Arc<dyn Site>,
    pub directory: Arc<ChapterDirectory>,
    /// 章节级并发信号量
    pub semaphore: Arc<Semaphore>,
    pub throttle: Throttle,
    /// 单章翻页上限
    pub max_pages: u32,
    pub novel_id: String,
    pub cookie: Option<String>,
    /// 事件分发句柄
    pub events: Option<EventSender>,
    pub cancel: CancellationToken,
}

impl RuntimeContext {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        site: Arc<dyn Site>,
        directory: Arc<ChapterDirectory>,
        concurrency: usize,
        throttle: Throttle,
        max_pages: u32,
        novel_id: String,
        cookie: Option<String>,
        events: Option<EventSender>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            site,
            directory,
            semaphore: Arc::new(Semaphore::new(concurrency.max(1))),
            throttle,
            max_pages,
            novel_id,
            cookie,
            events,
            cancel,
        }
    }

    /// 向事件总线推送消息
    pub fn emit(&self, event: SpiderEvent) {
        if let Some(ref sender) = self.events {
            sender.emit(event);
        }
    }
}
