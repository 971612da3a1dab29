//! 事件系统定义
//!
//! 用于 Engine 与 UI 之间的完全解耦通信

use flume::{Receiver, Sender};

use crate::core::model::HarvestOutcome;

/// Spider 事件类型
#[derive(Debug, Clone)]
pub enum SpiderEvent {
    /// 采集开始
    CrawlStarted {
        site_id: String,
        novel_id: String,
        total_chapters: usize,
    },

    /// 章节目录加载完成
    DirectoryLoaded { chapters: usize },

    /// 单页评论采集完成
    PageHarvested {
        chapter: u32,
        page: u32,
        comments: usize,
    },

    /// 章节采集完成
    ChapterCompleted {
        chapter: u32,
        comments: usize,
        outcome: HarvestOutcome,
    },

    /// 章节采集失败
    ChapterFailed { chapter: u32, error: String },

    /// 全部章节结束
    CrawlCompleted { comments: usize },

    /// 导出文件已写入
    Exported { path: String },

    /// 无可导出的评论
    NothingToExport,
}

/// 事件发送器
#[derive(Clone)]
pub struct EventSender {
    tx: Sender<SpiderEvent>,
}

impl EventSender {
    pub fn new(tx: Sender<SpiderEvent>) -> Self {
        Self { tx }
    }

    /// 发送事件
    pub fn emit(&self, event: SpiderEvent) {
        let _ = self.tx.send(event);
    }
}

/// 事件接收器
pub struct EventReceiver {
    rx: Receiver<SpiderEvent>,
}

impl EventReceiver {
    pub fn new(rx: Receiver<SpiderEvent>) -> Self {
        Self { rx }
    }

    /// 非阻塞接收事件
    #[cfg(test)]
    pub fn try_recv(&self) -> Option<SpiderEvent> {
        self.rx.try_recv().ok()
    }

    /// 异步接收事件
    pub async fn recv_async(&self) -> Option<SpiderEvent> {
        self.rx.recv_async().await.ok()
    }
}

/// 创建事件通道
pub fn create_event_channel() -> (EventSender, EventReceiver) {
    let (tx, rx) = flume::unbounded();
    (EventSender::new(tx), EventReceiver::new(rx))
}
