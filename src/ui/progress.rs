//! 终端进度渲染
//!
//! 基于 `indicatif` 渲染采集进度：一个总状态行加一个章节进度条。

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use parking_lot::RwLock;
use tokio::task::JoinHandle;

use crate::core::event::{EventReceiver, SpiderEvent};
use crate::utils::truncate_string;

/// 全局 TUI 容器 (Singleton)
static MULTI: OnceLock<MultiProgress> = OnceLock::new();

/// 获取全局进度容器实例
pub fn get_multi() -> &'static MultiProgress {
    MULTI.get_or_init(MultiProgress::new)
}

#[derive(Default)]
struct UiState {
    main_bar: Option<ProgressBar>,
    chapter_bar: Option<ProgressBar>,
    comments: usize,
}

static STATE: OnceLock<Arc<RwLock<UiState>>> = OnceLock::new();

fn get_state() -> &'static Arc<RwLock<UiState>> {
    STATE.get_or_init(|| Arc::new(RwLock::new(UiState::default())))
}

/// 进度协调器
pub struct Ui;

impl Ui {
    /// 启动事件监听循环；发送端全部关闭后任务结束
    pub fn run(receiver: EventReceiver) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(event) = receiver.recv_async().await {
                Self::handle_event(event);
            }
        })
    }

    fn handle_event(event: SpiderEvent) {
        let multi = get_multi();
        let mut ui = get_state().write();

        match event {
            SpiderEvent::CrawlStarted {
                site_id,
                novel_id,
                total_chapters,
            } => {
                let spinner = ProgressStyle::default_spinner()
                    .template("{spinner:.green} [{elapsed_precise}] {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner())
                    .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
                let main = multi.add(ProgressBar::new_spinner());
                main.set_style(spinner);
                main.set_message(format!("📚 {} / {} 读取目录...", site_id, novel_id));
                main.enable_steady_tick(Duration::from_millis(100));

                let style = ProgressStyle::default_bar()
                    .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} 章 {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("█▉▊▋▌▍▎▏  ");
                let bar = multi.add(ProgressBar::new(total_chapters as u64));
                bar.set_style(style);

                ui.main_bar = Some(main);
                ui.chapter_bar = Some(bar);
                ui.comments = 0;
            }
            SpiderEvent::DirectoryLoaded { chapters } => {
                if let Some(ref bar) = ui.main_bar {
                    bar.set_message(format!("📖 目录 {} 章，采集评论中...", chapters));
                }
            }
            SpiderEvent::PageHarvested {
                chapter,
                page,
                comments,
            } => {
                ui.comments += comments;
                if let Some(ref bar) = ui.chapter_bar {
                    let msg = format!("第{}章 第{}页 (累计 {} 条)", chapter, page, ui.comments);
                    bar.set_message(truncate_string(&msg, 40));
                }
            }
            SpiderEvent::ChapterCompleted { .. } => {
                if let Some(ref bar) = ui.chapter_bar {
                    bar.inc(1);
                }
            }
            SpiderEvent::ChapterFailed { chapter, error } => {
                if let Some(ref bar) = ui.chapter_bar {
                    bar.inc(1);
                    bar.set_message(truncate_string(&format!("⚠️ 第{}章: {}", chapter, error), 40));
                }
            }
            SpiderEvent::CrawlCompleted { comments } => {
                if let Some(ref bar) = ui.chapter_bar {
                    bar.finish_with_message(format!("✅ 共 {} 条评论", comments));
                }
            }
            SpiderEvent::Exported { path } => {
                if let Some(ref bar) = ui.main_bar {
                    bar.finish_with_message(format!("✅ 已导出: {}", path));
                }
            }
            SpiderEvent::NothingToExport => {
                if let Some(ref bar) = ui.main_bar {
                    bar.abandon_with_message("⚠️ 没有爬取到任何评论");
                }
            }
        }
    }
}
