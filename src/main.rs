//! 应用程序入口 (Application Entrypoint)
//!
//! 负责 CLI 指令解析、日志初始化、依赖组装及采集生命周期管理。

mod core;
mod engine;
mod feedback;
mod interfaces;
mod network;
mod sites;
mod ui;
mod utils;

#[cfg(test)]
mod test_support;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::fmt::MakeWriter;

use crate::core::config::AppConfig;
use crate::core::event::{SpiderEvent, create_event_channel};
use crate::core::export::{ExportFormat, Exporter};
use crate::core::model::{ChapterSelection, CrawlRequest};
use crate::engine::CrawlEngine;
use crate::feedback::FeedbackBoard;
use crate::network::{HttpService, Session};
use crate::sites::SiteRegistry;
use crate::ui::{Ui, get_multi};

/// 进度条感知的日志写入器
///
/// 确保日志输出不会破坏终端进度条的渲染布局。
struct IndicatifWriter;

impl io::Write for IndicatifWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let s = String::from_utf8_lossy(buf);
        let _ = get_multi().println(s.trim_end());
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for IndicatifWriter {
    type Writer = IndicatifWriter;

    fn make_writer(&self) -> Self::Writer {
        IndicatifWriter
    }
}

#[derive(Parser)]
#[command(author, version, about = "晋江文学城章节评论采集与留言板", long_about = None)]
struct Cli {
    /// 配置文件路径 (默认读取当前目录下的 config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 采集指定章节的评论并导出
    Crawl(CrawlArgs),
    /// 留言板
    Feedback {
        #[command(subcommand)]
        action: FeedbackAction,
    },
}

#[derive(Args)]
struct CrawlArgs {
    /// 小说 ID
    #[arg(short, long)]
    novel: String,
    /// 章节范围，如 1-5、1,3,5 或 7
    #[arg(short, long)]
    chapters: ChapterSelection,
    /// 登录后的 Cookie (可选)
    #[arg(long)]
    cookie: Option<String>,
    /// 站点标识
    #[arg(short, long, default_value = "jjwxc")]
    site: String,
    /// 导出目录 (覆盖配置)
    #[arg(short, long)]
    out: Option<PathBuf>,
    /// 导出格式
    #[arg(short, long, value_enum, default_value_t = ExportFormat::Csv)]
    format: ExportFormat,
    /// 单章最多翻页数 (覆盖配置)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    max_pages: Option<u32>,
}

#[derive(Subcommand)]
enum FeedbackAction {
    /// 发表留言
    Post {
        /// 昵称，留空为匿名用户
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long)]
        text: String,
    },
    /// 回复留言
    Reply {
        /// 留言编号
        #[arg(long)]
        id: u64,
        #[arg(long)]
        text: String,
    },
    /// 分页查看留言
    List {
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::var("RUST_LOG").is_err() {
        unsafe {
            std::env::set_var("RUST_LOG", "info");
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(IndicatifWriter)
        .with_target(false)
        .with_ansi(true)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Crawl(args) => crawl(config, args).await,
        Commands::Feedback { action } => run_feedback(&config, action),
    }
}

async fn crawl(mut config: AppConfig, args: CrawlArgs) -> anyhow::Result<()> {
    if let Some(max_pages) = args.max_pages {
        config.spider.max_pages = max_pages;
    }

    let session = Arc::new(Session::new());
    let http = Arc::new(HttpService::new(&config.http, session)?);
    let registry = SiteRegistry::new();
    let site = registry
        .create(&args.site, config.site(&args.site), http)
        .inspect_err(|_| warn!("可用站点: {}", registry.list().join(", ")))?;

    // 建立 UI 事件反馈链路
    let (event_sender, event_receiver) = create_event_channel();
    let ui_handle = Ui::run(event_receiver);

    // 信号处理与优雅退出：已采集的评论仍会导出
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("收到退出信号，停止翻页并导出已采集的评论...");
            token.cancel();
        }
    });

    let request = CrawlRequest::new(args.novel, args.chapters).with_cookie(args.cookie);
    let novel_id = request.novel_id.clone();

    let records = {
        let engine = CrawlEngine::new(site, &config)
            .with_events(event_sender.clone())
            .with_cancel(cancel);
        engine.run(request).await?
    };

    if records.is_empty() {
        warn!("没有爬取到任何评论。");
        event_sender.emit(SpiderEvent::NothingToExport);
    } else {
        let out_dir = args.out.unwrap_or_else(|| PathBuf::from(&config.output_dir));
        let path = Exporter::new(out_dir, args.format).export(&novel_id, &records)?;
        event_sender.emit(SpiderEvent::Exported {
            path: path.display().to_string(),
        });
    }

    // 发送端关闭后 UI 循环自然结束
    drop(event_sender);
    let _ = ui_handle.await;
    Ok(())
}

fn run_feedback(config: &AppConfig, action: FeedbackAction) -> anyhow::Result<()> {
    let board = FeedbackBoard::open(&config.feedback)?;

    match action {
        FeedbackAction::Post { name, text } => {
            let message = board.post(&name, &text)?;
            println!("谢谢你的留言！我们会认真阅读的 😊 (编号 #{})", message.id);
        }
        FeedbackAction::Reply { id, text } => {
            board.reply(id, &text)?;
            println!("已回复留言 #{}", id);
        }
        FeedbackAction::List { page } => {
            let page = board.page(page)?;
            if page.total_messages == 0 {
                println!("目前没有留言哦");
                return Ok(());
            }

            println!("📄 显示留言：第 {} 页，共 {} 页", page.page, page.total_pages);
            for thread in &page.threads {
                let message = &thread.message;
                println!("\n#{} {} 的留言：{}", message.id, message.author, message.body);
                if thread.replies.is_empty() {
                    println!("  ^ ^ 回复：暂未回复");
                }
                for reply in &thread.replies {
                    println!("  ^ ^ 回复：{}", reply);
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn malformed_chapters_are_rejected_by_the_parser() {
        let crawl = |chapters: &'static str| {
            Cli::try_parse_from([
                "comment-spider", "crawl", "--novel", "42", "--chapters", chapters,
            ])
        };
        assert!(crawl("a-b").is_err());
        assert!(crawl("1-4000000000").is_err());

        let parsed = crawl("3-5").unwrap();
        match parsed.command {
            Commands::Crawl(args) => {
                assert_eq!(args.chapters.into_vec(), vec![3, 4, 5]);
                assert_eq!(args.site, "jjwxc");
                assert_eq!(args.format, ExportFormat::Csv);
            }
            Commands::Feedback { .. } => panic!("expected crawl"),
        }
    }

    #[test]
    fn max_pages_must_be_positive() {
        let parsed = Cli::try_parse_from([
            "comment-spider", "crawl", "--novel", "42", "--chapters", "1", "--max-pages", "0",
        ]);
        assert!(parsed.is_err());
    }
}
