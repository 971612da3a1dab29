//! 单章评论翻页采集

use tracing::{debug, info, warn};

use crate::core::error::Result;
use crate::core::event::SpiderEvent;
use crate::core::model::{ChapterHarvest, CommentRecord, HarvestOutcome};
use crate::interfaces::PageQuery;

use super::context::RuntimeContext;

/// 从第 1 页开始顺序翻页，直到遇到无评论页、达到翻页上限或收到取消信号
///
/// 只在非空页之后、下一次请求之前等待。请求失败时整章结果作废并向上返回错误。
pub async fn harvest_chapter(ctx: &RuntimeContext, chapter: u32) -> Result<ChapterHarvest> {
    let label = ctx.directory.label(chapter);
    let site = &ctx.site;
    let mut records: Vec<CommentRecord> = Vec::new();
    let mut page: u32 = 1;
    let mut pages_fetched: u32 = 0;

    let outcome = loop {
        if ctx.cancel.is_cancelled() {
            break HarvestOutcome::Cancelled;
        }

        let html = site
            .fetcher()
            .fetch_page(PageQuery {
                novel_id: &ctx.novel_id,
                chapter,
                page,
                cookie: ctx.cookie.as_deref(),
            })
            .await?;
        pages_fetched += 1;

        let extraction = site.extractor().extract(&html);
        if extraction.is_exhausted() {
            info!("第 {} 章的第 {} 页无评论，结束本章爬取。", chapter, page);
            break HarvestOutcome::Exhausted;
        }

        let count = extraction.comments.len();
        records.extend(
            extraction
                .comments
                .into_iter()
                .map(|c| CommentRecord::from_extracted(c, &label, page)),
        );
        debug!("第 {} 章第 {} 页: {} 条评论", chapter, page, count);
        ctx.emit(SpiderEvent::PageHarvested {
            chapter,
            page,
            comments: count,
        });

        if page >= ctx.max_pages {
            warn!("第 {} 章已达到翻页上限 {} 页，停止翻页", chapter, ctx.max_pages);
            break HarvestOutcome::PageCapReached;
        }

        page += 1;
        if !ctx.throttle.pause(&ctx.cancel).await {
            break HarvestOutcome::Cancelled;
        }
    };

    Ok(ChapterHarvest {
        chapter,
        records,
        pages_fetched,
        outcome,
    })
}
