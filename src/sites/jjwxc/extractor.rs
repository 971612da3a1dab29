//! 晋江评论提取器
//!
//! 评论容器为 id 形如 `comment_123` 的 `div`。容器 HTML 经 html2md 转为
//! Markdown 文本，再从中匹配发表时间与评论者。

use scraper::{ElementRef, Html};
use tracing::{debug, warn};

use super::SiteSelectors;
use crate::core::model::{ANONYMOUS_AUTHOR, ExtractedComment, PageExtraction};
use crate::interfaces::CommentExtractor;

/// 按 `comment_<数字>` 容器提取评论
#[derive(Debug, Default, Clone, Copy)]
pub struct JjwxcExtractor;

impl JjwxcExtractor {
    fn extract_one(&self, container: ElementRef<'_>) -> Option<ExtractedComment> {
        let s = SiteSelectors::get();
        let text = html2md::parse_html(&container.html());

        // 有标签无时间的评论保留，时间记为空
        let posted_at = s
            .posted_at
            .captures(&text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().replace('\\', "").trim().to_string())?;

        let author = s
            .author
            .captures(&text)
            .and_then(|c| c.get(1).or_else(|| c.get(2)))
            .map(|m| s.escaped.replace_all(m.as_str().trim(), "$1").into_owned())
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| ANONYMOUS_AUTHOR.to_string());

        Some(ExtractedComment {
            posted_at,
            author,
            body: text.trim().to_string(),
        })
    }
}

impl CommentExtractor for JjwxcExtractor {
    fn name(&self) -> &str {
        "comment-div"
    }

    fn extract(&self, html: &str) -> PageExtraction {
        let doc = Html::parse_document(html);
        let s = SiteSelectors::get();

        let containers: Vec<ElementRef<'_>> = doc
            .select(&s.comment_block)
            .filter(|el| el.value().id().is_some_and(|id| s.comment_id.is_match(id)))
            .collect();

        let mut comments = Vec::with_capacity(containers.len());
        for container in &containers {
            match self.extract_one(*container) {
                Some(comment) => comments.push(comment),
                None => warn!(
                    "评论 {} 缺少发表时间标签，已跳过",
                    container.value().id().unwrap_or_default()
                ),
            }
        }

        debug!(
            "[{}] 容器 {} 个，有效评论 {} 条",
            self.name(),
            containers.len(),
            comments.len()
        );
        PageExtraction {
            containers: containers.len(),
            comments,
        }
    }
}
