//! 晋江选择器
//!
//! 预编译的 CSS 选择器与字段正则

use std::sync::OnceLock;

use regex::Regex;
use scraper::Selector;

/// 站点选择器集合
pub struct SiteSelectors {
    /// 目录页表格行
    pub row: Selector,
    pub cell: Selector,
    /// 评论容器候选 (再经 `comment_id` 过滤)
    pub comment_block: Selector,
    pub comment_id: Regex,
    /// `发表时间：2023-01-01 10:00:00`
    pub posted_at: Regex,
    /// `网友：[昵称]` 或 `网友：[[昵称](链接)]`
    pub author: Regex,
    /// Markdown 转义序列 `\_`、`\*` 等
    pub escaped: Regex,
}

static SELECTORS: OnceLock<SiteSelectors> = OnceLock::new();

impl SiteSelectors {
    /// 获取全局选择器实例
    pub fn get() -> &'static SiteSelectors {
        SELECTORS.get_or_init(|| SiteSelectors {
            row: Selector::parse("tr").unwrap(),
            cell: Selector::parse("td").unwrap(),
            comment_block: Selector::parse("div[id]").unwrap(),
            comment_id: Regex::new(r"comment_\d+").unwrap(),
            posted_at: Regex::new(r"发表时间：([0-9\-:\\ \t]*)").unwrap(),
            author: Regex::new(r"网友：\s*\[\s*(?:\[([^\]]*)\]\([^)]*\)|([^\]]*))\s*\]")
                .unwrap(),
            escaped: Regex::new(r"\\([\\`*_{}\[\]()#+\-.!<>~|])").unwrap(),
        })
    }
}
