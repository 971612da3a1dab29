//! 领域模型 (Domain Model)
//!
//! 章节目录、评论记录、采集请求及章节选择语法。

use std::collections::BTreeMap;
use std::str::FromStr;

use indexmap::IndexSet;
use serde::Serialize;

use crate::core::error::SpiderError;

/// 目录缺失时使用的章节标题
pub const UNKNOWN_CHAPTER: &str = "未知章节";

/// 单次采集允许选择的最多章节数
pub const MAX_SELECTED_CHAPTERS: usize = 10_000;

/// 未登录或未署名评论者的显示名
pub const ANONYMOUS_AUTHOR: &str = "匿名用户";

/// 章节目录：章节号 -> 章节标题
///
/// 每次采集构建一次，之后只读共享。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChapterDirectory {
    titles: BTreeMap<u32, String>,
}

impl ChapterDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, chapter: u32, title: impl Into<String>) {
        self.titles.insert(chapter, title.into());
    }

    pub fn title(&self, chapter: u32) -> Option<&str> {
        self.titles.get(&chapter).map(String::as_str)
    }

    /// 生成形如 `第12章 标题` 的章节标签
    pub fn label(&self, chapter: u32) -> String {
        let title = self.title(chapter).unwrap_or(UNKNOWN_CHAPTER);
        format!("第{}章 {}", chapter, title)
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }
}

impl FromIterator<(u32, String)> for ChapterDirectory {
    fn from_iter<I: IntoIterator<Item = (u32, String)>>(iter: I) -> Self {
        Self {
            titles: iter.into_iter().collect(),
        }
    }
}

/// 单页中提取出的一条评论 (尚未关联章节上下文)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedComment {
    pub posted_at: String,
    pub author: String,
    pub body: String,
}

/// 单页提取结果
///
/// `containers` 为匹配到的评论容器数量，为 0 时表示该章评论已翻完；
/// 个别容器解析失败不影响翻页判断。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageExtraction {
    pub containers: usize,
    pub comments: Vec<ExtractedComment>,
}

impl PageExtraction {
    pub fn is_exhausted(&self) -> bool {
        self.containers == 0
    }
}

/// 导出用评论记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentRecord {
    #[serde(rename = "评论时间")]
    pub posted_at: String,
    #[serde(rename = "评论者")]
    pub author: String,
    #[serde(rename = "评论内容")]
    pub body: String,
    #[serde(rename = "章节")]
    pub chapter_label: String,
    #[serde(rename = "页码")]
    pub page: u32,
}

impl CommentRecord {
    pub fn from_extracted(comment: ExtractedComment, chapter_label: &str, page: u32) -> Self {
        Self {
            posted_at: comment.posted_at,
            author: comment.author,
            body: comment.body,
            chapter_label: chapter_label.to_string(),
            page,
        }
    }
}

/// 章节选择
///
/// 支持三种写法：`1-5` 闭区间、`1,3,5` 枚举、`7` 单章。
/// 枚举保持输入顺序并去重，总数不超过 [`MAX_SELECTED_CHAPTERS`]。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterSelection {
    chapters: IndexSet<u32>,
}

impl ChapterSelection {
    pub fn into_vec(self) -> Vec<u32> {
        self.chapters.into_iter().collect()
    }
}

fn parse_chapter_number(raw: &str, input: &str) -> Result<u32, SpiderError> {
    match raw.trim().parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(SpiderError::InvalidChapterRange(input.to_string())),
    }
}

impl FromStr for ChapterSelection {
    type Err = SpiderError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let text = input.trim();

        let chapters: IndexSet<u32> = if text.contains('-') {
            let (start, end) = text
                .split_once('-')
                .filter(|(_, end)| !end.contains('-'))
                .ok_or_else(|| SpiderError::InvalidChapterRange(input.to_string()))?;
            let start = parse_chapter_number(start, input)?;
            let end = parse_chapter_number(end, input)?;
            let span = end.checked_sub(start).map_or(0, |d| d as usize + 1);
            if span > MAX_SELECTED_CHAPTERS {
                return Err(SpiderError::InvalidChapterRange(input.to_string()));
            }
            (start..=end).collect()
        } else if text.contains(',') {
            let parts: Vec<&str> = text.split(',').collect();
            if parts.len() > MAX_SELECTED_CHAPTERS {
                return Err(SpiderError::InvalidChapterRange(input.to_string()));
            }
            parts
                .into_iter()
                .map(|part| parse_chapter_number(part, input))
                .collect::<Result<_, _>>()?
        } else {
            std::iter::once(parse_chapter_number(text, input)?).collect()
        };

        if chapters.is_empty() {
            return Err(SpiderError::InvalidChapterRange(input.to_string()));
        }
        Ok(Self { chapters })
    }
}

/// 一次采集请求
#[derive(Debug, Clone)]
pub struct CrawlRequest {
    pub novel_id: String,
    pub chapters: Vec<u32>,
    pub cookie: Option<String>,
}

impl CrawlRequest {
    pub fn new(novel_id: impl Into<String>, selection: ChapterSelection) -> Self {
        Self {
            novel_id: novel_id.into(),
            chapters: selection.into_vec(),
            cookie: None,
        }
    }

    pub fn with_cookie(mut self, cookie: Option<String>) -> Self {
        self.cookie = cookie.filter(|c| !c.trim().is_empty());
        self
    }
}

/// 单章采集的终止原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum HarvestOutcome {
    /// 遇到无评论页，正常结束
    #[strum(serialize = "已翻完")]
    Exhausted,
    /// 达到翻页上限
    #[strum(serialize = "达到翻页上限")]
    PageCapReached,
    /// 收到退出信号
    #[strum(serialize = "已取消")]
    Cancelled,
}

/// 单章采集结果
#[derive(Debug, Clone)]
pub struct ChapterHarvest {
    pub chapter: u32,
    pub records: Vec<CommentRecord>,
    pub pages_fetched: u32,
    pub outcome: HarvestOutcome,
}
