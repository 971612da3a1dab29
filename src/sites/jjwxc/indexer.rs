//! 晋江目录索引器
//!
//! 从作品主页的章节表格中提取 章节号 -> 标题。

use async_trait::async_trait;
use scraper::{ElementRef, Html};
use tracing::info;
use url::Url;

use super::SiteSelectors;
use crate::core::error::Result;
use crate::core::model::ChapterDirectory;
use crate::interfaces::Indexer;
use crate::network::SiteClient;

pub struct JjwxcIndexer {
    base: Url,
    client: SiteClient,
}

impl JjwxcIndexer {
    pub fn new(base: Url, client: SiteClient) -> Self {
        Self { base, client }
    }

    fn build_url(&self, novel_id: &str) -> Result<Url> {
        let mut url = self.base.join("onebook.php")?;
        url.query_pairs_mut().append_pair("novelid", novel_id);
        Ok(url)
    }
}

/// 逐段去除空白后拼接文本
fn stripped_text(el: ElementRef<'_>) -> String {
    el.text().map(str::trim).collect()
}

/// 解析目录页
///
/// 不足两个单元格或首格非纯数字的行 (表头、广告等) 一律跳过。
pub fn parse_directory(html: &str) -> ChapterDirectory {
    let doc = Html::parse_document(html);
    let s = SiteSelectors::get();
    let mut directory = ChapterDirectory::new();

    for row in doc.select(&s.row) {
        let mut cells = row.select(&s.cell);
        let (Some(first), Some(second)) = (cells.next(), cells.next()) else {
            continue;
        };

        let id = stripped_text(first);
        if id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        let Ok(chapter) = id.parse::<u32>() else {
            continue;
        };

        directory.insert(chapter, stripped_text(second));
    }

    directory
}

#[async_trait]
impl Indexer for JjwxcIndexer {
    async fn fetch_directory(&self, novel_id: &str) -> Result<ChapterDirectory> {
        info!("开始爬取小说 {} 的章节标题...", novel_id);
        let url = self.build_url(novel_id)?;
        let html = self.client.get_text(url, None).await?;
        let directory = parse_directory(&html);
        info!("成功提取章节标题，共 {} 章", directory.len());
        Ok(directory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_rows_become_entries() {
        let html = r#"
            <table>
              <tr><td>章节</td><td>标题</td><td>内容提要</td></tr>
              <tr><td> 12 </td><td><a href="/c12"> Chapter <b>Title</b> </a></td><td>x</td></tr>
              <tr><td>ab</td><td>Not a chapter</td></tr>
              <tr><td>13</td></tr>
              <tr><td colspan="2">广告</td></tr>
              <tr><td>1</td><td>开端</td></tr>
            </table>
        "#;

        let directory = parse_directory(html);
        assert_eq!(directory.len(), 2);
        assert_eq!(directory.title(12), Some("ChapterTitle"));
        assert_eq!(directory.title(1), Some("开端"));
        assert_eq!(directory.title(13), None);
    }

    #[test]
    fn page_without_table_yields_empty_directory() {
        assert!(parse_directory("<html><body><p>404</p></body></html>").is_empty());
    }
}
