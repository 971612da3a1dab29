//! 评论导出 (Exporter)
//!
//! 将合并后的评论记录写入表格文件 (CSV / XLSX) 或 JSON Lines。

use std::fs::File;
use std::io::{BufWriter, Write as _};
use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Format, Workbook};
use tracing::info;

use crate::core::error::Result;
use crate::core::model::CommentRecord;

/// 导出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ExportFormat {
    /// 带 BOM 的 UTF-8 CSV，可直接用表格软件打开
    #[default]
    Csv,
    /// 每行一个 JSON 对象
    Jsonl,
    /// Excel 工作簿
    Xlsx,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Jsonl => "jsonl",
            ExportFormat::Xlsx => "xlsx",
        }
    }
}

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// 表头，与 `CommentRecord` 的序列化列名一致
const COLUMNS: [&str; 5] = ["评论时间", "评论者", "评论内容", "章节", "页码"];

/// 评论导出器
pub struct Exporter {
    out_dir: PathBuf,
    format: ExportFormat,
}

impl Exporter {
    pub fn new(out_dir: impl Into<PathBuf>, format: ExportFormat) -> Self {
        Self {
            out_dir: out_dir.into(),
            format,
        }
    }

    /// 以作品 ID 与运行时间戳生成输出文件名
    pub fn file_name(&self, novel_id: &str, timestamp: chrono::DateTime<chrono::Local>) -> String {
        format!(
            "novel_{}_comments_{}.{}",
            sanitize_file_component(novel_id),
            timestamp.format("%Y%m%d_%H%M%S"),
            self.format.extension()
        )
    }

    /// 写出全部记录，返回文件路径
    pub fn export(&self, novel_id: &str, records: &[CommentRecord]) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.out_dir)?;
        let path = self
            .out_dir
            .join(self.file_name(novel_id, chrono::Local::now()));

        match self.format {
            ExportFormat::Csv => write_csv(&path, records)?,
            ExportFormat::Jsonl => write_jsonl(&path, records)?,
            ExportFormat::Xlsx => write_xlsx(&path, records)?,
        }

        info!(
            "已导出 {} 条评论 ({}): {}",
            records.len(),
            self.format,
            path.display()
        );
        Ok(path)
    }
}

fn write_csv(path: &Path, records: &[CommentRecord]) -> Result<()> {
    let mut file = File::create(path)?;
    file.write_all(UTF8_BOM)?;

    let mut writer = csv::Writer::from_writer(BufWriter::new(file));
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_jsonl(path: &Path, records: &[CommentRecord]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

fn write_xlsx(path: &Path, records: &[CommentRecord]) -> Result<()> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let sheet = workbook.add_worksheet();

    for (col, title) in COLUMNS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *title, &bold)?;
    }
    for (idx, record) in records.iter().enumerate() {
        let row = idx as u32 + 1;
        sheet.write_string(row, 0, &record.posted_at)?;
        sheet.write_string(row, 1, &record.author)?;
        sheet.write_string(row, 2, &record.body)?;
        sheet.write_string(row, 3, &record.chapter_label)?;
        sheet.write_number(row, 4, record.page)?;
    }

    workbook.save(path)?;
    Ok(())
}

fn sanitize_file_component(s: &str) -> String {
    s.trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}
