//! 错误处理体系 (Error Handling System)
//!
//! 定义领域相关的错误类型以及全局 Result 别名。

use thiserror::Error;

/// 全局错误定义 (Spider Domain Errors)
#[derive(Error, Debug)]
pub enum SpiderError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Middleware error: {0}")]
    Middleware(#[from] reqwest_middleware::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("XLSX error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Parsing error: {0}")]
    Parse(String),

    /// 用户输入的章节范围无法解析
    #[error("章节范围格式错误: {0} (例如: 1-5 或 1,3,5)")]
    InvalidChapterRange(String),

    /// 留言或回复内容为空
    #[error("{0}不能为空")]
    EmptyFeedback(&'static str),

    #[error("留言 #{0} 不存在")]
    UnknownMessage(u64),

    #[error("Unknown site identifier: {0}")]
    UnknownSite(String),

    #[error("Other error: {0}")]
    Custom(String),
}

/// 全局 Result 别名
pub type Result<T> = std::result::Result<T, SpiderError>;

impl SpiderError {
    /// 提取底层 HTTP 状态码
    ///
    /// 支持中间件嵌套错误的分层解包。
    pub fn status(&self) -> Option<reqwest::StatusCode> {
        match self {
            SpiderError::Network(e) => e.status(),
            SpiderError::Middleware(reqwest_middleware::Error::Reqwest(e)) => e.status(),
            _ => None,
        }
    }
}
