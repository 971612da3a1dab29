//! 配置管理系统 (Configuration Management)
//!
//! 负责 `config.toml` 的反序列化及其层级结构映射，支持环境变量与默认值回退机制。

use std::collections::HashMap;
use std::path::Path;

use bon::Builder;
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::core::error::{Result, SpiderError};

/// 礼貌延迟下限，防止源站限流封禁
pub const MIN_POLITE_DELAY_MS: u64 = 1000;

/// 全局应用配置
#[derive(Debug, Deserialize, Builder, Clone)]
pub struct AppConfig {
    /// 导出文件目录
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// HTTP 会话相关配置
    #[serde(default)]
    pub http: HttpConfig,

    /// 评论采集引擎通用参数
    #[serde(default)]
    pub spider: SpiderConfig,

    /// 留言板存储配置
    #[serde(default)]
    pub feedback: FeedbackConfig,

    /// 站点特定配置覆盖映射
    #[serde(default)]
    pub sites: HashMap<String, SiteConfig>,
}

/// HTTP 会话配置
#[derive(Debug, Deserialize, Builder, Clone)]
pub struct HttpConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// 单次请求超时 (秒)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// 服务端错误 (5xx) 的额外重试次数
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// 指数退避基准间隔 (毫秒)，每次重试翻倍
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    /// 默认 Cookie，可被命令行参数覆盖
    pub cookie: Option<String>,
}

/// 调度引擎参数
#[derive(Debug, Deserialize, Builder, Clone)]
pub struct SpiderConfig {
    /// 章节级并行度上限
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// 单章最多翻页数
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
    #[serde(default)]
    pub delay: DelayConfig,
}

/// 延迟模式
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DelayMode {
    /// 在 [min_ms, max_ms] 内均匀随机
    #[default]
    Random,
    /// 固定 fixed_ms
    Fixed,
}

/// 请求间隔配置
#[derive(Debug, Deserialize, Builder, Clone)]
pub struct DelayConfig {
    #[serde(default)]
    pub mode: DelayMode,
    #[serde(default = "default_delay_min_ms")]
    pub min_ms: u64,
    #[serde(default = "default_delay_max_ms")]
    pub max_ms: u64,
    #[serde(default = "default_delay_fixed_ms")]
    pub fixed_ms: u64,
}

/// 留言板存储配置
#[derive(Debug, Deserialize, Builder, Clone)]
pub struct FeedbackConfig {
    #[serde(default = "default_messages_path")]
    pub messages_path: String,
    #[serde(default = "default_replies_path")]
    pub replies_path: String,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

/// 站点特定配置覆盖
#[derive(Debug, Deserialize, Builder, Clone, Default)]
pub struct SiteConfig {
    /// 自定义域名 (用于镜像站点或测试桩)
    pub base_url: Option<String>,
    /// 站点独占任务并行度
    pub concurrent_tasks: Option<usize>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            http: HttpConfig::default(),
            spider: SpiderConfig::default(),
            feedback: FeedbackConfig::default(),
            sites: HashMap::new(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            cookie: None,
        }
    }
}

impl Default for SpiderConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            max_pages: default_max_pages(),
            delay: DelayConfig::default(),
        }
    }
}

impl Default for DelayConfig {
    fn default() -> Self {
        Self {
            mode: DelayMode::default(),
            min_ms: default_delay_min_ms(),
            max_ms: default_delay_max_ms(),
            fixed_ms: default_delay_fixed_ms(),
        }
    }
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            messages_path: default_messages_path(),
            replies_path: default_replies_path(),
            page_size: default_page_size(),
        }
    }
}

fn default_output_dir() -> String {
    "output".to_string()
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/96.0.4664.110 Safari/537.36".to_string()
}
fn default_timeout_secs() -> u64 {
    15
}
fn default_connect_timeout_secs() -> u64 {
    10
}
fn default_max_retries() -> u32 {
    3
}
fn default_retry_base_delay_ms() -> u64 {
    1000
}
fn default_concurrency() -> usize {
    5
}
fn default_max_pages() -> u32 {
    200
}
fn default_delay_min_ms() -> u64 {
    1000
}
fn default_delay_max_ms() -> u64 {
    3000
}
fn default_delay_fixed_ms() -> u64 {
    3000
}
fn default_messages_path() -> String {
    "messages.txt".to_string()
}
fn default_replies_path() -> String {
    "replies.txt".to_string()
}
fn default_page_size() -> usize {
    5
}

impl AppConfig {
    /// 从文件系统及环境变量中加载并解析配置
    ///
    /// 未指定路径时尝试当前目录下的 `config.toml`，文件不存在则全部回退默认值。
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = path.unwrap_or_else(|| Path::new("config.toml"));
        let builder = Config::builder();

        let builder = if config_path.exists() {
            builder.add_source(File::from(config_path))
        } else if path.is_some() {
            return Err(SpiderError::Custom(format!(
                "配置文件不存在: {}",
                config_path.display()
            )));
        } else {
            builder
        };

        let settings = builder
            .add_source(
                Environment::with_prefix("COMMENT_SPIDER")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        let config: AppConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// 启动前的参数合法性检查
    pub fn validate(&self) -> Result<()> {
        if self.spider.concurrency == 0 {
            return Err(SpiderError::Custom("spider.concurrency 必须大于 0".into()));
        }
        if self.spider.max_pages == 0 {
            return Err(SpiderError::Custom("spider.max_pages 必须大于 0".into()));
        }
        if self.feedback.page_size == 0 {
            return Err(SpiderError::Custom("feedback.page_size 必须大于 0".into()));
        }
        self.spider.delay.validate()
    }

    /// 获取站点配置，未配置时回退默认值
    pub fn site(&self, id: &str) -> SiteConfig {
        self.sites.get(id).cloned().unwrap_or_default()
    }
}

impl DelayConfig {
    fn validate(&self) -> Result<()> {
        let lowest = match self.mode {
            DelayMode::Random => {
                if self.min_ms > self.max_ms {
                    return Err(SpiderError::Custom(format!(
                        "spider.delay.min_ms ({}) 大于 max_ms ({})",
                        self.min_ms, self.max_ms
                    )));
                }
                self.min_ms
            }
            DelayMode::Fixed => self.fixed_ms,
        };

        if lowest < MIN_POLITE_DELAY_MS {
            return Err(SpiderError::Custom(format!(
                "{} 模式下的请求间隔不得低于 {} ms",
                self.mode, MIN_POLITE_DELAY_MS
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::*;

    #[test]
    fn defaults_match_polite_crawl_policy() {
        let config = AppConfig::default();
        assert_eq!(config.http.timeout_secs, 15);
        assert_eq!(config.http.max_retries, 3);
        assert_eq!(config.http.retry_base_delay_ms, 1000);
        assert_eq!(config.spider.concurrency, 5);
        assert_eq!(config.spider.delay.mode, DelayMode::Random);
        assert_eq!(config.spider.delay.min_ms, 1000);
        assert_eq!(config.spider.delay.max_ms, 3000);
        assert_eq!(config.feedback.page_size, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn load_reads_sections_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
output_dir = "exports"

[http]
cookie = "token=abc"

[spider]
concurrency = 3

[spider.delay]
mode = "fixed"
fixed_ms = 2500

[sites.jjwxc]
base_url = "http://127.0.0.1:8080"
"#
        )
        .unwrap();

        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.output_dir, "exports");
        assert_eq!(config.http.cookie.as_deref(), Some("token=abc"));
        assert_eq!(config.http.timeout_secs, 15);
        assert_eq!(config.spider.concurrency, 3);
        assert_eq!(config.spider.max_pages, 200);
        assert_eq!(config.spider.delay.mode, DelayMode::Fixed);
        assert_eq!(config.spider.delay.fixed_ms, 2500);
        assert_eq!(
            config.site("jjwxc").base_url.as_deref(),
            Some("http://127.0.0.1:8080")
        );
        assert!(config.site("other").base_url.is_none());
    }

    #[test]
    fn load_rejects_missing_explicit_file() {
        let err = AppConfig::load(Some(Path::new("/nonexistent/comment-spider.toml")));
        assert!(err.is_err());
    }

    #[test]
    fn delay_below_floor_is_rejected() {
        let config = AppConfig::builder()
            .output_dir("out".into())
            .http(HttpConfig::default())
            .spider(
                SpiderConfig::builder()
                    .concurrency(5)
                    .max_pages(10)
                    .delay(
                        DelayConfig::builder()
                            .mode(DelayMode::Random)
                            .min_ms(200)
                            .max_ms(3000)
                            .fixed_ms(3000)
                            .build(),
                    )
                    .build(),
            )
            .feedback(FeedbackConfig::default())
            .sites(HashMap::new())
            .build();
        assert!(config.validate().is_err());

        let mut inverted = AppConfig::default();
        inverted.spider.delay.min_ms = 4000;
        assert!(inverted.validate().is_err());
    }
}
