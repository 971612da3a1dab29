use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{COOKIE, HeaderMap, HeaderValue, USER_AGENT};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use tracing::debug;
use url::Url;

use crate::core::config::HttpConfig;
use crate::core::error::{Result, SpiderError};
use crate::network::middleware::{RetryMiddleware, SessionMiddleware};
use crate::network::session::Session;

/// HTTP 会话工厂
///
/// 构建带瞬时错误重试的可复用客户端，所有站点共享同一连接池。
#[derive(Clone)]
pub struct HttpService {
    client: ClientWithMiddleware,
    session: Arc<Session>,
}

impl HttpService {
    pub fn new(config: &HttpConfig, session: Arc<Session>) -> Result<Self> {
        if session.get_ua().is_empty() {
            session.set_ua(config.user_agent.clone());
        }
        if let Some(cookie) = config.cookie.as_ref().filter(|c| !c.is_empty()) {
            session.set_cookie(cookie.clone());
        }

        let client = Self::try_build_internal_client(config, &session)?;
        Ok(Self { client, session })
    }

    /// 构建底层的 HTTP 客户端
    fn try_build_internal_client(
        config: &HttpConfig,
        session: &Session,
    ) -> Result<ClientWithMiddleware> {
        let mut headers = HeaderMap::new();
        if let Ok(val) = HeaderValue::from_str(&session.get_ua()) {
            headers.insert(USER_AGENT, val);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(SpiderError::Network)?;

        Ok(ClientBuilder::new(client)
            .with(SessionMiddleware)
            .with(RetryMiddleware::new(
                config.max_retries,
                Duration::from_millis(config.retry_base_delay_ms),
            ))
            .build())
    }

    /// 执行 GET 请求
    ///
    /// `cookie` 优先于会话中的默认 Cookie；重试耗尽后的非 2xx 状态转为错误。
    pub async fn get(&self, url: Url, cookie: Option<&str>) -> Result<reqwest::Response> {
        debug!("GET {}", url);
        let mut rb = self
            .client
            .get(url)
            .with_extension(self.session.clone());

        if let Some(cookie) = cookie.filter(|c| !c.is_empty()) {
            rb = rb.header(COOKIE, cookie);
        }

        let resp = rb.send().await.map_err(SpiderError::Middleware)?;
        resp.error_for_status().map_err(SpiderError::Network)
    }
}
