use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{COOKIE, HeaderValue, USER_AGENT};
use reqwest::{Request, Response, StatusCode};
use reqwest_middleware::{Middleware, Next, Result};
use tracing::warn;

use crate::network::session::Session;

/// 会话注入中间件
/// 负责在每次请求前，将 Session 中的 UA 与默认 Cookie 注入 Header
///
/// 请求已自带 Cookie 时不覆盖。
pub struct SessionMiddleware;

#[async_trait::async_trait]
impl Middleware for SessionMiddleware {
    async fn handle(
        &self,
        mut req: Request,
        extensions: &mut http::Extensions,
        next: Next<'_>,
    ) -> Result<Response> {
        if let Some(session) = extensions.get::<Arc<Session>>() {
            let headers = req.headers_mut();

            let ua = session.get_ua();
            if !ua.is_empty()
                && let Ok(val) = HeaderValue::from_str(&ua)
            {
                headers.insert(USER_AGENT, val);
            }

            if !headers.contains_key(COOKIE)
                && let Some(cookie) = session.get_cookie()
                && !cookie.is_empty()
                && let Ok(val) = HeaderValue::from_str(&cookie)
            {
                headers.insert(COOKIE, val);
            }
        }
        next.run(req, extensions).await
    }
}

/// 服务端瞬时错误重试中间件
///
/// 仅对 500/502/503/504 重试，间隔按 `base_delay * 2^n` 指数增长。
/// 连接失败、超时与 4xx 直接返回给调用方。
pub struct RetryMiddleware {
    max_retries: u32,
    base_delay: Duration,
}

impl RetryMiddleware {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    fn is_retryable(status: StatusCode) -> bool {
        matches!(
            status,
            StatusCode::INTERNAL_SERVER_ERROR
                | StatusCode::BAD_GATEWAY
                | StatusCode::SERVICE_UNAVAILABLE
                | StatusCode::GATEWAY_TIMEOUT
        )
    }

    fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

#[async_trait::async_trait]
impl Middleware for RetryMiddleware {
    async fn handle(
        &self,
        req: Request,
        extensions: &mut http::Extensions,
        next: Next<'_>,
    ) -> Result<Response> {
        let mut attempt = 0;

        loop {
            let duplicate = req.try_clone().ok_or_else(|| {
                reqwest_middleware::Error::Middleware(anyhow::anyhow!(
                    "请求体不可复制，无法重试: {}",
                    req.url()
                ))
            })?;

            let resp = next.clone().run(duplicate, extensions).await?;
            let status = resp.status();
            if !Self::is_retryable(status) || attempt >= self.max_retries {
                return Ok(resp);
            }

            let wait = self.backoff(attempt);
            attempt += 1;
            warn!(
                "服务端错误 {} ({})，第 {}/{} 次重试，{:?} 后重试...",
                status,
                req.url(),
                attempt,
                self.max_retries,
                wait
            );
            tokio::time::sleep(wait).await;
        }
    }
}
