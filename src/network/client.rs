use std::sync::Arc;

use encoding_rs::Encoding;
use url::Url;

use crate::core::error::{Result, SpiderError};
use crate::network::service::HttpService;
use crate::utils::decode_lossy;

/// 面向站点的 HTTP 客户端封装
///
/// 绑定站点的页面编码，响应体按该编码宽松解码。
#[derive(Clone)]
pub struct SiteClient {
    pub http: Arc<HttpService>,
    encoding: &'static Encoding,
}

impl SiteClient {
    pub fn new(http: Arc<HttpService>, encoding: &'static Encoding) -> Self {
        Self { http, encoding }
    }

    /// 获取文本内容
    pub async fn get_text(&self, url: Url, cookie: Option<&str>) -> Result<String> {
        let resp = self.http.get(url, cookie).await?;
        let bytes = resp.bytes().await.map_err(SpiderError::Network)?;
        Ok(decode_lossy(self.encoding, &bytes))
    }
}
