use std::sync::Arc;

use parking_lot::RwLock;

/// 会话状态：浏览器标识与默认 Cookie
#[derive(Debug, Default)]
pub struct Session {
    pub ua: Arc<RwLock<String>>,
    pub cookie: Arc<RwLock<Option<String>>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_ua(&self, ua: String) {
        *self.ua.write() = ua;
    }

    pub fn get_ua(&self) -> String {
        self.ua.read().clone()
    }

    pub fn set_cookie(&self, cookie: String) {
        *self.cookie.write() = Some(cookie);
    }

    pub fn get_cookie(&self) -> Option<String> {
        self.cookie.read().clone()
    }
}
