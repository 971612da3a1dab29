//! 测试桩：HTTP 服务器 (tiny_http) 与内存站点

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use url::Url;

use crate::core::config::SiteConfig;
use crate::core::error::{Result, SpiderError};
use crate::core::model::ChapterDirectory;
use crate::interfaces::{CommentExtractor, CommentFetcher, Indexer, PageQuery, Site};
use crate::sites::jjwxc::JjwxcExtractor;

#[derive(Debug, Clone)]
pub struct StubRequest {
    pub path: String,
    pub query: HashMap<String, String>,
    pub user_agent: Option<String>,
    pub cookie: Option<String>,
}

impl StubRequest {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }
}

pub struct StubResponse {
    status: u16,
    body: Vec<u8>,
}

impl StubResponse {
    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: Vec::new(),
        }
    }

    pub fn text(body: &str) -> Self {
        Self::bytes(body.as_bytes().to_vec())
    }

    pub fn bytes(body: Vec<u8>) -> Self {
        Self { status: 200, body }
    }

    /// 以 GBK 编码返回正文
    pub fn gbk(body: &str) -> Self {
        let (encoded, _, _) = encoding_rs::GBK.encode(body);
        Self::bytes(encoded.into_owned())
    }
}

type Handler = dyn Fn(&StubRequest, usize) -> StubResponse + Send + Sync;

pub struct StubServer {
    base: String,
    requests: Arc<Mutex<Vec<StubRequest>>>,
    shutdown: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl StubServer {
    /// 启动服务器；处理函数的第二个参数为该路径的累计请求次数 (含本次)
    pub fn start<F>(handler: F) -> Self
    where
        F: Fn(&StubRequest, usize) -> StubResponse + Send + Sync + 'static,
    {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start tiny_http server");
        let base = format!("http://{}", server.server_addr());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let shutdown = Arc::new(AtomicBool::new(false));
        let handler: Arc<Handler> = Arc::new(handler);

        let log = requests.clone();
        let stop = shutdown.clone();
        let handle = thread::spawn(move || {
            while !stop.load(Ordering::SeqCst) {
                let request = match server.recv_timeout(Duration::from_millis(20)) {
                    Ok(Some(req)) => req,
                    Ok(None) => continue,
                    Err(_) => break,
                };

                let parsed = parse_request(&request);
                let hits = {
                    let mut log = log.lock();
                    log.push(parsed.clone());
                    log.iter().filter(|r| r.path == parsed.path).count()
                };

                let reply = handler(&parsed, hits);
                let response =
                    tiny_http::Response::from_data(reply.body).with_status_code(reply.status);
                let _ = request.respond(response);
            }
        });

        Self {
            base,
            requests,
            shutdown,
            handle: Some(handle),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    pub fn url(&self, path: &str) -> Url {
        Url::parse(&format!("{}{}", self.base, path)).expect("valid stub url")
    }

    pub fn requests(&self) -> Vec<StubRequest> {
        self.requests.lock().clone()
    }

    pub fn hits(&self, path: &str) -> usize {
        self.requests.lock().iter().filter(|r| r.path == path).count()
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn parse_request(request: &tiny_http::Request) -> StubRequest {
    let url = Url::parse(&format!("http://stub{}", request.url())).expect("valid request url");
    let header = |name: &'static str| {
        request
            .headers()
            .iter()
            .find(|h| h.field.equiv(name))
            .map(|h| h.value.as_str().to_string())
    };

    StubRequest {
        path: url.path().to_string(),
        query: url.query_pairs().into_owned().collect(),
        user_agent: header("User-Agent"),
        cookie: header("Cookie"),
    }
}

// ============================================================================
// 内存站点
// ============================================================================

/// 生成一页评论标记，每项为 (评论者, 发表时间, 内容)
pub fn comment_page(comments: &[(&str, &str, &str)]) -> String {
    let blocks: String = comments
        .iter()
        .enumerate()
        .map(|(i, (author, time, body))| {
            format!(
                "<div id=\"comment_{}\"><span>网友：[{}]</span> \
                 <span>发表时间：{}</span><p>{}</p></div>",
                i + 1,
                author,
                time,
                body
            )
        })
        .collect();
    format!("<html><body>{blocks}</body></html>")
}

/// 内存中的假站点：按 (章节, 页码) 返回预置页面，其余页面为空页
#[derive(Default)]
pub struct FakeSite {
    config: SiteConfig,
    directory: ChapterDirectory,
    directory_fails: bool,
    pages: HashMap<(u32, u32), String>,
    failing: HashSet<u32>,
    calls: Mutex<Vec<(u32, u32)>>,
    started: Mutex<Vec<(u32, Instant)>>,
    latency: Duration,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    extractor: JjwxcExtractor,
}

impl FakeSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, chapter: u32, title: &str) -> Self {
        self.directory.insert(chapter, title);
        self
    }

    pub fn page(mut self, chapter: u32, page: u32, html: String) -> Self {
        self.pages.insert((chapter, page), html);
        self
    }

    /// 该章节的所有请求都失败
    pub fn failing(mut self, chapter: u32) -> Self {
        self.failing.insert(chapter);
        self
    }

    pub fn broken_directory(mut self) -> Self {
        self.directory_fails = true;
        self
    }

    pub fn concurrency(mut self, tasks: usize) -> Self {
        self.config.concurrent_tasks = Some(tasks);
        self
    }

    /// 每次请求的模拟耗时
    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn calls(&self) -> Vec<(u32, u32)> {
        self.calls.lock().clone()
    }

    /// 每次请求开始的时刻，按发起顺序
    pub fn started(&self) -> Vec<(u32, Instant)> {
        self.started.lock().clone()
    }

    /// 同时在途请求数的峰值
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Indexer for FakeSite {
    async fn fetch_directory(&self, _novel_id: &str) -> Result<ChapterDirectory> {
        if self.directory_fails {
            return Err(SpiderError::Parse("目录页无法解析".into()));
        }
        Ok(self.directory.clone())
    }
}

#[async_trait]
impl CommentFetcher for FakeSite {
    async fn fetch_page(&self, query: PageQuery<'_>) -> Result<String> {
        self.calls.lock().push((query.chapter, query.page));
        self.started.lock().push((query.chapter, Instant::now()));
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(current, Ordering::SeqCst);

        if self.latency.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(&query.chapter) {
            return Err(SpiderError::Custom(format!("第 {} 章请求失败", query.chapter)));
        }
        Ok(self
            .pages
            .get(&(query.chapter, query.page))
            .cloned()
            .unwrap_or_else(|| "<html><body></body></html>".to_string()))
    }
}

impl Site for FakeSite {
    fn id(&self) -> &str {
        "fake"
    }

    fn config(&self) -> &SiteConfig {
        &self.config
    }

    fn indexer(&self) -> &dyn Indexer {
        self
    }

    fn fetcher(&self) -> &dyn CommentFetcher {
        self
    }

    fn extractor(&self) -> &dyn CommentExtractor {
        &self.extractor
    }
}
