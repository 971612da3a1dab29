pub mod client;
pub mod middleware;
pub mod service;
pub mod session;

pub use client::SiteClient;
pub use service::HttpService;
pub use session::Session;
