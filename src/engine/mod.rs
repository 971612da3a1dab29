pub mod context;
pub mod harvester;
pub mod pipeline;
pub mod throttle;

pub use pipeline::CrawlEngine;
