pub mod site;

pub use site::{CommentExtractor, CommentFetcher, Indexer, PageQuery, Site};
