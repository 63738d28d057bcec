//! State module for tracking page processing
//!
//! # Components
//!
//! - `CrawlStage`: the stage a single page URL is in while a virtual user
//!   processes it (fetching, checking, extracting assets, fetching assets, done)

mod crawl_stage;

pub use crawl_stage::CrawlStage;
