pub mod commands;
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{
    build_crawl_config, load_urls_from_file, load_urls_from_source, parse_url_line,
};

// Re-export crawl functionality from outlink-core
pub use outlink_core::crawl::{CrawlOptions, CrawlRun, execute_crawl, extract_url_path};
