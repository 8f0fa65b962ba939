pub mod handlers;
pub mod report;

// Re-export commonly used handler functions for convenience
pub use handlers::{
    CrawlOptions, CrawlSummary, execute_crawl, load_urls_from_file, load_urls_from_source,
    parse_url_line,
};
pub use report::generate_summary_report;
