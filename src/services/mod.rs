pub mod campaign_scraper;
pub mod page_fetcher;

pub use campaign_scraper::*;
pub use page_fetcher::*;
