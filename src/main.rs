use std::net::TcpListener;

use env_logger::Env;
use pulse::{configuration::get_configuration, services::PageFetcher, startup::run};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let configuration = get_configuration().expect("Failed to read configuration.");

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(address)?;
    let page_fetcher = PageFetcher::new(&configuration.scraper);

    run(listener, page_fetcher)?.await
}
