use std::net::TcpListener;

use actix_web::{dev::Server, middleware::Logger, web, App, HttpServer};

use crate::{
    routes::{campaign_route, default_route},
    services::PageFetcher,
};

pub fn run(listener: TcpListener, page_fetcher: PageFetcher) -> Result<Server, std::io::Error> {
    let page_fetcher = web::Data::new(page_fetcher);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .service(default_route::default)
            .service(web::scope("/campaign").service(campaign_route::campaign))
            .app_data(page_fetcher.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
