// API route configuration

use crate::api::handlers;
use actix_web::web;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(handlers::health_check))
        .service(
            web::scope("/api")
                .route("/update-data", web::get().to(handlers::update_data))
                .route("/product/{sku}", web::get().to(handlers::get_product)),
        );
}
