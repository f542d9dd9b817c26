// HTTP request handlers for API endpoints

use crate::api::models::*;
use crate::api::server::AppState;
use crate::database_ops::lookup;
use crate::sync;
use actix_web::http::header::ContentType;
use actix_web::{web, HttpResponse};

fn text(mut builder: actix_web::HttpResponseBuilder, body: impl Into<String>) -> HttpResponse {
    builder.content_type(ContentType::plaintext()).body(body.into())
}

/// Health check endpoint
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let database = if state.db.ping().await {
        "connected"
    } else {
        "disconnected"
    };

    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        database: database.to_string(),
    })
}

/// Run the full three-feed sync. Per-feed failures only show up in the logs.
pub async fn update_data(state: web::Data<AppState>) -> HttpResponse {
    tracing::info!("Data update requested");

    match sync::run_sync(&state.db, &state.config).await {
        Ok(report) => {
            if !report.is_complete() {
                tracing::warn!(failed = ?report.failed_feeds(), "sync finished with failed passes");
            }
            text(HttpResponse::Ok(), SYNC_OK)
        }
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "sync run aborted");
            text(
                HttpResponse::BadRequest(),
                format!("Error updating data: {e}"),
            )
        }
    }
}

/// Merged product view for one SKU
pub async fn get_product(path: web::Path<String>, state: web::Data<AppState>) -> HttpResponse {
    let sku = path.into_inner();

    match lookup::get_product_details(&state.db, &sku).await {
        Ok(Some(details)) => HttpResponse::Ok().json(details),
        Ok(None) => text(HttpResponse::NotFound(), PRODUCT_NOT_FOUND),
        Err(e) => text(
            HttpResponse::BadRequest(),
            format!("Error retrieving product: {e}"),
        ),
    }
}
