//! HTTP inbound adapter exposing the `/api/v1` REST surface and the health
//! checks.

pub mod auth;
pub mod controller;
pub mod error;
pub mod exchange;
pub mod health;
pub mod items;
pub mod items_dto;
pub mod response;
pub mod schemas;
pub mod session;
pub mod session_config;
pub mod state;
#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
pub mod trace;

use actix_web::web;

pub use error::ApiResult;

/// Register the JSON and query extractor configuration and every `/api/v1`
/// endpoint on `cfg`. The caller supplies the scope, its session middleware
/// and the [`state::HttpState`] data.
///
/// # Examples
/// ```
/// use actix_web::{App, web};
/// use card_tracker::inbound::http::routes;
///
/// let app = App::new().service(web::scope("/api/v1").configure(routes));
/// ```
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(controller::json_config())
        .app_data(controller::query_config())
        .service(items::list_items)
        .service(items::add_item)
        .service(items::get_item)
        .service(items::update_item)
        .service(items::remove_item)
        .service(auth::sign_in)
        .service(auth::current_session)
        .service(auth::sign_out)
        .service(exchange::dispatch_exchange);
}
