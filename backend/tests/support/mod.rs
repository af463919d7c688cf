//! Shared helpers for the integration suites.
//!
//! Integration tests compile as separate crates, so the app assembly and the
//! embedded database they share live here rather than in each suite.

use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, web};
use card_tracker::Trace;
use card_tracker::inbound::http::health::{HealthState, live, ready};
use card_tracker::inbound::http::routes;
use card_tracker::inbound::http::test_utils::test_session_middleware;
use card_tracker::test_support::InMemoryHarness;

pub mod embedded_postgres;

/// The production route table over `harness`, with a throwaway session key
/// and cookies that are not marked `Secure`.
pub fn test_app(
    harness: &InMemoryHarness,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    > + use<>,
> {
    let health = web::Data::new(HealthState::new());
    health.mark_ready();
    App::new()
        .app_data(health)
        .app_data(web::Data::new(harness.state.clone()))
        .wrap(Trace)
        .service(
            web::scope("/api/v1")
                .wrap(test_session_middleware())
                .configure(routes),
        )
        .service(ready)
        .service(live)
}
