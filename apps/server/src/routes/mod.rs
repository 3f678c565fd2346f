use actix_web::web;

mod health;
mod status;

pub use health::health_route;
pub use status::server_status_route;

/// Register every route of the status server
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(health_route).service(server_status_route);
}
