use actix_web::http::header::{CacheControl, CacheDirective};
use actix_web::{HttpResponse, get, web};
use healthcheck::HealthEngine;

use crate::error::CycleFailure;

/// Run one health check cycle and return the system report
///
/// A client disconnecting mid-cycle drops the cycle and with it every
/// outstanding probe.
#[get("/api/server-status")]
pub async fn server_status_route(engine: web::Data<HealthEngine>) -> Result<HttpResponse, CycleFailure> {
    let report = engine.run_cycle().await?;

    Ok(HttpResponse::Ok()
        .insert_header(CacheControl(vec![CacheDirective::NoStore]))
        .json(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use healthcheck::{EngineSettings, FileRegistry, StaticRegistry};
    use serde_json::Value;
    use std::sync::Arc;

    #[actix_web::test]
    async fn test_empty_registry_reports_healthy() {
        let registry = Arc::new(StaticRegistry::new(Vec::new()).unwrap());
        let engine = HealthEngine::new(registry, EngineSettings::default()).unwrap();
        let app = test::init_service(
            App::new().app_data(web::Data::new(engine)).service(server_status_route),
        )
        .await;

        let request = test::TestRequest::get().uri("/api/server-status").to_request();
        let response = test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("cache-control").and_then(|v| v.to_str().ok()),
            Some("no-store")
        );

        let body: Value = test::read_body_json(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["servers"], serde_json::json!([]));
        assert_eq!(body["summary"]["total"], 0);
        assert_eq!(body["summary"]["online"], 0);
        assert_eq!(body["summary"]["degraded"], 0);
        assert_eq!(body["summary"]["offline"], 0);
    }

    #[actix_web::test]
    async fn test_cycle_failure_is_service_unavailable() {
        let registry = Arc::new(FileRegistry::new("/nonexistent/uppe/endpoints.toml"));
        let engine = HealthEngine::new(registry, EngineSettings::default()).unwrap();
        let app = test::init_service(
            App::new().app_data(web::Data::new(engine)).service(server_status_route),
        )
        .await;

        let request = test::TestRequest::get().uri("/api/server-status").to_request();
        let response = test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body: Value = test::read_body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("registry"));
    }
}
