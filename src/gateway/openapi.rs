//! OpenAPI / Swagger UI Documentation
//!
//! - Swagger UI: `http://localhost:3000/docs`
//! - OpenAPI JSON: `http://localhost:3000/api-docs/openapi.json`

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::gateway::handlers::HealthResponse;
use crate::gateway::types::ResponseMeta;
use crate::transfer::{
    TransactionHistory, TransactionRecord, TransactionStatus, TransferApiRequest,
    TransferApiResponse, api::AmbiguousTransferData,
};

/// Bearer JWT issued by the login flow
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Main API Documentation struct
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Cha Ching Transfer API",
        version = "1.0.0",
        description = "Cross-exchange transfers between users whose funds are held on Binance or Coinbase."
    ),
    servers(
        (url = "http://localhost:3000", description = "Development"),
    ),
    paths(
        crate::gateway::handlers::health::health_check,
        crate::gateway::handlers::transfer::create_transfer,
        crate::gateway::handlers::transfer::get_history,
    ),
    components(
        schemas(
            HealthResponse,
            ResponseMeta,
            TransferApiRequest,
            TransferApiResponse,
            AmbiguousTransferData,
            TransactionHistory,
            TransactionRecord,
            TransactionStatus,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "System", description = "Health checks"),
        (name = "Transaction", description = "Transfers and history")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use utoipa::OpenApi;

    #[test]
    fn test_openapi_spec_generates() {
        let spec = ApiDoc::openapi();
        assert_eq!(spec.info.title, "Cha Ching Transfer API");
        assert_eq!(spec.info.version, "1.0.0");
    }

    #[test]
    fn test_endpoints_registered() {
        let spec = ApiDoc::openapi();
        let paths = spec.paths;
        assert!(paths.paths.contains_key("/api/v1/health"));
        assert!(paths.paths.contains_key("/transaction/transfer/{user_id}"));
        assert!(paths.paths.contains_key("/transaction/history/{user_id}"));
    }

    #[test]
    fn test_security_scheme_registered() {
        let spec = ApiDoc::openapi();
        let components = spec.components.expect("should have components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
        assert!(components.schemas.contains_key("TransferApiRequest"));
    }
}
