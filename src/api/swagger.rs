use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Wallet Service API",
        version = "1.0.0",
        description = "Complete API documentation for the Wallet Service. \n\n**Authentication:** Wallet endpoints require JWT Bearer token authentication.\n\n**Features:**\n- Username/password registration and login\n- Wallet recharge with cashback\n- Wallet-to-wallet transfers\n- Transaction and cashback history\n- Health monitoring and metrics",
        contact(
            name = "Wallet Service Team",
            email = "support@wallet-service.com"
        )
    ),
    paths(
        // Auth endpoints
        crate::api::auth::register,
        crate::api::auth::login,
        crate::api::auth::verify_token,
        crate::api::auth::get_me,

        // Wallet endpoints
        crate::api::wallet::recharge,
        crate::api::wallet::transfer,
        crate::api::wallet::view_statement,
        crate::api::wallet::get_transactions,
        crate::api::wallet::get_cashbacks,

        // Health & Metrics
        crate::api::health::health_check,
        crate::api::metrics::get_metrics,
    ),
    components(
        schemas(
            // Auth
            crate::services::auth_service::RegisterRequest,
            crate::services::auth_service::LoginRequest,
            crate::services::auth_service::RefreshTokenRequest,
            crate::services::auth_service::AuthResponse,
            crate::models::UserInfo,

            // Wallet
            crate::services::wallet_service::RechargeRequest,
            crate::services::wallet_service::RechargeResponse,
            crate::services::wallet_service::TransferRequest,
            crate::services::wallet_service::TransferResponse,
            crate::models::StatementResponse,
            crate::models::TransactionInfo,
            crate::models::TransactionType,
            crate::models::TransactionsResponse,

            // Health & Metrics
            crate::api::health::HealthResponse,
            crate::api::metrics::MetricsResponse,
        )
    ),
    tags(
        (name = "Auth", description = "Authentication and user management endpoints. Username/password login with JWT bearer tokens."),
        (name = "Wallet", description = "Wallet operations: recharge with cashback, transfers between users, statements and history."),
        (name = "Health", description = "Health check and system metrics endpoints for monitoring service status."),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Enter your JWT token"))
                        .build(),
                ),
            );
        }
    }
}
