use crate::services::auth_service::Claims;
use crate::services::email_service::EmailService;
use crate::services::wallet_service::{
    self, RechargeRequest, RechargeResponse, TransferRequest, TransferResponse,
};
use crate::services::transaction_service;
use crate::utils::error::WalletError;
use crate::{database::MongoDB, models::{StatementResponse, TransactionsResponse}};
use actix_web::{web, HttpMessage, HttpRequest, HttpResponse};

fn claims_from_request(req: &HttpRequest) -> Result<Claims, HttpResponse> {
    req.extensions().get::<Claims>().cloned().ok_or_else(|| {
        HttpResponse::Unauthorized().json(serde_json::json!({
            "success": false,
            "error": "Missing authentication"
        }))
    })
}

fn wallet_error_response(e: &WalletError) -> HttpResponse {
    let body = serde_json::json!({
        "success": false,
        "error": e.to_string()
    });

    match e {
        WalletError::InvalidRequest(_) | WalletError::InsufficientFunds => {
            HttpResponse::BadRequest().json(body)
        }
        WalletError::UserNotFound(_) => HttpResponse::NotFound().json(body),
        WalletError::Conflict => HttpResponse::Conflict().json(body),
        WalletError::DatabaseError(_) => HttpResponse::InternalServerError().json(body),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/wallet/recharge",
    tag = "Wallet",
    request_body = RechargeRequest,
    responses(
        (status = 200, description = "Recharge successful", body = RechargeResponse),
        (status = 400, description = "Invalid amount"),
        (status = 409, description = "Concurrent balance update, retry")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn recharge(
    db: web::Data<MongoDB>,
    mailer: web::Data<EmailService>,
    req: HttpRequest,
    request: web::Json<RechargeRequest>,
) -> HttpResponse {
    let claims = match claims_from_request(&req) {
        Ok(claims) => claims,
        Err(resp) => return resp,
    };

    log::info!(
        "💰 POST /wallet/recharge - user: {}, amount: {}",
        claims.username,
        request.amount
    );

    match wallet_service::recharge(&db, &mailer, &claims.sub, request.amount).await {
        Ok(response) => {
            log::info!(
                "✅ Recharge successful for {}: new balance {}",
                claims.username,
                response.new_balance
            );
            HttpResponse::Ok().json(response)
        }
        Err(e) => {
            log::warn!("❌ Recharge failed for {}: {}", claims.username, e);
            wallet_error_response(&e)
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/wallet/transfer",
    tag = "Wallet",
    request_body = TransferRequest,
    responses(
        (status = 200, description = "Transfer successful", body = TransferResponse),
        (status = 400, description = "Invalid request or insufficient funds"),
        (status = 404, description = "Recipient not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn transfer(
    db: web::Data<MongoDB>,
    mailer: web::Data<EmailService>,
    req: HttpRequest,
    request: web::Json<TransferRequest>,
) -> HttpResponse {
    let claims = match claims_from_request(&req) {
        Ok(claims) => claims,
        Err(resp) => return resp,
    };

    log::info!(
        "💸 POST /wallet/transfer - from: {}, to: {}, amount: {}",
        claims.username,
        request.to_username,
        request.amount
    );

    match wallet_service::transfer(&db, &mailer, &claims.sub, &request).await {
        Ok(response) => {
            log::info!(
                "✅ Transfer successful: {} -> {}",
                claims.username,
                response.to_username
            );
            HttpResponse::Ok().json(response)
        }
        Err(e) => {
            log::warn!("❌ Transfer failed for {}: {}", claims.username, e);
            wallet_error_response(&e)
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/wallet/statement",
    tag = "Wallet",
    responses(
        (status = 200, description = "Current balance and profile", body = StatementResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn view_statement(db: web::Data<MongoDB>, req: HttpRequest) -> HttpResponse {
    let claims = match claims_from_request(&req) {
        Ok(claims) => claims,
        Err(resp) => return resp,
    };

    log::info!("📄 GET /wallet/statement - user: {}", claims.username);

    match wallet_service::view_statement(&db, &claims.sub).await {
        Ok(user) => HttpResponse::Ok().json(StatementResponse {
            success: true,
            user,
        }),
        Err(e) => {
            log::warn!("❌ Statement failed for {}: {}", claims.username, e);
            wallet_error_response(&e)
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/wallet/transactions/{username}",
    tag = "Wallet",
    params(
        ("username" = String, Path, description = "Username whose history to list")
    ),
    responses(
        (status = 200, description = "Transaction history", body = TransactionsResponse),
        (status = 403, description = "Not the authenticated user")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_transactions(
    db: web::Data<MongoDB>,
    req: HttpRequest,
    path: web::Path<String>,
) -> HttpResponse {
    let claims = match claims_from_request(&req) {
        Ok(claims) => claims,
        Err(resp) => return resp,
    };

    let username = path.into_inner();
    log::info!("📜 GET /wallet/transactions/{}", username);

    // Only your own history
    if claims.username != username {
        return HttpResponse::Forbidden().json(serde_json::json!({
            "success": false,
            "error": "Forbidden: You are not authorized to view these transactions"
        }));
    }

    match transaction_service::get_transactions_by_user_id(&db, &claims.sub).await {
        Ok(transactions) => {
            let count = transactions.len();
            HttpResponse::Ok().json(TransactionsResponse {
                success: true,
                transactions,
                count,
            })
        }
        Err(e) => {
            log::error!("❌ Failed to list transactions for {}: {}", username, e);
            wallet_error_response(&e)
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/wallet/cashbacks/{username}",
    tag = "Wallet",
    params(
        ("username" = String, Path, description = "Username whose cashbacks to list")
    ),
    responses(
        (status = 200, description = "Cashback history", body = TransactionsResponse),
        (status = 403, description = "Not the authenticated user")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_cashbacks(
    db: web::Data<MongoDB>,
    req: HttpRequest,
    path: web::Path<String>,
) -> HttpResponse {
    let claims = match claims_from_request(&req) {
        Ok(claims) => claims,
        Err(resp) => return resp,
    };

    let username = path.into_inner();
    log::info!("🎁 GET /wallet/cashbacks/{}", username);

    if claims.username != username {
        return HttpResponse::Forbidden().json(serde_json::json!({
            "success": false,
            "error": "Forbidden: You are not authorized to view cashback data"
        }));
    }

    match transaction_service::get_cashbacks_by_user_id(&db, &claims.sub).await {
        Ok(transactions) => {
            let count = transactions.len();
            HttpResponse::Ok().json(TransactionsResponse {
                success: true,
                transactions,
                count,
            })
        }
        Err(e) => {
            log::error!("❌ Failed to list cashbacks for {}: {}", username, e);
            wallet_error_response(&e)
        }
    }
}
