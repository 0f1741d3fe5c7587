use crate::{
    database::MongoDB,
    models::{TransactionType, User, UserInfo},
    services::{auth_service, email_service::EmailService, transaction_service},
    utils::error::WalletError,
};
use mongodb::bson::doc;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct RechargeRequest {
    pub amount: f64,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct RechargeResponse {
    pub success: bool,
    pub cashback_amount: i64,
    pub new_balance: f64,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct TransferRequest {
    pub to_username: String,
    pub amount: f64,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct TransferResponse {
    pub success: bool,
    pub amount: f64,
    pub to_username: String,
    pub new_balance: f64,
}

fn cashback_bounds() -> (f64, f64) {
    let lower = std::env::var("CASHBACK_LOWER_PERCENT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(5.0);
    let upper = std::env::var("CASHBACK_UPPER_PERCENT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(10.0);
    (lower, upper)
}

/// Cashback in whole units for a recharge. `roll` is a uniform draw in
/// [0, 1); the percentage lands in [lower, upper].
pub fn cashback_units(amount: f64, lower: f64, upper: f64, roll: f64) -> i64 {
    let pct = lower + roll * (upper - lower);
    (amount * pct / 100.0).round() as i64
}

fn validate_amount(amount: f64) -> Result<(), WalletError> {
    if !amount.is_finite() || amount < 1.0 {
        return Err(WalletError::InvalidRequest(
            "Amount must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

async fn find_user_by_id(db: &MongoDB, user_id: &str) -> Result<User, WalletError> {
    let collection = db.collection::<User>("users");

    collection
        .find_one(doc! { "user_id": user_id })
        .await
        .map_err(|e| WalletError::DatabaseError(e.to_string()))?
        .ok_or_else(|| WalletError::UserNotFound(format!("No user found for userId: {}", user_id)))
}

/// Applies a balance delta guarded by the optimistic-lock version. The
/// filter carries the version the caller read; a miss means someone else
/// wrote first.
async fn apply_balance_delta(
    db: &MongoDB,
    user_id: &str,
    expected_version: i64,
    delta: f64,
    extra_filter: Option<mongodb::bson::Document>,
) -> Result<(), WalletError> {
    let collection = db.collection::<User>("users");

    let mut filter = doc! { "user_id": user_id, "version": expected_version };
    if let Some(extra) = extra_filter {
        filter.extend(extra);
    }

    let result = collection
        .update_one(
            filter,
            doc! { "$inc": { "wallet_balance": delta, "version": 1 } },
        )
        .await
        .map_err(|e| WalletError::DatabaseError(e.to_string()))?;

    if result.modified_count == 0 {
        log::error!(
            "Optimistic locking failure when updating balance for user {}",
            user_id
        );
        return Err(WalletError::Conflict);
    }

    Ok(())
}

/// Credits the wallet, draws a cashback percentage and credits that too
/// when it rounds to a positive whole amount, then records the ledger
/// entries and kicks off the notification email.
pub async fn recharge(
    db: &MongoDB,
    mailer: &EmailService,
    user_id: &str,
    amount: f64,
) -> Result<RechargeResponse, WalletError> {
    validate_amount(amount)?;

    let user = find_user_by_id(db, user_id).await?;
    log::info!(
        "💰 Current balance for userId {}: {}",
        user_id,
        user.wallet_balance
    );

    apply_balance_delta(db, user_id, user.version, amount, None).await?;
    let mut new_balance = user.wallet_balance + amount;

    let (lower, upper) = cashback_bounds();
    let roll: f64 = rand::thread_rng().gen();
    let cashback = cashback_units(amount, lower, upper, roll);

    if cashback > 0 {
        apply_balance_delta(db, user_id, user.version + 1, cashback as f64, None).await?;
        new_balance += cashback as f64;

        transaction_service::record_transaction(
            db,
            mailer,
            &user,
            cashback as f64,
            TransactionType::Cashback,
            &user,
            0,
        )
        .await?;
        log::info!("🎁 Cashback of {} applied for userId {}", cashback, user_id);
    } else {
        log::info!("No cashback applied for userId {}", user_id);
    }

    transaction_service::record_transaction(
        db,
        mailer,
        &user,
        amount,
        TransactionType::Recharge,
        &user,
        cashback,
    )
    .await?;

    Ok(RechargeResponse {
        success: true,
        cashback_amount: cashback,
        new_balance,
    })
}

/// Moves money between two wallets and writes a ledger entry for each
/// side. The debit filter re-checks the balance so the wallet can never
/// go negative even under concurrent transfers.
pub async fn transfer(
    db: &MongoDB,
    mailer: &EmailService,
    sender_user_id: &str,
    request: &TransferRequest,
) -> Result<TransferResponse, WalletError> {
    validate_amount(request.amount)?;

    let sender = find_user_by_id(db, sender_user_id).await?;

    if sender
        .username
        .eq_ignore_ascii_case(request.to_username.trim())
    {
        return Err(WalletError::InvalidRequest(
            "Cannot transfer money to yourself".to_string(),
        ));
    }

    let receiver = auth_service::find_user_by_username(db, request.to_username.trim())
        .await
        .map_err(WalletError::DatabaseError)?
        .ok_or_else(|| {
            WalletError::UserNotFound(format!(
                "Wallet not found for username {}",
                request.to_username
            ))
        })?;

    if sender.wallet_balance < request.amount {
        return Err(WalletError::InsufficientFunds);
    }

    // Debit only if the balance still covers the amount
    apply_balance_delta(
        db,
        &sender.user_id,
        sender.version,
        -request.amount,
        Some(doc! { "wallet_balance": { "$gte": request.amount } }),
    )
    .await?;

    apply_balance_delta(db, &receiver.user_id, receiver.version, request.amount, None).await?;

    transaction_service::record_transaction(
        db,
        mailer,
        &sender,
        request.amount,
        TransactionType::Sent,
        &receiver,
        0,
    )
    .await?;

    transaction_service::record_transaction(
        db,
        mailer,
        &sender,
        request.amount,
        TransactionType::Received,
        &receiver,
        0,
    )
    .await?;

    log::info!(
        "💸 Transfer of {} from {} to {} completed",
        request.amount,
        sender.username,
        receiver.username
    );

    Ok(TransferResponse {
        success: true,
        amount: request.amount,
        to_username: receiver.username,
        new_balance: sender.wallet_balance - request.amount,
    })
}

pub async fn view_statement(db: &MongoDB, user_id: &str) -> Result<UserInfo, WalletError> {
    let user = find_user_by_id(db, user_id).await?;
    Ok(UserInfo::from(&user))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cashback_hits_lower_bound_at_roll_zero() {
        // 5% of 1000 = 50
        assert_eq!(cashback_units(1000.0, 5.0, 10.0, 0.0), 50);
    }

    #[test]
    fn cashback_approaches_upper_bound() {
        // ~10% of 1000 = 100
        assert_eq!(cashback_units(1000.0, 5.0, 10.0, 0.9999), 100);
    }

    #[test]
    fn cashback_rounds_to_whole_units() {
        // 5% of 50 = 2.5 -> rounds away from zero
        assert_eq!(cashback_units(50.0, 5.0, 10.0, 0.0), 3);
    }

    #[test]
    fn tiny_recharge_earns_no_cashback() {
        // 5% of 1 = 0.05 -> rounds to 0, nothing credited
        assert_eq!(cashback_units(1.0, 5.0, 10.0, 0.0), 0);
    }

    #[test]
    fn cashback_stays_within_bounds_for_random_rolls() {
        for i in 0..100 {
            let roll = i as f64 / 100.0;
            let cb = cashback_units(200.0, 5.0, 10.0, roll);
            assert!((10..=20).contains(&cb), "cashback {} out of range", cb);
        }
    }

    #[test]
    fn amounts_below_one_are_rejected() {
        assert!(validate_amount(0.0).is_err());
        assert!(validate_amount(0.99).is_err());
        assert!(validate_amount(-5.0).is_err());
        assert!(validate_amount(f64::NAN).is_err());
        assert!(validate_amount(1.0).is_ok());
        assert!(validate_amount(250.0).is_ok());
    }
}
