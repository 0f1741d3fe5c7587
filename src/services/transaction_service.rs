use crate::{
    database::MongoDB,
    models::{Transaction, TransactionInfo, TransactionType, User},
    services::email_service::EmailService,
    utils::error::WalletError,
};
use mongodb::bson::{doc, oid::ObjectId, DateTime as BsonDateTime};

const COLLECTION: &str = "transactions";

/// Builds a ledger entry following the ownership rules:
/// recharge/cashback entries carry no sender, and a `received` entry is
/// owned by the receiver so it shows up in their statement.
pub fn build_transaction(
    actor_id: &str,
    actor_username: &str,
    amount: f64,
    tx_type: TransactionType,
    receiver_id: &str,
    receiver_username: &str,
) -> Transaction {
    let owner_id = if tx_type == TransactionType::Received {
        receiver_id.to_string()
    } else {
        actor_id.to_string()
    };

    let (sender_id, sender_username) = if tx_type.has_sender() {
        (Some(actor_id.to_string()), Some(actor_username.to_string()))
    } else {
        (None, None)
    };

    Transaction {
        _id: None,
        transaction_id: ObjectId::new().to_hex(),
        user_id: owner_id,
        amount,
        tx_type,
        timestamp: BsonDateTime::now(),
        sender_id,
        sender_username,
        receiver_id: Some(receiver_id.to_string()),
        receiver_username: Some(receiver_username.to_string()),
    }
}

/// Persists a ledger entry and dispatches the matching notification email.
/// For recharge/cashback the actor and receiver are the same user.
pub async fn record_transaction(
    db: &MongoDB,
    mailer: &EmailService,
    actor: &User,
    amount: f64,
    tx_type: TransactionType,
    receiver: &User,
    cashback: i64,
) -> Result<TransactionInfo, WalletError> {
    let transaction = build_transaction(
        &actor.user_id,
        &actor.username,
        amount,
        tx_type,
        &receiver.user_id,
        &receiver.username,
    );

    let collection = db.collection::<Transaction>(COLLECTION);
    collection
        .insert_one(&transaction)
        .await
        .map_err(|e| WalletError::DatabaseError(e.to_string()))?;

    match tx_type {
        TransactionType::Recharge => {
            mailer.send_recharge_email(&actor.email, amount, cashback);
        }
        TransactionType::Sent => {
            mailer.send_transfer_emails(
                &actor.email,
                &actor.username,
                &receiver.email,
                &receiver.username,
                amount,
            );
        }
        // Cashback rides along with the recharge email; the received
        // entry is covered by the transfer notification pair.
        TransactionType::Cashback | TransactionType::Received => {}
    }

    Ok(TransactionInfo::from(&transaction))
}

async fn list_transactions(
    db: &MongoDB,
    filter: mongodb::bson::Document,
) -> Result<Vec<TransactionInfo>, WalletError> {
    let collection = db.collection::<Transaction>(COLLECTION);

    let options = mongodb::options::FindOptions::builder()
        .sort(doc! { "timestamp": -1 })
        .build();

    let mut cursor = collection
        .find(filter)
        .with_options(options)
        .await
        .map_err(|e| WalletError::DatabaseError(e.to_string()))?;

    let mut transactions = Vec::new();
    use futures::stream::StreamExt;

    while let Some(result) = cursor.next().await {
        match result {
            Ok(tx) => transactions.push(TransactionInfo::from(&tx)),
            Err(e) => log::error!("Error reading transaction: {}", e),
        }
    }

    Ok(transactions)
}

pub async fn get_transactions_by_user_id(
    db: &MongoDB,
    user_id: &str,
) -> Result<Vec<TransactionInfo>, WalletError> {
    list_transactions(db, doc! { "user_id": user_id }).await
}

pub async fn get_cashbacks_by_user_id(
    db: &MongoDB,
    user_id: &str,
) -> Result<Vec<TransactionInfo>, WalletError> {
    list_transactions(
        db,
        doc! { "user_id": user_id, "type": TransactionType::Cashback.to_string() },
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recharge_entry_has_no_sender_and_belongs_to_actor() {
        let tx = build_transaction(
            "u1",
            "alice",
            100.0,
            TransactionType::Recharge,
            "u1",
            "alice",
        );

        assert_eq!(tx.user_id, "u1");
        assert!(tx.sender_id.is_none());
        assert!(tx.sender_username.is_none());
        assert_eq!(tx.receiver_username.as_deref(), Some("alice"));
    }

    #[test]
    fn cashback_entry_has_no_sender() {
        let tx = build_transaction("u1", "alice", 7.0, TransactionType::Cashback, "u1", "alice");
        assert!(tx.sender_id.is_none());
        assert_eq!(tx.tx_type, TransactionType::Cashback);
    }

    #[test]
    fn sent_entry_belongs_to_sender() {
        let tx = build_transaction("u1", "alice", 50.0, TransactionType::Sent, "u2", "bob");

        assert_eq!(tx.user_id, "u1");
        assert_eq!(tx.sender_id.as_deref(), Some("u1"));
        assert_eq!(tx.sender_username.as_deref(), Some("alice"));
        assert_eq!(tx.receiver_id.as_deref(), Some("u2"));
    }

    #[test]
    fn received_entry_belongs_to_receiver() {
        let tx = build_transaction("u1", "alice", 50.0, TransactionType::Received, "u2", "bob");

        // Owned by the receiver so it lands in bob's statement
        assert_eq!(tx.user_id, "u2");
        assert_eq!(tx.sender_username.as_deref(), Some("alice"));
        assert_eq!(tx.receiver_username.as_deref(), Some("bob"));
    }
}
