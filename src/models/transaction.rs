use chrono::{DateTime, TimeZone, Utc};
use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of ledger entry. Stored lowercase in MongoDB.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Recharge,
    Cashback,
    Sent,
    Received,
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransactionType::Recharge => "recharge",
            TransactionType::Cashback => "cashback",
            TransactionType::Sent => "sent",
            TransactionType::Received => "received",
        };
        write!(f, "{}", s)
    }
}

impl TransactionType {
    /// Recharge and cashback entries have no counterparty sender.
    pub fn has_sender(&self) -> bool {
        matches!(self, TransactionType::Sent | TransactionType::Received)
    }
}

/// Ledger document as stored in the `transactions` collection.
///
/// For `received` entries `user_id` is the receiver's id, so both parties
/// of a transfer see the movement in their own statement.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Transaction {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,
    pub transaction_id: String,
    pub user_id: String,
    pub amount: f64,
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    pub timestamp: BsonDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receiver_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receiver_username: Option<String>,
}

/// API view of a transaction.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct TransactionInfo {
    pub id: String,
    pub user_id: String,
    pub amount: f64,
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    pub timestamp: DateTime<Utc>,
    pub sender_id: Option<String>,
    pub sender_username: Option<String>,
    pub receiver_id: Option<String>,
    pub receiver_username: Option<String>,
}

impl From<&Transaction> for TransactionInfo {
    fn from(tx: &Transaction) -> Self {
        TransactionInfo {
            id: tx.transaction_id.clone(),
            user_id: tx.user_id.clone(),
            amount: tx.amount,
            tx_type: tx.tx_type,
            timestamp: Utc
                .timestamp_millis_opt(tx.timestamp.timestamp_millis())
                .single()
                .unwrap_or_default(),
            sender_id: tx.sender_id.clone(),
            sender_username: tx.sender_username.clone(),
            receiver_id: tx.receiver_id.clone(),
            receiver_username: tx.receiver_username.clone(),
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct TransactionsResponse {
    pub success: bool,
    pub transactions: Vec<TransactionInfo>,
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recharge_and_cashback_have_no_sender() {
        assert!(!TransactionType::Recharge.has_sender());
        assert!(!TransactionType::Cashback.has_sender());
        assert!(TransactionType::Sent.has_sender());
        assert!(TransactionType::Received.has_sender());
    }

    #[test]
    fn transaction_type_serializes_lowercase() {
        let json = serde_json::to_string(&TransactionType::Cashback).unwrap();
        assert_eq!(json, "\"cashback\"");
        assert_eq!(TransactionType::Sent.to_string(), "sent");
    }
}
