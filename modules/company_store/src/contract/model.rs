use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

/// An employee account. Balance changes only through the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub coin_balance: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionKind {
    Transfer,
    Purchase,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transfer => "transfer",
            Self::Purchase => "purchase",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "transfer" => Ok(Self::Transfer),
            "purchase" => Ok(Self::Purchase),
            other => Err(format!("unknown transaction kind '{other}'")),
        }
    }
}

/// Append-only ledger entry. `to_user` is `None` for purchases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub id: i64,
    pub from_user: i64,
    pub to_user: Option<i64>,
    pub amount: i64,
    pub kind: TransactionKind,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Merch {
    pub id: i64,
    pub name: String,
    pub price: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Purchase {
    pub id: i64,
    pub user_id: i64,
    pub merch_id: i64,
    pub merch_name: String,
    pub quantity: i32,
    pub purchased_at: DateTime<Utc>,
}

/// One side of a transfer as seen by a participant: the other party's username.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferEntry {
    pub transaction_id: i64,
    pub counterparty: String,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferHistory {
    pub incoming: Vec<TransferEntry>,
    pub outgoing: Vec<TransferEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryItem {
    pub name: String,
    pub quantity: i64,
}

/// Everything `/info` reports for one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wallet {
    pub coins: i64,
    pub inventory: Vec<InventoryItem>,
    pub history: TransferHistory,
}
