use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::contract::model::{TransferEntry, Wallet};

/// Login request. Missing fields deserialize as empty and are rejected by validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct AuthRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendCoinRequest {
    #[serde(default)]
    pub to_user: String,
    #[serde(default)]
    pub amount: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InfoResponse {
    pub coins: i64,
    pub inventory: Vec<InventoryItemDto>,
    pub coin_history: CoinHistoryDto,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InventoryItemDto {
    #[serde(rename = "type")]
    pub item_type: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CoinHistoryDto {
    pub received: Vec<ReceivedCoinDto>,
    pub sent: Vec<SentCoinDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReceivedCoinDto {
    pub from_user: String,
    pub amount: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SentCoinDto {
    pub to_user: String,
    pub amount: i64,
}

impl From<TransferEntry> for ReceivedCoinDto {
    fn from(e: TransferEntry) -> Self {
        Self {
            from_user: e.counterparty,
            amount: e.amount,
        }
    }
}

impl From<TransferEntry> for SentCoinDto {
    fn from(e: TransferEntry) -> Self {
        Self {
            to_user: e.counterparty,
            amount: e.amount,
        }
    }
}

impl From<Wallet> for InfoResponse {
    fn from(w: Wallet) -> Self {
        Self {
            coins: w.coins,
            inventory: w
                .inventory
                .into_iter()
                .map(|i| InventoryItemDto {
                    item_type: i.name,
                    quantity: i.quantity,
                })
                .collect(),
            coin_history: CoinHistoryDto {
                received: w.history.incoming.into_iter().map(Into::into).collect(),
                sent: w.history.outgoing.into_iter().map(Into::into).collect(),
            },
        }
    }
}
