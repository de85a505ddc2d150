use anyhow::anyhow;

use crate::contract::model::{Merch, Purchase, Transaction, TransactionKind, User};
use crate::domain::repo::UserCredentials;
use crate::infra::storage::entity::{merch, purchases, transactions, users};

pub fn user_to_contract(m: users::Model) -> User {
    User {
        id: m.id,
        username: m.username,
        coin_balance: m.coin_balance,
        created_at: m.created_at,
    }
}

pub fn user_to_credentials(m: users::Model) -> UserCredentials {
    let password_hash = m.password_hash.clone();
    UserCredentials {
        user: user_to_contract(m),
        password_hash,
    }
}

pub fn transaction_to_contract(m: transactions::Model) -> anyhow::Result<Transaction> {
    let kind = m
        .kind
        .parse::<TransactionKind>()
        .map_err(|e| anyhow!("transaction {}: {e}", m.id))?;
    Ok(Transaction {
        id: m.id,
        from_user: m.from_user,
        to_user: m.to_user,
        amount: m.amount,
        kind,
        created_at: m.created_at,
    })
}

pub fn merch_to_contract(m: merch::Model) -> Merch {
    Merch {
        id: m.id,
        name: m.name,
        price: m.price,
    }
}

pub fn purchase_to_contract(m: purchases::Model, merch_name: String) -> Purchase {
    Purchase {
        id: m.id,
        user_id: m.user_id,
        merch_id: m.merch_id,
        merch_name,
        quantity: m.quantity,
        purchased_at: m.purchased_at,
    }
}
