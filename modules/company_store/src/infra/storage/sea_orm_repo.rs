//! SeaORM-backed implementations of the domain ports.
//!
//! Read-only repositories are generic over `C: ConnectionTrait`, so they work on a
//! `DatabaseConnection` or inside a transaction. The ledger additionally needs
//! `TransactionTrait` because every mutation opens its own transaction.

use std::collections::{HashMap, HashSet};

use anyhow::{anyhow, Context};
use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DbBackend, EntityTrait,
    NotSet, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};

use crate::contract::model::{Merch, Purchase, Transaction, TransactionKind, TransferEntry, User};
use crate::domain::repo::{
    CatalogRepository, Debit, InsertUserError, LedgerError, LedgerRepository, NewUser,
    PurchaseLine, PurchasesRepository, UserCredentials, UsersRepository,
};
use crate::infra::storage::entity::{merch, purchases, transactions, users};
use crate::infra::storage::mapper;

// ---------------------------------------------------------------------------
// users
// ---------------------------------------------------------------------------

pub struct SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

#[async_trait::async_trait]
impl<C> UsersRepository for SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<User>> {
        let found = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("find_by_id failed")?;
        Ok(found.map(mapper::user_to_contract))
    }

    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<UserCredentials>> {
        let found = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("find_by_username failed")?;
        Ok(found.map(mapper::user_to_credentials))
    }

    async fn insert(&self, new_user: NewUser) -> Result<User, InsertUserError> {
        let m = users::ActiveModel {
            id: NotSet,
            username: Set(new_user.username),
            password_hash: Set(new_user.password_hash),
            coin_balance: Set(new_user.coin_balance),
            created_at: Set(new_user.created_at),
        };
        match m.insert(&self.conn).await {
            Ok(row) => Ok(mapper::user_to_contract(row)),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(InsertUserError::UsernameTaken)
            }
            Err(e) => Err(anyhow::Error::new(e).context("insert user failed").into()),
        }
    }
}

// ---------------------------------------------------------------------------
// ledger
// ---------------------------------------------------------------------------

pub struct SeaOrmLedgerRepository<C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmLedgerRepository<C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

#[async_trait::async_trait]
impl<C> LedgerRepository for SeaOrmLedgerRepository<C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync + 'static,
{
    async fn transfer(
        &self,
        from: i64,
        to: i64,
        amount: i64,
        at: DateTime<Utc>,
    ) -> Result<Transaction, LedgerError> {
        let txn = self.conn.begin().await.context("begin transfer failed")?;

        let balances = lock_balances(&txn, &[from, to]).await?;
        let available = *balances
            .get(&from)
            .ok_or(LedgerError::UserNotFound(from))?;
        if !balances.contains_key(&to) {
            return Err(LedgerError::UserNotFound(to));
        }

        debit_balance(&txn, from, amount, available).await?;
        credit_balance(&txn, to, amount).await?;
        let entry = insert_entry(&txn, from, Some(to), amount, TransactionKind::Transfer, at).await?;

        txn.commit().await.context("commit transfer failed")?;
        Ok(mapper::transaction_to_contract(entry)?)
    }

    async fn debit(
        &self,
        payer: i64,
        amount: i64,
        at: DateTime<Utc>,
        line: Option<PurchaseLine>,
    ) -> Result<Debit, LedgerError> {
        let txn = self.conn.begin().await.context("begin debit failed")?;

        let balances = lock_balances(&txn, &[payer]).await?;
        let available = *balances
            .get(&payer)
            .ok_or(LedgerError::UserNotFound(payer))?;

        debit_balance(&txn, payer, amount, available).await?;
        let entry = insert_entry(&txn, payer, None, amount, TransactionKind::Purchase, at).await?;

        let purchase = match line {
            Some(line) => {
                let row = purchases::ActiveModel {
                    id: NotSet,
                    user_id: Set(payer),
                    merch_id: Set(line.merch.id),
                    quantity: Set(line.quantity),
                    purchased_at: Set(at),
                }
                .insert(&txn)
                .await
                .context("insert purchase failed")?;
                Some(mapper::purchase_to_contract(row, line.merch.name))
            }
            None => None,
        };

        txn.commit().await.context("commit debit failed")?;
        Ok(Debit {
            transaction: mapper::transaction_to_contract(entry)?,
            purchase,
        })
    }

    async fn incoming(&self, user: i64) -> anyhow::Result<Vec<TransferEntry>> {
        let rows = transfers_query()
            .filter(transactions::Column::ToUser.eq(user))
            .all(&self.conn)
            .await
            .context("incoming transfers query failed")?;
        transfer_entries(&self.conn, rows, |r| Some(r.from_user)).await
    }

    async fn outgoing(&self, user: i64) -> anyhow::Result<Vec<TransferEntry>> {
        let rows = transfers_query()
            .filter(transactions::Column::FromUser.eq(user))
            .all(&self.conn)
            .await
            .context("outgoing transfers query failed")?;
        transfer_entries(&self.conn, rows, |r| r.to_user).await
    }
}

/// Lock the given user rows in ascending id order and return their balances.
///
/// PostgreSQL takes `FOR UPDATE` row locks. SQLite has no row locks, so a no-op
/// write first acquires the database write lock for the rest of the transaction.
async fn lock_balances<C>(conn: &C, ids: &[i64]) -> anyhow::Result<HashMap<i64, i64>>
where
    C: ConnectionTrait,
{
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();

    if conn.get_database_backend() == DbBackend::Sqlite {
        users::Entity::update_many()
            .col_expr(
                users::Column::CoinBalance,
                Expr::col(users::Column::CoinBalance).into(),
            )
            .filter(users::Column::Id.is_in(ids.clone()))
            .exec(conn)
            .await
            .context("sqlite write lock failed")?;
    }

    let rows: Vec<(i64, i64)> = users::Entity::find()
        .select_only()
        .column(users::Column::Id)
        .column(users::Column::CoinBalance)
        .filter(users::Column::Id.is_in(ids))
        .order_by_asc(users::Column::Id)
        .lock_exclusive()
        .into_tuple()
        .all(conn)
        .await
        .context("lock user rows failed")?;

    Ok(rows.into_iter().collect())
}

/// Conditional decrement; the `coin_balance >= amount` guard holds even without the lock.
async fn debit_balance<C>(conn: &C, user: i64, amount: i64, available: i64) -> Result<(), LedgerError>
where
    C: ConnectionTrait,
{
    if available < amount {
        return Err(LedgerError::InsufficientFunds {
            requested: amount,
            available,
        });
    }

    let res = users::Entity::update_many()
        .col_expr(
            users::Column::CoinBalance,
            Expr::col(users::Column::CoinBalance).sub(amount),
        )
        .filter(users::Column::Id.eq(user))
        .filter(users::Column::CoinBalance.gte(amount))
        .exec(conn)
        .await
        .context("debit failed")?;

    if res.rows_affected != 1 {
        return Err(LedgerError::InsufficientFunds {
            requested: amount,
            available,
        });
    }
    Ok(())
}

async fn credit_balance<C>(conn: &C, user: i64, amount: i64) -> anyhow::Result<()>
where
    C: ConnectionTrait,
{
    let res = users::Entity::update_many()
        .col_expr(
            users::Column::CoinBalance,
            Expr::col(users::Column::CoinBalance).add(amount),
        )
        .filter(users::Column::Id.eq(user))
        .exec(conn)
        .await
        .context("credit failed")?;
    if res.rows_affected != 1 {
        return Err(anyhow!("credit touched {} rows", res.rows_affected));
    }
    Ok(())
}

async fn insert_entry<C>(
    conn: &C,
    from: i64,
    to: Option<i64>,
    amount: i64,
    kind: TransactionKind,
    at: DateTime<Utc>,
) -> anyhow::Result<transactions::Model>
where
    C: ConnectionTrait,
{
    transactions::ActiveModel {
        id: NotSet,
        from_user: Set(from),
        to_user: Set(to),
        amount: Set(amount),
        kind: Set(kind.as_str().to_owned()),
        created_at: Set(at),
    }
    .insert(conn)
    .await
    .context("insert transaction failed")
}

fn transfers_query() -> sea_orm::Select<transactions::Entity> {
    transactions::Entity::find()
        .filter(transactions::Column::Kind.eq(TransactionKind::Transfer.as_str()))
        .order_by_desc(transactions::Column::CreatedAt)
        .order_by_desc(transactions::Column::Id)
}

async fn transfer_entries<C>(
    conn: &C,
    rows: Vec<transactions::Model>,
    counterparty: fn(&transactions::Model) -> Option<i64>,
) -> anyhow::Result<Vec<TransferEntry>>
where
    C: ConnectionTrait,
{
    let ids: HashSet<i64> = rows.iter().filter_map(counterparty).collect();
    let names = usernames(conn, ids).await?;

    rows.into_iter()
        .map(|r| {
            let other = counterparty(&r).ok_or_else(|| anyhow!("transfer {} has no counterparty", r.id))?;
            let name = names
                .get(&other)
                .cloned()
                .ok_or_else(|| anyhow!("transfer {} references missing user {other}", r.id))?;
            Ok(TransferEntry {
                transaction_id: r.id,
                counterparty: name,
                amount: r.amount,
                created_at: r.created_at,
            })
        })
        .collect()
}

async fn usernames<C>(conn: &C, ids: HashSet<i64>) -> anyhow::Result<HashMap<i64, String>>
where
    C: ConnectionTrait,
{
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<(i64, String)> = users::Entity::find()
        .select_only()
        .column(users::Column::Id)
        .column(users::Column::Username)
        .filter(users::Column::Id.is_in(ids))
        .into_tuple()
        .all(conn)
        .await
        .context("username lookup failed")?;
    Ok(rows.into_iter().collect())
}

// ---------------------------------------------------------------------------
// catalog & purchases
// ---------------------------------------------------------------------------

pub struct SeaOrmCatalogRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmCatalogRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

#[async_trait::async_trait]
impl<C> CatalogRepository for SeaOrmCatalogRepository<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn find_by_name(&self, name: &str) -> anyhow::Result<Option<Merch>> {
        let found = merch::Entity::find()
            .filter(merch::Column::Name.eq(name))
            .one(&self.conn)
            .await
            .context("merch lookup failed")?;
        Ok(found.map(mapper::merch_to_contract))
    }
}

pub struct SeaOrmPurchasesRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmPurchasesRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

#[async_trait::async_trait]
impl<C> PurchasesRepository for SeaOrmPurchasesRepository<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn list_by_user(&self, user: i64) -> anyhow::Result<Vec<Purchase>> {
        let rows = purchases::Entity::find()
            .filter(purchases::Column::UserId.eq(user))
            .order_by_asc(purchases::Column::Id)
            .find_also_related(merch::Entity)
            .all(&self.conn)
            .await
            .context("purchases query failed")?;

        rows.into_iter()
            .map(|(p, m)| {
                let m = m.ok_or_else(|| anyhow!("purchase {} references missing merch", p.id))?;
                Ok(mapper::purchase_to_contract(p, m.name))
            })
            .collect()
    }
}
