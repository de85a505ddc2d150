//! The ledger: the only component that changes balances.
//!
//! Mutations are delegated to [`LedgerRepository`], which performs each one as a
//! single database transaction with the involved user rows locked in ascending id
//! order. Locking both sides of a transfer (not just the sender) keeps opposite
//! concurrent transfers (A pays B while B pays A) deadlock-free and serializes all
//! writers of a given balance. The whole unit is bounded by `tx_timeout`; when it
//! fires the transaction future is dropped and rolled back.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use crate::contract::model::{Merch, Purchase, Transaction, TransferHistory};
use crate::domain::error::DomainError;
use crate::domain::repo::{LedgerError, LedgerRepository, PurchaseLine};

#[derive(Clone)]
pub struct Ledger {
    repo: Arc<dyn LedgerRepository>,
    tx_timeout: Duration,
}

impl From<LedgerError> for DomainError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::InsufficientFunds {
                requested,
                available,
            } => DomainError::insufficient_funds(requested, available),
            LedgerError::UserNotFound(id) => DomainError::user_not_found(id),
            LedgerError::Storage(e) => DomainError::database(format!("{e:#}")),
        }
    }
}

impl Ledger {
    pub fn new(repo: Arc<dyn LedgerRepository>, tx_timeout: Duration) -> Self {
        Self { repo, tx_timeout }
    }

    #[instrument(name = "company_store.ledger.transfer", skip(self))]
    pub async fn transfer(&self, from: i64, to: i64, amount: i64) -> Result<Transaction, DomainError> {
        if from == to {
            return Err(DomainError::InvalidRecipient);
        }
        ensure_positive(amount)?;

        let tx = self
            .bounded(self.repo.transfer(from, to, amount, Utc::now()))
            .await?;
        info!(transaction_id = tx.id, "transfer committed");
        Ok(tx)
    }

    /// Debit without an inventory record; the entry has no recipient.
    #[instrument(name = "company_store.ledger.debit_for_purchase", skip(self))]
    pub async fn debit_for_purchase(&self, user: i64, amount: i64) -> Result<Transaction, DomainError> {
        ensure_positive(amount)?;
        let debit = self
            .bounded(self.repo.debit(user, amount, Utc::now(), None))
            .await?;
        info!(transaction_id = debit.transaction.id, "purchase debit committed");
        Ok(debit.transaction)
    }

    /// Debit and inventory record committed together.
    #[instrument(
        name = "company_store.ledger.settle_purchase",
        skip(self, merch),
        fields(merch = %merch.name)
    )]
    pub async fn settle_purchase(
        &self,
        user: i64,
        merch: &Merch,
        quantity: i32,
    ) -> Result<(Transaction, Purchase), DomainError> {
        if quantity <= 0 {
            return Err(DomainError::validation("quantity", "must be positive"));
        }
        let amount = merch
            .price
            .checked_mul(i64::from(quantity))
            .ok_or_else(|| DomainError::validation("quantity", "total cost overflows"))?;
        ensure_positive(amount)?;

        let line = PurchaseLine {
            merch: merch.clone(),
            quantity,
        };
        let debit = self
            .bounded(self.repo.debit(user, amount, Utc::now(), Some(line)))
            .await?;
        let purchase = debit
            .purchase
            .ok_or_else(|| DomainError::database("purchase row missing after debit"))?;
        info!(
            transaction_id = debit.transaction.id,
            purchase_id = purchase.id,
            "purchase committed"
        );
        Ok((debit.transaction, purchase))
    }

    /// Incoming and outgoing transfers, fetched concurrently. No rows means an empty list.
    #[instrument(name = "company_store.ledger.list_transfers", skip(self))]
    pub async fn list_transfers(&self, user: i64) -> Result<TransferHistory, DomainError> {
        let (incoming, outgoing) =
            futures::try_join!(self.repo.incoming(user), self.repo.outgoing(user))
                .map_err(|e| DomainError::database(format!("{e:#}")))?;
        debug!(
            incoming = incoming.len(),
            outgoing = outgoing.len(),
            "loaded transfers"
        );
        Ok(TransferHistory { incoming, outgoing })
    }

    async fn bounded<T, F>(&self, fut: F) -> Result<T, DomainError>
    where
        F: Future<Output = Result<T, LedgerError>>,
    {
        match tokio::time::timeout(self.tx_timeout, fut).await {
            Ok(res) => res.map_err(DomainError::from),
            Err(_) => {
                warn!(timeout_ms = self.tx_timeout.as_millis() as u64, "ledger transaction timed out");
                Err(DomainError::timeout(self.tx_timeout))
            }
        }
    }
}

fn ensure_positive(amount: i64) -> Result<(), DomainError> {
    if amount <= 0 {
        return Err(DomainError::validation("amount", "must be positive"));
    }
    Ok(())
}
