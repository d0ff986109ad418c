// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! In-memory transaction driver
//!
//! A small key-value store with buffered transactional writes. Every
//! begin/commit/rollback is recorded in order, and the next call of each
//! kind can be made to fail. Intended for tests and examples.

use async_trait::async_trait;
use log::debug;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::driver::TransactionDriver;
use crate::error::{Error, Result};

/// A driver call observed by [`MemoryDriver`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverEvent {
    Begin(u64),
    Commit(u64),
    Rollback(u64),
}

/// Transaction handle issued by [`MemoryDriver`]
#[derive(Debug)]
pub struct MemoryTransaction {
    number: u64,
    writes: Mutex<Vec<(String, String)>>,
}

impl MemoryTransaction {
    /// Sequence number, starting at 1
    pub fn number(&self) -> u64 {
        self.number
    }

    /// Buffer a write; it becomes visible on commit
    pub fn put(&self, key: impl Into<String>, value: impl Into<String>) {
        self.writes.lock().push((key.into(), value.into()));
    }

    pub fn pending_writes(&self) -> usize {
        self.writes.lock().len()
    }
}

#[derive(Debug, Default)]
struct FailurePlan {
    begin: Option<String>,
    commit: Option<String>,
    rollback: Option<String>,
}

/// In-memory [`TransactionDriver`]
#[derive(Debug, Default)]
pub struct MemoryDriver {
    next_number: AtomicU64,
    data: Mutex<HashMap<String, String>>,
    events: Mutex<Vec<DriverEvent>>,
    failures: Mutex<FailurePlan>,
}

impl MemoryDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Committed value of `key`
    pub fn get(&self, key: &str) -> Option<String> {
        self.data.lock().get(key).cloned()
    }

    /// Every driver call so far, in order
    pub fn events(&self) -> Vec<DriverEvent> {
        self.events.lock().clone()
    }

    /// Number of transactions opened so far
    pub fn transactions_started(&self) -> u64 {
        self.next_number.load(Ordering::SeqCst)
    }

    pub fn fail_next_begin(&self, message: impl Into<String>) {
        self.failures.lock().begin = Some(message.into());
    }

    pub fn fail_next_commit(&self, message: impl Into<String>) {
        self.failures.lock().commit = Some(message.into());
    }

    pub fn fail_next_rollback(&self, message: impl Into<String>) {
        self.failures.lock().rollback = Some(message.into());
    }

    fn record(&self, event: DriverEvent) {
        debug!("memory driver: {:?}", event);
        self.events.lock().push(event);
    }
}

#[async_trait]
impl TransactionDriver for MemoryDriver {
    type Transaction = MemoryTransaction;

    async fn begin(&self) -> Result<MemoryTransaction> {
        if let Some(message) = self.failures.lock().begin.take() {
            return Err(Error::driver(message));
        }
        let number = self.next_number.fetch_add(1, Ordering::SeqCst) + 1;
        self.record(DriverEvent::Begin(number));
        Ok(MemoryTransaction {
            number,
            writes: Mutex::new(Vec::new()),
        })
    }

    async fn commit(&self, transaction: &MemoryTransaction) -> Result<()> {
        if let Some(message) = self.failures.lock().commit.take() {
            return Err(Error::driver(message));
        }
        let writes = std::mem::take(&mut *transaction.writes.lock());
        self.data.lock().extend(writes);
        self.record(DriverEvent::Commit(transaction.number));
        Ok(())
    }

    async fn rollback(&self, transaction: &MemoryTransaction) -> Result<()> {
        if let Some(message) = self.failures.lock().rollback.take() {
            return Err(Error::driver(message));
        }
        transaction.writes.lock().clear();
        self.record(DriverEvent::Rollback(transaction.number));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_commit_applies_buffered_writes() {
        let driver = MemoryDriver::new();
        let tx = driver.begin().await.unwrap();
        tx.put("k", "v");
        assert_eq!(driver.get("k"), None);

        driver.commit(&tx).await.unwrap();
        assert_eq!(driver.get("k"), Some("v".to_string()));
        assert_eq!(tx.pending_writes(), 0);
    }

    #[tokio::test]
    async fn test_rollback_discards_writes() {
        let driver = MemoryDriver::new();
        let tx = driver.begin().await.unwrap();
        tx.put("k", "v");
        driver.rollback(&tx).await.unwrap();

        assert_eq!(driver.get("k"), None);
        assert_eq!(
            driver.events(),
            vec![DriverEvent::Begin(1), DriverEvent::Rollback(1)]
        );
    }

    #[tokio::test]
    async fn test_injected_failure_applies_once() {
        let driver = MemoryDriver::new();
        driver.fail_next_commit("disk full");
        let tx = driver.begin().await.unwrap();

        assert_eq!(driver.commit(&tx).await, Err(Error::driver("disk full")));
        assert!(driver.commit(&tx).await.is_ok());
        assert_eq!(
            driver.events(),
            vec![DriverEvent::Begin(1), DriverEvent::Commit(1)]
        );
    }
}
