// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Transactional database capability consumed by the coordinator
//!
//! The coordinator never talks to a database directly. Everything it needs
//! from the storage layer is expressed by [`TransactionDriver`]: open a
//! transaction, commit it, roll it back. Isolation levels, locking and
//! connection handling stay with the implementation.

use async_trait::async_trait;

use crate::error::Result;

/// A database driver able to run work inside a transaction
///
/// For each transaction returned by `begin`, the coordinator calls `commit`
/// once if the unit of work succeeds and `rollback` once if it fails. A
/// failed `commit` is followed by a `rollback`.
#[async_trait]
pub trait TransactionDriver: Send + Sync {
    /// Opaque handle to an in-flight transaction
    type Transaction: Send + Sync + 'static;

    /// Open a new transaction
    async fn begin(&self) -> Result<Self::Transaction>;

    /// Make the transaction's writes durable and visible
    async fn commit(&self, transaction: &Self::Transaction) -> Result<()>;

    /// Discard the transaction's writes
    async fn rollback(&self, transaction: &Self::Transaction) -> Result<()>;
}

