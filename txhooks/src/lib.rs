// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! txhooks - Transaction lifecycle hooks for any transactional driver
//!
//! This crate runs units of work inside a database transaction and lets them
//! schedule side effects keyed to the outcome: work that must happen before
//! the commit, after the commit, or after a rollback.
//!
//! # Quick Start
//!
//! ```no_run
//! use txhooks::{MemoryDriver, TransactionCoordinator, Error};
//!
//! # async fn run() -> Result<(), Error> {
//! let coordinator = TransactionCoordinator::new(MemoryDriver::new());
//!
//! let order_id = coordinator
//!     .create(|tx| async move {
//!         tx.transaction().put("order:1", "pending");
//!         tx.after_commit(|id: u64| async move {
//!             println!("order {} committed, sending email", id);
//!             Ok(())
//!         })?;
//!         Ok::<_, Error>(1u64)
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │   Application units of work             │
//! └─────────────────────────────────────────┘
//!                  │ TransactionScope
//!                  ▼
//! ┌─────────────────────────────────────────┐
//! │  txhooks (this crate)                   │
//! │  - TransactionCoordinator (create/wrap) │
//! │  - TransactionScope (hook lists)        │
//! └─────────────────────────────────────────┘
//!                  │ TransactionDriver
//!                  ▼
//! ┌─────────────────────────────────────────┐
//! │  Database driver (begin/commit/rollback)│
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Module Organization
//!
//! - [`coordinator`] - `create` and `wrap`
//! - [`scope`] - Transaction scope and hook registration
//! - [`hooks`] - Hook phases and sequential execution
//! - [`driver`] - Driver capability trait
//! - [`memory`] - In-memory driver
//! - [`config`] - Coordinator configuration
//! - [`error`] - Error types and handling

pub mod config;
pub mod coordinator;
pub mod driver;
pub mod error;
pub mod hooks;
pub mod memory;
pub mod scope;

pub use config::CoordinatorConfig;
pub use coordinator::TransactionCoordinator;
pub use driver::TransactionDriver;
pub use error::{Error, Result};
pub use hooks::{HookFuture, HookPhase};
pub use memory::{DriverEvent, MemoryDriver, MemoryTransaction};
pub use scope::{ScopeStage, TransactionId, TransactionScope};
