// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Transaction coordinator
//!
//! Runs a unit of work inside a driver transaction and fires the hooks the
//! unit of work registered on its [`TransactionScope`]:
//!
//! ```text
//! begin
//!   └─ callback(scope)
//!        ├─ Ok(value)  → before-commit hooks(value) → commit
//!        │                 ├─ Ok  → after-commit hooks(value)  → Ok(value)
//!        │                 └─ Err → rollback → after-rollback hooks(err) → Err(err)
//!        └─ Err(err)   → rollback → after-rollback hooks(err) → Err(err)
//! ```

use log::{debug, error, info, warn};
use std::future::Future;
use std::sync::Arc;

use crate::config::CoordinatorConfig;
use crate::driver::TransactionDriver;
use crate::error::{Error, Result};
use crate::hooks::HookSettings;
use crate::scope::{ScopeStage, TransactionScope};

/// Opens transactions and runs lifecycle hooks around units of work
pub struct TransactionCoordinator<D: TransactionDriver> {
    driver: Arc<D>,
    config: CoordinatorConfig,
    settings: HookSettings,
}

impl<D: TransactionDriver> Clone for TransactionCoordinator<D> {
    fn clone(&self) -> Self {
        Self {
            driver: Arc::clone(&self.driver),
            config: self.config.clone(),
            settings: self.settings.clone(),
        }
    }
}

impl<D: TransactionDriver> TransactionCoordinator<D> {
    /// Create a coordinator with the default configuration
    pub fn new(driver: D) -> Self {
        Self::from_parts(Arc::new(driver), CoordinatorConfig::default())
    }

    /// Create a coordinator with a custom configuration
    pub fn with_config(driver: D, config: CoordinatorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_parts(Arc::new(driver), config))
    }

    /// Create a coordinator over a driver that is shared elsewhere
    pub fn with_shared_driver(driver: Arc<D>, config: CoordinatorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_parts(driver, config))
    }

    fn from_parts(driver: Arc<D>, config: CoordinatorConfig) -> Self {
        let settings = config.hook_settings();
        Self {
            driver,
            config,
            settings,
        }
    }

    pub fn driver(&self) -> &Arc<D> {
        &self.driver
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Run `callback` inside a new transaction.
    ///
    /// On success the before-commit hooks run (in registration order, each
    /// awaited before the next), the driver commits, then the after-commit
    /// hooks run and the callback's value is returned. If the callback, a
    /// before-commit hook or the commit fails, the driver rolls back, the
    /// after-rollback hooks run with the failure and the failure is returned.
    ///
    /// Hook failures take precedence: a failing after-commit hook turns the
    /// committed result into that hook's error, and a failing after-rollback
    /// hook replaces the original failure. Remaining hooks of that phase are
    /// skipped in both cases.
    pub async fn create<T, F, Fut>(&self, callback: F) -> Result<T>
    where
        T: Clone + Send + 'static,
        F: FnOnce(TransactionScope<D::Transaction, T>) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let label = self.config.label.as_str();

        let transaction = self.driver.begin().await.map_err(|e| {
            warn!("[{}] failed to begin transaction: {}", label, e);
            e
        })?;
        let scope = TransactionScope::new(transaction);
        let _finish = scope.finish_on_drop();
        debug!("[{}] transaction {} started", label, scope.id());

        let outcome = match self.run_unit_of_work(&scope, callback).await {
            Ok(value) => match self.commit(&scope).await {
                Ok(()) => {
                    info!("[{}] transaction {} committed", label, scope.id());
                    Ok(value)
                }
                Err(e) => {
                    warn!("[{}] commit of transaction {} failed: {}", label, scope.id(), e);
                    Err(e)
                }
            },
            Err(e) => Err(e),
        };

        match outcome {
            Ok(value) => {
                scope
                    .run_after_commit(&value, label, &self.settings)
                    .await?;
                Ok(value)
            }
            Err(err) => {
                self.rollback(&scope, &err).await;
                scope
                    .run_after_rollback(&err, label, &self.settings)
                    .await?;
                Err(err)
            }
        }
    }

    /// Run `callback` inside `transaction` when one is given, otherwise
    /// inside a new transaction exactly as [`create`](Self::create) does.
    ///
    /// Joining an existing scope opens nothing and runs no hooks; the
    /// callback's outcome is returned untouched, and any hook it registers
    /// lands on the outer scope.
    ///
    /// The joined callback must produce the outer scope's result type `T`,
    /// since its before-commit and after-commit hooks receive the outer
    /// transaction's result. A unit of work with a different result type
    /// cannot join; have it return `T` and keep its own value elsewhere.
    pub async fn wrap<T, F, Fut>(
        &self,
        transaction: Option<TransactionScope<D::Transaction, T>>,
        callback: F,
    ) -> Result<T>
    where
        T: Clone + Send + 'static,
        F: FnOnce(TransactionScope<D::Transaction, T>) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        match transaction {
            None => self.create(callback).await,
            Some(scope) => {
                debug!(
                    "[{}] joining transaction {}",
                    self.config.label,
                    scope.id()
                );
                callback(scope).await
            }
        }
    }

    /// Callback followed by the before-commit hooks
    async fn run_unit_of_work<T, F, Fut>(
        &self,
        scope: &TransactionScope<D::Transaction, T>,
        callback: F,
    ) -> Result<T>
    where
        T: Clone + Send + 'static,
        F: FnOnce(TransactionScope<D::Transaction, T>) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let label = self.config.label.as_str();

        let value = callback(scope.clone()).await.map_err(|e| {
            debug!("[{}] unit of work in {} failed: {}", label, scope.id(), e);
            e
        })?;

        scope
            .run_before_commit(&value, label, &self.settings)
            .await?;
        Ok(value)
    }

    async fn commit<T>(&self, scope: &TransactionScope<D::Transaction, T>) -> Result<()> {
        scope.enter(ScopeStage::Committing);
        self.driver.commit(scope.transaction()).await
    }

    /// Roll back through the driver. A rollback failure is logged and the
    /// triggering failure is kept.
    async fn rollback<T>(&self, scope: &TransactionScope<D::Transaction, T>, cause: &Error) {
        let label = self.config.label.as_str();
        scope.enter(ScopeStage::RollingBack);
        match self.driver.rollback(scope.transaction()).await {
            Ok(()) => info!(
                "[{}] transaction {} rolled back: {}",
                label,
                scope.id(),
                cause
            ),
            Err(e) => error!(
                "[{}] rollback of transaction {} failed: {} (cause: {})",
                label,
                scope.id(),
                e,
                cause
            ),
        }
    }
}
