// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Transaction scope handed to units of work
//!
//! A [`TransactionScope`] pairs the driver's raw transaction handle with the
//! three ordered hook lists of one `create` call. Units of work receive the
//! scope (never the raw handle alone) and schedule commit-time or
//! rollback-time side effects through its registration methods.
//!
//! Scopes are cheap to clone; every clone refers to the same transaction and
//! the same hook lists.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::hooks::{box_hook, run_hook, BoxedHook, HookPhase, HookQueue, HookSettings};

/// Identifier of a coordinated transaction, used for log correlation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId(Uuid);

impl TransactionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a scope is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeStage {
    /// The unit of work is running
    Active,
    /// Before-commit hooks are running
    BeforeCommit,
    /// The driver is committing
    Committing,
    /// The driver is rolling back
    RollingBack,
    /// The transaction committed; after-commit hooks are running
    AfterCommit,
    /// The transaction rolled back; after-rollback hooks are running
    AfterRollback,
    /// Every applicable hook has run
    Finished,
}

impl ScopeStage {
    /// Whether a hook for `phase` can still run if registered now
    pub fn accepts(&self, phase: HookPhase) -> bool {
        match (self, phase) {
            (ScopeStage::Active, _) => true,
            (ScopeStage::BeforeCommit, _) => true,
            (ScopeStage::Committing, HookPhase::AfterCommit) => true,
            (ScopeStage::Committing, HookPhase::AfterRollback) => true,
            (ScopeStage::RollingBack, HookPhase::AfterRollback) => true,
            (ScopeStage::AfterCommit, HookPhase::AfterCommit) => true,
            (ScopeStage::AfterRollback, HookPhase::AfterRollback) => true,
            _ => false,
        }
    }
}

struct ScopeState<T> {
    stage: ScopeStage,
    before_commit: HookQueue<T>,
    after_commit: HookQueue<T>,
    after_rollback: HookQueue<Error>,
}

impl<T> ScopeState<T> {
    fn queue_len(&self, phase: HookPhase) -> usize {
        match phase {
            HookPhase::BeforeCommit => self.before_commit.len(),
            HookPhase::AfterCommit => self.after_commit.len(),
            HookPhase::AfterRollback => self.after_rollback.len(),
        }
    }

    /// Take out the hooks whose phase can no longer happen
    fn take_unreachable(&mut self) -> (HookQueue<T>, HookQueue<T>, HookQueue<Error>) {
        let mut discarded = (
            HookQueue::default(),
            HookQueue::default(),
            HookQueue::default(),
        );
        if !self.stage.accepts(HookPhase::BeforeCommit) {
            discarded.0 = std::mem::take(&mut self.before_commit);
        }
        if !self.stage.accepts(HookPhase::AfterCommit) {
            discarded.1 = std::mem::take(&mut self.after_commit);
        }
        if !self.stage.accepts(HookPhase::AfterRollback) {
            discarded.2 = std::mem::take(&mut self.after_rollback);
        }
        discarded
    }
}

struct ScopeInner<X, T> {
    id: TransactionId,
    transaction: X,
    state: Mutex<ScopeState<T>>,
}

/// A transaction handle together with its lifecycle hooks
///
/// `X` is the driver's transaction type, `T` the result type of the unit of
/// work (passed to before-commit and after-commit hooks).
pub struct TransactionScope<X, T> {
    inner: Arc<ScopeInner<X, T>>,
}

impl<X, T> Clone for TransactionScope<X, T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<X, T> std::fmt::Debug for TransactionScope<X, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionScope")
            .field("id", &self.inner.id)
            .field("stage", &self.stage())
            .finish()
    }
}

impl<X, T> TransactionScope<X, T> {
    pub(crate) fn new(transaction: X) -> Self {
        Self {
            inner: Arc::new(ScopeInner {
                id: TransactionId::new(),
                transaction,
                state: Mutex::new(ScopeState {
                    stage: ScopeStage::Active,
                    before_commit: HookQueue::default(),
                    after_commit: HookQueue::default(),
                    after_rollback: HookQueue::default(),
                }),
            }),
        }
    }

    pub fn id(&self) -> TransactionId {
        self.inner.id
    }

    /// Borrow the driver's raw transaction handle
    pub fn transaction(&self) -> &X {
        &self.inner.transaction
    }

    pub fn stage(&self) -> ScopeStage {
        self.inner.state.lock().stage
    }

    /// Whether a hook for `phase` registered now would be recorded
    pub fn is_accepting(&self, phase: HookPhase) -> bool {
        self.inner.state.lock().stage.accepts(phase)
    }

    /// Number of hooks queued for `phase` that have not run yet
    pub fn pending_hooks(&self, phase: HookPhase) -> usize {
        self.inner.state.lock().queue_len(phase)
    }

    /// Whether two scopes refer to the same transaction
    pub fn same_transaction(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Schedule `hook` to run with the unit of work's result, after it
    /// succeeds and before the driver commits.
    ///
    /// A failing before-commit hook rolls the transaction back.
    pub fn before_commit<F, Fut>(&self, hook: F) -> Result<()>
    where
        F: FnOnce(T) -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.register(HookPhase::BeforeCommit, box_hook(hook), |state| {
            &mut state.before_commit
        })
    }

    /// Schedule `hook` to run with the unit of work's result once the
    /// driver has committed.
    pub fn after_commit<F, Fut>(&self, hook: F) -> Result<()>
    where
        F: FnOnce(T) -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.register(HookPhase::AfterCommit, box_hook(hook), |state| {
            &mut state.after_commit
        })
    }

    /// Schedule `hook` to run with the failure once the driver has rolled
    /// back.
    pub fn after_rollback<F, Fut>(&self, hook: F) -> Result<()>
    where
        F: FnOnce(Error) -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.register(HookPhase::AfterRollback, box_hook(hook), |state| {
            &mut state.after_rollback
        })
    }

    fn register<A>(
        &self,
        phase: HookPhase,
        hook: BoxedHook<A>,
        select: fn(&mut ScopeState<T>) -> &mut HookQueue<A>,
    ) -> Result<()> {
        let mut state = self.inner.state.lock();
        if !state.stage.accepts(phase) {
            return Err(Error::RegistrationClosed { phase });
        }
        select(&mut state).push(hook);
        Ok(())
    }

    pub(crate) fn enter(&self, stage: ScopeStage) {
        // Dropped hooks may own scope clones; release them outside the lock
        let discarded = {
            let mut state = self.inner.state.lock();
            state.stage = stage;
            state.take_unreachable()
        };
        drop(discarded);
    }

    /// Guard that finishes the scope when dropped, on every exit path
    /// including cancellation and panics. Finishing empties the hook
    /// queues, which may hold clones of this scope.
    pub(crate) fn finish_on_drop(&self) -> FinishOnDrop<X, T> {
        FinishOnDrop {
            scope: self.clone(),
        }
    }

    /// Run every hook queued in `select`, in order, one at a time.
    ///
    /// The lock is released while a hook runs so the hook itself may
    /// register more hooks. The first failing hook stops the pass.
    async fn drain<A: Clone>(
        &self,
        phase: HookPhase,
        select: fn(&mut ScopeState<T>) -> &mut HookQueue<A>,
        arg: &A,
        label: &str,
        settings: &HookSettings,
    ) -> Result<()> {
        let mut position = 0;
        loop {
            let next = {
                let mut state = self.inner.state.lock();
                select(&mut state).pop()
            };
            let Some(hook) = next else {
                return Ok(());
            };
            run_hook(hook, arg.clone(), phase, position, label, settings).await?;
            position += 1;
        }
    }
}

pub(crate) struct FinishOnDrop<X, T> {
    scope: TransactionScope<X, T>,
}

impl<X, T> Drop for FinishOnDrop<X, T> {
    fn drop(&mut self) {
        self.scope.enter(ScopeStage::Finished);
    }
}

impl<X, T: Clone> TransactionScope<X, T> {
    pub(crate) async fn run_before_commit(
        &self,
        value: &T,
        label: &str,
        settings: &HookSettings,
    ) -> Result<()> {
        self.enter(ScopeStage::BeforeCommit);
        self.drain(
            HookPhase::BeforeCommit,
            |state| &mut state.before_commit,
            value,
            label,
            settings,
        )
        .await
    }

    pub(crate) async fn run_after_commit(
        &self,
        value: &T,
        label: &str,
        settings: &HookSettings,
    ) -> Result<()> {
        self.enter(ScopeStage::AfterCommit);
        let outcome = self
            .drain(
                HookPhase::AfterCommit,
                |state| &mut state.after_commit,
                value,
                label,
                settings,
            )
            .await;
        self.enter(ScopeStage::Finished);
        outcome
    }

    pub(crate) async fn run_after_rollback(
        &self,
        error: &Error,
        label: &str,
        settings: &HookSettings,
    ) -> Result<()> {
        self.enter(ScopeStage::AfterRollback);
        let outcome = self
            .drain(
                HookPhase::AfterRollback,
                |state| &mut state.after_rollback,
                error,
                label,
                settings,
            )
            .await;
        self.enter(ScopeStage::Finished);
        outcome
    }
}
