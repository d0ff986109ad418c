// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Integration tests for scope teardown and registration while the driver
//! is committing

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

use txhooks::{Error, HookPhase, Result, TransactionCoordinator, TransactionDriver};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Handle that counts how many times it was dropped
struct CountedHandle {
    drops: Arc<AtomicUsize>,
}

impl Drop for CountedHandle {
    fn drop(&mut self) {
        self.drops.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct CountingDriver {
    drops: Arc<AtomicUsize>,
}

#[async_trait]
impl TransactionDriver for CountingDriver {
    type Transaction = CountedHandle;

    async fn begin(&self) -> Result<CountedHandle> {
        Ok(CountedHandle {
            drops: Arc::clone(&self.drops),
        })
    }

    async fn commit(&self, _transaction: &CountedHandle) -> Result<()> {
        Ok(())
    }

    async fn rollback(&self, _transaction: &CountedHandle) -> Result<()> {
        Ok(())
    }
}

/// Driver whose commit blocks until released
#[derive(Default)]
struct GatedDriver {
    committing: Notify,
    release: Notify,
}

#[async_trait]
impl TransactionDriver for GatedDriver {
    type Transaction = ();

    async fn begin(&self) -> Result<()> {
        Ok(())
    }

    async fn commit(&self, _transaction: &()) -> Result<()> {
        self.committing.notify_one();
        self.release.notified().await;
        Ok(())
    }

    async fn rollback(&self, _transaction: &()) -> Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_timed_out_create_releases_transaction_handle() {
    init_logging();
    let driver = CountingDriver::default();
    let drops = Arc::clone(&driver.drops);
    let coordinator = TransactionCoordinator::new(driver);

    let outcome = tokio::time::timeout(
        Duration::from_millis(20),
        coordinator.create(|tx| async move {
            let held = tx.clone();
            tx.after_commit(move |_: i32| async move {
                let _ = held.id();
                Ok(())
            })
            .expect("register after-commit hook");
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(1)
        }),
    )
    .await;

    assert!(outcome.is_err(), "create should have timed out");
    assert_eq!(drops.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_completed_create_releases_transaction_handle() {
    init_logging();
    let driver = CountingDriver::default();
    let drops = Arc::clone(&driver.drops);
    let coordinator = TransactionCoordinator::new(driver);

    let result = coordinator
        .create(|tx| async move {
            let held = tx.clone();
            tx.after_rollback(move |_: Error| async move {
                let _ = held.id();
                Ok(())
            })
            .expect("register after-rollback hook");
            Ok(1)
        })
        .await;

    assert_eq!(result, Ok(1));
    assert_eq!(drops.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_registration_during_commit() {
    init_logging();
    let coordinator = TransactionCoordinator::new(GatedDriver::default());
    let driver = Arc::clone(coordinator.driver());
    let ran = Arc::new(Mutex::new(Vec::new()));

    let (sender, receiver) = tokio::sync::oneshot::channel();
    let task_ran = Arc::clone(&ran);
    let result = coordinator
        .create(|tx| async move {
            let scope = tx.clone();
            tokio::spawn(async move {
                driver.committing.notified().await;
                let before_log = Arc::clone(&task_ran);
                let before = scope.before_commit(move |_: i32| async move {
                    before_log.lock().push("before-commit".to_string());
                    Ok(())
                });
                let after_log = Arc::clone(&task_ran);
                let after = scope.after_commit(move |value: i32| async move {
                    after_log.lock().push(format!("after-commit {}", value));
                    Ok(())
                });
                let _ = sender.send((before, after));
                driver.release.notify_one();
            });
            Ok(5)
        })
        .await;

    let (before, after) = receiver.await.expect("registration results");
    assert_eq!(
        before,
        Err(Error::RegistrationClosed {
            phase: HookPhase::BeforeCommit
        })
    );
    assert_eq!(after, Ok(()));
    assert_eq!(result, Ok(5));
    assert_eq!(*ran.lock(), vec!["after-commit 5"]);
}
