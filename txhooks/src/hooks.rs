// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Lifecycle hook primitives
//!
//! Provides:
//! - The three lifecycle phases a hook can be attached to
//! - Type-erased hook storage
//! - Ordered hook queues executed one hook at a time
//! - Per-hook timing with slow hook logging

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};

use crate::error::Result;

/// Future returned by a registered hook
pub type HookFuture = Pin<Box<dyn Future<Output = Result<()>> + Send + 'static>>;

/// A registered hook, erased to a boxed `FnOnce`
pub(crate) type BoxedHook<A> = Box<dyn FnOnce(A) -> HookFuture + Send + 'static>;

/// Point in the transaction lifecycle at which a hook runs
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum HookPhase {
    /// After the unit of work succeeded, before the driver commits
    BeforeCommit,
    /// After the driver committed
    AfterCommit,
    /// After the driver rolled back
    AfterRollback,
}

impl std::fmt::Display for HookPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            HookPhase::BeforeCommit => "before-commit",
            HookPhase::AfterCommit => "after-commit",
            HookPhase::AfterRollback => "after-rollback",
        };
        write!(f, "{}", name)
    }
}

pub(crate) fn box_hook<A, F, Fut>(hook: F) -> BoxedHook<A>
where
    F: FnOnce(A) -> Fut + Send + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    Box::new(move |arg| Box::pin(hook(arg)) as HookFuture)
}

/// Hooks of one phase in registration order
pub(crate) struct HookQueue<A> {
    hooks: VecDeque<BoxedHook<A>>,
}

impl<A> Default for HookQueue<A> {
    fn default() -> Self {
        Self {
            hooks: VecDeque::new(),
        }
    }
}

impl<A> HookQueue<A> {
    pub(crate) fn push(&mut self, hook: BoxedHook<A>) {
        self.hooks.push_back(hook);
    }

    /// Next hook to run. Hooks pushed while a pass is in progress are
    /// returned after the ones already queued.
    pub(crate) fn pop(&mut self) -> Option<BoxedHook<A>> {
        self.hooks.pop_front()
    }

    pub(crate) fn len(&self) -> usize {
        self.hooks.len()
    }
}

/// Settings applied while executing hooks
#[derive(Debug, Clone)]
pub(crate) struct HookSettings {
    /// Hooks slower than this are logged at warn level
    pub slow_threshold: Option<Duration>,
    /// Log every hook start/finish at debug level
    pub log_hooks: bool,
}

/// Timing of a single hook execution
#[derive(Debug, Clone)]
pub(crate) struct HookTiming {
    pub phase: HookPhase,
    pub position: usize,
    pub duration: Duration,
}

impl HookTiming {
    pub(crate) fn is_slow(&self, threshold: Option<Duration>) -> bool {
        threshold.is_some_and(|limit| self.duration > limit)
    }

    pub(crate) fn latency_ms(&self) -> f64 {
        self.duration.as_secs_f64() * 1000.0
    }
}

/// Await one hook to completion and record how long it took
pub(crate) async fn run_hook<A>(
    hook: BoxedHook<A>,
    arg: A,
    phase: HookPhase,
    position: usize,
    label: &str,
    settings: &HookSettings,
) -> Result<()> {
    if settings.log_hooks {
        debug!("[{}] running {} hook #{}", label, phase, position);
    }

    let start = Instant::now();
    let outcome = hook(arg).await;
    let timing = HookTiming {
        phase,
        position,
        duration: start.elapsed(),
    };

    if timing.is_slow(settings.slow_threshold) {
        warn!(
            "[{}] slow {} hook #{}: {:.2}ms",
            label,
            timing.phase,
            timing.position,
            timing.latency_ms()
        );
    }

    if settings.log_hooks {
        match &outcome {
            Ok(()) => debug!(
                "[{}] {} hook #{} completed in {:.2}ms",
                label,
                phase,
                position,
                timing.latency_ms()
            ),
            Err(e) => debug!("[{}] {} hook #{} failed: {}", label, phase, position, e),
        }
    }

    outcome
}
