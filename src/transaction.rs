// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Transaction capability consumed by the lock manager
//!
//! The locking subsystem treats transactions as opaque: it only needs a
//! stable numeric id and a pair of hooks to suspend and resume the owning
//! execution context. Lifecycle concerns (commit, abort) live elsewhere.

use parking_lot::{Condvar, Mutex};

/// Unique numeric transaction identity.
pub type TransactionId = u64;

/// Hooks the lock manager uses to suspend and resume a transaction.
pub trait Transaction: Send + Sync {
    fn id(&self) -> TransactionId;

    /// Invoked by the lock manager, inside its critical section, when a
    /// request cannot be granted immediately. Implementations must only mark
    /// the transaction as blocked; the owning thread suspends after the
    /// manager operation returns. Must not call back into the lock manager.
    fn block(&self);

    /// Invoked inside the critical section that applied the transaction's
    /// queued grant. Wakes any thread parked in the transaction.
    fn unblock(&self);
}

/// Condvar-backed [`Transaction`] for callers running one transaction per
/// thread: `block` marks, [`SyncTransaction::wait_until_unblocked`] parks.
pub struct SyncTransaction {
    id: TransactionId,
    blocked: Mutex<bool>,
    wakeup: Condvar,
}

impl SyncTransaction {
    pub fn new(id: TransactionId) -> Self {
        Self {
            id,
            blocked: Mutex::new(false),
            wakeup: Condvar::new(),
        }
    }

    pub fn is_blocked(&self) -> bool {
        *self.blocked.lock()
    }

    /// Park the calling thread until the lock manager grants the queued
    /// request and calls [`Transaction::unblock`]. Returns immediately if the
    /// transaction is not blocked.
    pub fn wait_until_unblocked(&self) {
        let mut blocked = self.blocked.lock();
        while *blocked {
            self.wakeup.wait(&mut blocked);
        }
    }
}

impl Transaction for SyncTransaction {
    fn id(&self) -> TransactionId {
        self.id
    }

    fn block(&self) {
        *self.blocked.lock() = true;
    }

    fn unblock(&self) {
        let mut blocked = self.blocked.lock();
        *blocked = false;
        self.wakeup.notify_all();
    }
}
