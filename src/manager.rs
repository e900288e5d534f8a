// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Flat lock bookkeeping and wait-queue scheduling
//!
//! The [`LockManager`] owns the ground-truth mapping from resources and
//! transactions to held locks, plus a single global FIFO wait queue. It
//! treats every resource as independent: requests that are invalid only from
//! a multigranularity perspective (e.g. an `X` lock on a table without an
//! intent lock on the database) are allowed here. Hierarchy enforcement is
//! the job of [`LockContext`](crate::context::LockContext), which should be
//! the entry point for most callers.
//!
//! Every operation runs under one critical section over the whole manager
//! state. A request that cannot be granted marks its transaction as blocked
//! (via [`Transaction::block`]) and joins the queue; it is woken only from a
//! later `release`/`acquire_and_release` that re-scans the queue, applying
//! the grant and calling [`Transaction::unblock`] in the same critical
//! section that made it satisfiable.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};

use crate::context::LockContext;
use crate::error::{LockError, LockResult};
use crate::lock_type::LockType;
use crate::resource::ResourceName;
use crate::transaction::{Transaction, TransactionId};

/// The grant record for one transaction on one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lock {
    pub name: ResourceName,
    pub lock_type: LockType,
}

/// A request parked in the wait queue. `releases` are applied atomically
/// with the grant when the request is eventually satisfiable.
struct LockRequest {
    transaction: Arc<dyn Transaction>,
    lock: Lock,
    releases: Vec<ResourceName>,
}

/// All mutable manager state, guarded by a single mutex. Cross-resource
/// invariants (queue fairness, atomic escalation) need one serialization
/// point, so there are no per-resource locks here.
#[derive(Default)]
pub(crate) struct ManagerState {
    /// Grants per resource, in acquisition order. At most one grant per
    /// transaction per resource; promotions replace in place.
    resource_locks: HashMap<ResourceName, Vec<(TransactionId, LockType)>>,
    /// Grants per transaction, in acquisition order. Kept in step with
    /// `resource_locks`.
    transaction_locks: HashMap<TransactionId, Vec<Lock>>,
    /// Single global FIFO of pending requests.
    wait_queue: VecDeque<LockRequest>,
}

impl ManagerState {
    pub(crate) fn lock_type(&self, txn: TransactionId, name: &ResourceName) -> Option<LockType> {
        self.resource_locks
            .get(name)?
            .iter()
            .find(|(holder, _)| *holder == txn)
            .map(|(_, lock_type)| *lock_type)
    }

    pub(crate) fn locks_on(&self, name: &ResourceName) -> Vec<(TransactionId, LockType)> {
        self.resource_locks.get(name).cloned().unwrap_or_default()
    }

    pub(crate) fn locks_held_by(&self, txn: TransactionId) -> Vec<Lock> {
        self.transaction_locks.get(&txn).cloned().unwrap_or_default()
    }

    /// Whether `lock_type` is compatible with every grant on `name` from a
    /// transaction other than `txn`. The caller's own grant never conflicts:
    /// it is either absent, being released, or being promoted.
    fn compatible_with_others(
        &self,
        txn: TransactionId,
        name: &ResourceName,
        lock_type: LockType,
    ) -> bool {
        self.resource_locks.get(name).map_or(true, |grants| {
            grants.iter().all(|(holder, held)| {
                *holder == txn || LockType::compatible(Some(lock_type), Some(*held))
            })
        })
    }

    fn insert_grant(&mut self, txn: TransactionId, name: ResourceName, lock_type: LockType) {
        self.resource_locks
            .entry(name.clone())
            .or_default()
            .push((txn, lock_type));
        self.transaction_locks
            .entry(txn)
            .or_default()
            .push(Lock { name, lock_type });
    }

    /// Replace `txn`'s grant on `name` without moving it: a promotion keeps
    /// the original acquisition position in both tables.
    fn replace_grant(&mut self, txn: TransactionId, name: &ResourceName, lock_type: LockType) {
        if let Some(grants) = self.resource_locks.get_mut(name) {
            if let Some(grant) = grants.iter_mut().find(|(holder, _)| *holder == txn) {
                grant.1 = lock_type;
            }
        }
        if let Some(locks) = self.transaction_locks.get_mut(&txn) {
            if let Some(lock) = locks.iter_mut().find(|lock| &lock.name == name) {
                lock.lock_type = lock_type;
            }
        }
    }

    fn remove_grant(&mut self, txn: TransactionId, name: &ResourceName) -> Option<LockType> {
        let grants = self.resource_locks.get_mut(name)?;
        let index = grants.iter().position(|(holder, _)| *holder == txn)?;
        let (_, lock_type) = grants.remove(index);
        if grants.is_empty() {
            self.resource_locks.remove(name);
        }
        if let Some(locks) = self.transaction_locks.get_mut(&txn) {
            locks.retain(|lock| &lock.name != name);
            if locks.is_empty() {
                self.transaction_locks.remove(&txn);
            }
        }
        Some(lock_type)
    }

    pub(crate) fn acquire(
        &mut self,
        transaction: &Arc<dyn Transaction>,
        name: &ResourceName,
        lock_type: LockType,
    ) -> LockResult<()> {
        let txn = transaction.id();
        if self.lock_type(txn, name).is_some() {
            return Err(LockError::DuplicateLockRequest(format!(
                "transaction {} already holds a lock on {}",
                txn, name
            )));
        }
        if self.compatible_with_others(txn, name, lock_type) {
            log::debug!("granting {} on {} to transaction {}", lock_type, name, txn);
            self.insert_grant(txn, name.clone(), lock_type);
        } else {
            log::debug!(
                "queueing {} on {} for transaction {}: conflicting grants held",
                lock_type,
                name,
                txn
            );
            transaction.block();
            self.wait_queue.push_back(LockRequest {
                transaction: Arc::clone(transaction),
                lock: Lock {
                    name: name.clone(),
                    lock_type,
                },
                releases: Vec::new(),
            });
        }
        Ok(())
    }

    pub(crate) fn release(&mut self, txn: TransactionId, name: &ResourceName) -> LockResult<()> {
        let released = self.remove_grant(txn, name).ok_or_else(|| {
            LockError::NoLockHeld(format!("transaction {} holds no lock on {}", txn, name))
        })?;
        log::debug!("transaction {} released {} on {}", txn, released, name);
        self.drain_queue();
        Ok(())
    }

    pub(crate) fn promote(
        &mut self,
        transaction: &Arc<dyn Transaction>,
        name: &ResourceName,
        new_type: LockType,
    ) -> LockResult<()> {
        let txn = transaction.id();
        let held = self.lock_type(txn, name).ok_or_else(|| {
            LockError::NoLockHeld(format!("transaction {} holds no lock on {}", txn, name))
        })?;
        if held == new_type {
            return Err(LockError::DuplicateLockRequest(format!(
                "transaction {} already holds {} on {}",
                txn, new_type, name
            )));
        }
        if !LockType::substitutable(Some(new_type), Some(held)) {
            return Err(LockError::InvalidLock(format!(
                "{} is not a promotion of {} on {}",
                new_type, held, name
            )));
        }
        if self.compatible_with_others(txn, name, new_type) {
            log::debug!(
                "promoting transaction {} from {} to {} on {}",
                txn,
                held,
                new_type,
                name
            );
            self.replace_grant(txn, name, new_type);
        } else {
            // Promotions outrank plain acquisitions: the holder of partial
            // rights must not be starved by later arrivals.
            log::debug!(
                "queueing promotion to {} on {} for transaction {} at the queue front",
                new_type,
                name,
                txn
            );
            transaction.block();
            self.wait_queue.push_front(LockRequest {
                transaction: Arc::clone(transaction),
                lock: Lock {
                    name: name.clone(),
                    lock_type: new_type,
                },
                releases: Vec::new(),
            });
        }
        Ok(())
    }

    pub(crate) fn acquire_and_release(
        &mut self,
        transaction: &Arc<dyn Transaction>,
        name: &ResourceName,
        lock_type: LockType,
        releases: Vec<ResourceName>,
    ) -> LockResult<()> {
        let txn = transaction.id();
        for resource in &releases {
            if self.lock_type(txn, resource).is_none() {
                return Err(LockError::NoLockHeld(format!(
                    "transaction {} holds no lock on {} named for release",
                    txn, resource
                )));
            }
        }
        if self.lock_type(txn, name) == Some(lock_type) && !releases.contains(name) {
            return Err(LockError::DuplicateLockRequest(format!(
                "transaction {} already holds {} on {}",
                txn, lock_type, name
            )));
        }
        // The grant decision is taken against the resulting state: the
        // caller's own grants are either released or replaced, so only other
        // transactions' grants can conflict.
        if self.compatible_with_others(txn, name, lock_type) {
            self.apply_grant(txn, name, lock_type, &releases);
            self.drain_queue();
        } else {
            log::debug!(
                "queueing {} on {} for transaction {} with {} deferred releases",
                lock_type,
                name,
                txn,
                releases.len()
            );
            transaction.block();
            self.wait_queue.push_back(LockRequest {
                transaction: Arc::clone(transaction),
                lock: Lock {
                    name: name.clone(),
                    lock_type,
                },
                releases,
            });
        }
        Ok(())
    }

    /// Apply a request's releases and its grant as one state change. A grant
    /// on the target resource that survives the releases is replaced in
    /// place, keeping its acquisition position.
    fn apply_grant(
        &mut self,
        txn: TransactionId,
        name: &ResourceName,
        lock_type: LockType,
        releases: &[ResourceName],
    ) {
        for resource in releases {
            if resource != name {
                self.remove_grant(txn, resource);
            }
        }
        if self.lock_type(txn, name).is_some() {
            self.replace_grant(txn, name, lock_type);
        } else {
            self.insert_grant(txn, name.clone(), lock_type);
        }
    }

    /// Grant queued requests strictly from the head, stopping at the first
    /// one that cannot be granted: a request never jumps ahead of an earlier
    /// one, even for an unrelated resource.
    fn drain_queue(&mut self) {
        loop {
            let grantable = match self.wait_queue.front() {
                Some(request) => self.compatible_with_others(
                    request.transaction.id(),
                    &request.lock.name,
                    request.lock.lock_type,
                ),
                None => break,
            };
            if !grantable {
                break;
            }
            if let Some(request) = self.wait_queue.pop_front() {
                let txn = request.transaction.id();
                log::debug!(
                    "waking transaction {} with {} on {}",
                    txn,
                    request.lock.lock_type,
                    request.lock.name
                );
                self.apply_grant(
                    txn,
                    &request.lock.name,
                    request.lock.lock_type,
                    &request.releases,
                );
                request.transaction.unblock();
            }
        }
    }
}

/// The lock manager: single source of truth for grants and waiters.
pub struct LockManager {
    state: Mutex<ManagerState>,
    /// Cache of root lock contexts, keyed by root resource name.
    contexts: Mutex<HashMap<String, Arc<LockContext>>>,
}

impl LockManager {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ManagerState::default()),
            contexts: Mutex::new(HashMap::new()),
        }
    }

    /// One critical section over the whole manager state. Lock contexts use
    /// this to validate against parent state and delegate without another
    /// operation interleaving.
    pub(crate) fn state(&self) -> MutexGuard<'_, ManagerState> {
        self.state.lock()
    }

    /// Grant `lock_type` on `name` to `transaction`, or mark it blocked and
    /// queue the request at the tail if another transaction holds a
    /// conflicting lock. No parent-intent validation is performed here.
    ///
    /// Fails with [`LockError::DuplicateLockRequest`] if the transaction
    /// already holds any lock on `name`; re-acquisition must go through
    /// [`LockManager::promote`].
    pub fn acquire(
        &self,
        transaction: &Arc<dyn Transaction>,
        name: &ResourceName,
        lock_type: LockType,
    ) -> LockResult<()> {
        self.state.lock().acquire(transaction, name, lock_type)
    }

    /// Remove `transaction`'s grant on `name`, then grant queued requests in
    /// FIFO order up to the first that cannot be granted.
    ///
    /// Fails with [`LockError::NoLockHeld`] if the transaction holds no lock
    /// on `name`.
    pub fn release(
        &self,
        transaction: &Arc<dyn Transaction>,
        name: &ResourceName,
    ) -> LockResult<()> {
        self.state.lock().release(transaction.id(), name)
    }

    /// Replace `transaction`'s grant on `name` with `new_type`, in place: the
    /// lock keeps its original acquisition position. If another transaction
    /// holds a conflicting lock, the request is queued at the **front**.
    ///
    /// Fails with [`LockError::NoLockHeld`] if nothing is held on `name`,
    /// [`LockError::DuplicateLockRequest`] if `new_type` is already held, and
    /// [`LockError::InvalidLock`] if `new_type` is not substitutable for the
    /// held type.
    pub fn promote(
        &self,
        transaction: &Arc<dyn Transaction>,
        name: &ResourceName,
        new_type: LockType,
    ) -> LockResult<()> {
        self.state.lock().promote(transaction, name, new_type)
    }

    /// Atomically acquire `lock_type` on `name` and release every resource in
    /// `releases`. The grant decision is computed against the state left by
    /// the releases, so a transaction can trade its fine-grained locks for a
    /// coarse one without tripping over its own grants. Used by escalation
    /// and by promotion to `SIX`.
    pub fn acquire_and_release(
        &self,
        transaction: &Arc<dyn Transaction>,
        name: &ResourceName,
        lock_type: LockType,
        releases: Vec<ResourceName>,
    ) -> LockResult<()> {
        self.state
            .lock()
            .acquire_and_release(transaction, name, lock_type, releases)
    }

    /// The lock `txn` holds on `name`, or `None`.
    pub fn lock_type(&self, txn: TransactionId, name: &ResourceName) -> Option<LockType> {
        self.state.lock().lock_type(txn, name)
    }

    /// Grants on `name` in acquisition order; promotions keep their original
    /// position.
    pub fn resource_locks(&self, name: &ResourceName) -> Vec<(TransactionId, LockType)> {
        self.state.lock().locks_on(name)
    }

    /// Grants held by `txn` in acquisition order; promotions keep their
    /// original position.
    pub fn transaction_locks(&self, txn: TransactionId) -> Vec<Lock> {
        self.state.lock().locks_held_by(txn)
    }

    /// The root context for the canonical `"database"` hierarchy.
    pub fn database_context(self: &Arc<Self>) -> Arc<LockContext> {
        self.root_context("database")
    }

    /// A parentless root context outside the database hierarchy. The name
    /// `"database"` is reserved for [`LockManager::database_context`].
    pub fn orphan_context(self: &Arc<Self>, name: &str) -> LockResult<Arc<LockContext>> {
        if name == "database" {
            return Err(LockError::InvalidLock(
                "cannot create an orphan context named 'database'".to_string(),
            ));
        }
        Ok(self.root_context(name))
    }

    fn root_context(self: &Arc<Self>, name: &str) -> Arc<LockContext> {
        let mut contexts = self.contexts.lock();
        if let Some(context) = contexts.get(name) {
            return Arc::clone(context);
        }
        let context = LockContext::new_root(Arc::clone(self), name);
        contexts.insert(name.to_string(), Arc::clone(&context));
        context
    }
}

impl Default for LockManager {
    fn default() -> Self {
        Self::new()
    }
}
