// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Hierarchical lock contexts over the flat lock manager
//!
//! A [`LockContext`] wraps one resource in the hierarchy and enforces the
//! multigranularity invariant: a transaction must hold the appropriate intent
//! lock on the parent before locking the child. Contexts are created lazily
//! on first traversal, cached for the life of the manager, and delegate all
//! grant/queue/release mechanics to the [`LockManager`].
//!
//! Each node also tracks, per transaction, how many locks the transaction
//! holds strictly below it. That count feeds [`LockContext::saturation`],
//! the heuristic higher layers use to decide when escalation is worthwhile.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::error::{LockError, LockResult};
use crate::lock_type::LockType;
use crate::manager::LockManager;
use crate::resource::ResourceName;
use crate::transaction::{Transaction, TransactionId};

/// One node of the resource hierarchy.
pub struct LockContext {
    manager: Arc<LockManager>,
    /// Non-owning back-reference; `None` after upgrade only at a root.
    parent: Weak<LockContext>,
    name: ResourceName,
    /// Readonly contexts reject every mutating operation. Monotonic: set at
    /// creation, never cleared.
    readonly: bool,
    /// When set, children created from here on are readonly.
    child_locks_disabled: AtomicBool,
    /// Number of children of this resource (not the number of cached child
    /// contexts): for a table this is its page count.
    capacity: AtomicUsize,
    /// Per transaction, the number of locks held on resources strictly below
    /// this node.
    num_child_locks: Mutex<HashMap<TransactionId, usize>>,
    /// Lazily created child contexts, cached for the manager's lifetime.
    children: Mutex<HashMap<String, Arc<LockContext>>>,
}

/// Whether a transaction holding `held` on the parent resource may take or
/// promote to `child` on a child resource.
fn parent_requirement_met(held: Option<LockType>, child: LockType) -> bool {
    let required = LockType::parent_lock(Some(child));
    held == required || held == Some(child) || LockType::substitutable(held, required)
}

fn describe(held: Option<LockType>) -> String {
    match held {
        Some(lock_type) => lock_type.to_string(),
        None => "no lock".to_string(),
    }
}

impl LockContext {
    pub(crate) fn new_root(manager: Arc<LockManager>, name: &str) -> Arc<Self> {
        Arc::new(Self {
            manager,
            parent: Weak::new(),
            name: ResourceName::root(name),
            readonly: false,
            child_locks_disabled: AtomicBool::new(false),
            capacity: AtomicUsize::new(0),
            num_child_locks: Mutex::new(HashMap::new()),
            children: Mutex::new(HashMap::new()),
        })
    }

    /// The resource this context pertains to.
    pub fn name(&self) -> &ResourceName {
        &self.name
    }

    pub fn parent(&self) -> Option<Arc<LockContext>> {
        self.parent.upgrade()
    }

    pub fn readonly(&self) -> bool {
        self.readonly
    }

    /// The context for the child named `segment`, created readonly when this
    /// context is readonly or has child locks disabled.
    pub fn child(self: &Arc<Self>, segment: &str) -> Arc<LockContext> {
        let mut children = self.children.lock();
        if let Some(child) = children.get(segment) {
            return Arc::clone(child);
        }
        let readonly = self.readonly || self.child_locks_disabled.load(Ordering::SeqCst);
        let child = Arc::new(Self {
            manager: Arc::clone(&self.manager),
            parent: Arc::downgrade(self),
            name: self.name.child(segment),
            readonly,
            child_locks_disabled: AtomicBool::new(readonly),
            capacity: AtomicUsize::new(0),
            num_child_locks: Mutex::new(HashMap::new()),
            children: Mutex::new(HashMap::new()),
        });
        children.insert(segment.to_string(), Arc::clone(&child));
        child
    }

    /// Acquire `lock_type` here for `transaction`. Below a root, the
    /// transaction must already hold a sufficient intent lock on the parent
    /// resource; intent locks are taken top-down.
    pub fn acquire(&self, transaction: &Arc<dyn Transaction>, lock_type: LockType) -> LockResult<()> {
        self.check_writable("acquire")?;
        let txn = transaction.id();
        {
            let mut state = self.manager.state();
            if let Some(parent) = self.parent.upgrade() {
                let held = state.lock_type(txn, &parent.name);
                if !parent_requirement_met(held, lock_type) {
                    return Err(LockError::InvalidLock(format!(
                        "transaction {} holds {} on {}, which does not permit {} on {}",
                        txn,
                        describe(held),
                        parent.name,
                        lock_type,
                        self.name
                    )));
                }
            }
            state.acquire(transaction, &self.name, lock_type)?;
        }
        self.for_each_strict_ancestor(|ancestor| ancestor.add_child_locks(txn, 1));
        Ok(())
    }

    /// Release `transaction`'s lock on this resource. Fails with
    /// [`LockError::InvalidLock`] when a lock the transaction holds further
    /// down would be left without any ancestor satisfying its parent-lock
    /// requirement.
    pub fn release(&self, transaction: &Arc<dyn Transaction>) -> LockResult<()> {
        self.check_writable("release")?;
        let txn = transaction.id();
        {
            let mut state = self.manager.state();
            for lock in state
                .locks_held_by(txn)
                .iter()
                .filter(|lock| lock.name.is_descendant_of(&self.name))
            {
                let orphaned = lock
                    .name
                    .ancestors()
                    .iter()
                    .filter(|ancestor| **ancestor != self.name)
                    .all(|ancestor| {
                        !parent_requirement_met(state.lock_type(txn, ancestor), lock.lock_type)
                    });
                if orphaned {
                    return Err(LockError::InvalidLock(format!(
                        "releasing {} would orphan the {} lock on {}",
                        self.name, lock.lock_type, lock.name
                    )));
                }
            }
            state.release(txn, &self.name)?;
        }
        self.for_each_strict_ancestor(|ancestor| ancestor.add_child_locks(txn, -1));
        Ok(())
    }

    /// Promote `transaction`'s lock here to `new_type`. A promotion to `SIX`
    /// also releases every descendant `S`/`IS` lock the transaction holds
    /// under this node, in the same manager critical section, since `SIX`
    /// subsumes them.
    pub fn promote(&self, transaction: &Arc<dyn Transaction>, new_type: LockType) -> LockResult<()> {
        self.check_writable("promote")?;
        if new_type == LockType::SIX {
            return self.promote_to_six(transaction);
        }
        let txn = transaction.id();
        let mut state = self.manager.state();
        if let Some(parent) = self.parent.upgrade() {
            let held = state.lock_type(txn, &parent.name);
            if !parent_requirement_met(held, new_type) {
                return Err(LockError::InvalidLock(format!(
                    "transaction {} holds {} on {}, which does not permit {} on {}",
                    txn,
                    describe(held),
                    parent.name,
                    new_type,
                    self.name
                )));
            }
        }
        state.promote(transaction, &self.name, new_type)
    }

    fn promote_to_six(&self, transaction: &Arc<dyn Transaction>) -> LockResult<()> {
        let txn = transaction.id();
        let released;
        {
            let mut state = self.manager.state();
            if let Some(parent) = self.parent.upgrade() {
                let held = state.lock_type(txn, &parent.name);
                if !parent_requirement_met(held, LockType::SIX) {
                    return Err(LockError::InvalidLock(format!(
                        "transaction {} holds {} on {}, which does not permit SIX on {}",
                        txn,
                        describe(held),
                        parent.name,
                        self.name
                    )));
                }
            }
            let held = state.lock_type(txn, &self.name).ok_or_else(|| {
                LockError::NoLockHeld(format!(
                    "transaction {} holds no lock on {}",
                    txn, self.name
                ))
            })?;
            if held == LockType::SIX {
                return Err(LockError::DuplicateLockRequest(format!(
                    "transaction {} already holds SIX on {}",
                    txn, self.name
                )));
            }
            if !LockType::substitutable(Some(LockType::SIX), Some(held)) {
                return Err(LockError::InvalidLock(format!(
                    "SIX is not a promotion of {} on {}",
                    held, self.name
                )));
            }
            let descendants: Vec<ResourceName> = state
                .locks_held_by(txn)
                .into_iter()
                .filter(|lock| {
                    lock.name.is_descendant_of(&self.name)
                        && matches!(lock.lock_type, LockType::S | LockType::IS)
                })
                .map(|lock| lock.name)
                .collect();
            log::debug!(
                "promoting transaction {} to SIX on {}, absorbing {} descendant locks",
                txn,
                self.name,
                descendants.len()
            );
            let mut releases = descendants.clone();
            releases.push(self.name.clone());
            state.acquire_and_release(transaction, &self.name, LockType::SIX, releases)?;
            released = descendants;
        }
        self.note_descendant_releases(txn, &released);
        Ok(())
    }

    /// Consolidate every lock `transaction` holds under this node into one
    /// lock at this level, of the least permissive sufficient type, in a
    /// single manager call.
    pub fn escalate(&self, transaction: &Arc<dyn Transaction>) -> LockResult<()> {
        self.check_writable("escalate")?;
        let txn = transaction.id();
        let released;
        let had_local;
        {
            let mut state = self.manager.state();
            let descendants: Vec<ResourceName> = state
                .locks_held_by(txn)
                .iter()
                .filter(|lock| lock.name.is_descendant_of(&self.name))
                .map(|lock| lock.name.clone())
                .collect();
            if descendants.is_empty() {
                return Err(LockError::NoLockHeld(format!(
                    "transaction {} holds no locks under {}",
                    txn, self.name
                )));
            }
            let local = state.lock_type(txn, &self.name);
            let needs_exclusive = state
                .locks_held_by(txn)
                .iter()
                .filter(|lock| lock.name == self.name || lock.name.is_descendant_of(&self.name))
                .any(|lock| matches!(lock.lock_type, LockType::X | LockType::IX | LockType::SIX));
            let target = if needs_exclusive {
                LockType::X
            } else {
                LockType::S
            };
            let mut releases = descendants.clone();
            if local.is_some() {
                releases.push(self.name.clone());
            }
            log::debug!(
                "escalating transaction {} to {} on {}, consolidating {} descendant locks",
                txn,
                target,
                self.name,
                descendants.len()
            );
            state.acquire_and_release(transaction, &self.name, target, releases)?;
            released = descendants;
            had_local = local.is_some();
        }
        self.note_descendant_releases(txn, &released);
        self.num_child_locks.lock().remove(&txn);
        if !had_local {
            self.for_each_strict_ancestor(|ancestor| ancestor.add_child_locks(txn, 1));
        }
        Ok(())
    }

    /// The lock held on this resource or on the closest locked ancestor, or
    /// `None` if the transaction holds nothing on the chain.
    pub fn global_lock_type(&self, txn: TransactionId) -> Option<LockType> {
        let state = self.manager.state();
        if let Some(lock_type) = state.lock_type(txn, &self.name) {
            return Some(lock_type);
        }
        let mut current = self.parent.upgrade();
        while let Some(node) = current {
            if let Some(lock_type) = state.lock_type(txn, &node.name) {
                return Some(lock_type);
            }
            current = node.parent.upgrade();
        }
        None
    }

    /// The lock held on exactly this resource, or `None`.
    pub fn local_lock_type(&self, txn: TransactionId) -> Option<LockType> {
        self.manager.lock_type(txn, &self.name)
    }

    /// Disable locking of children: every child context created after this
    /// call is readonly. Used for indices and temporary tables, where
    /// fine-grained locking is disallowed.
    pub fn disable_child_locks(&self) {
        self.child_locks_disabled.store(true, Ordering::SeqCst);
    }

    /// Set the number of children of this resource.
    pub fn set_capacity(&self, capacity: usize) {
        self.capacity.store(capacity, Ordering::SeqCst);
    }

    pub fn capacity(&self) -> usize {
        self.capacity.load(Ordering::SeqCst)
    }

    /// Fraction of this node's children the transaction holds locks under:
    /// child-lock count over capacity, or `0.0` when capacity is zero.
    pub fn saturation(&self, txn: TransactionId) -> f64 {
        let capacity = self.capacity();
        if capacity == 0 {
            return 0.0;
        }
        let counts = self.num_child_locks.lock();
        counts.get(&txn).copied().unwrap_or(0) as f64 / capacity as f64
    }

    /// The number of locks `txn` holds strictly below this node.
    pub fn child_lock_count(&self, txn: TransactionId) -> usize {
        self.num_child_locks.lock().get(&txn).copied().unwrap_or(0)
    }

    fn check_writable(&self, operation: &str) -> LockResult<()> {
        if self.readonly {
            return Err(LockError::Unsupported(format!(
                "{} on readonly lock context {}",
                operation, self.name
            )));
        }
        Ok(())
    }

    fn for_each_strict_ancestor(&self, mut apply: impl FnMut(&LockContext)) {
        let mut current = self.parent.upgrade();
        while let Some(node) = current {
            apply(&node);
            current = node.parent.upgrade();
        }
    }

    fn add_child_locks(&self, txn: TransactionId, delta: i64) {
        let mut counts = self.num_child_locks.lock();
        let count = counts.entry(txn).or_insert(0);
        if delta < 0 {
            *count = count.saturating_sub(delta.unsigned_abs() as usize);
        } else {
            *count += delta as usize;
        }
        if *count == 0 {
            counts.remove(&txn);
        }
    }

    /// Propagate the removal of `released` descendant locks into the
    /// child-lock counters: this node and everything above it counted each
    /// released lock once, as did any cached node between this one and the
    /// released resource.
    fn note_descendant_releases(&self, txn: TransactionId, released: &[ResourceName]) {
        if released.is_empty() {
            return;
        }
        let removed = released.len() as i64;
        self.add_child_locks(txn, -removed);
        self.for_each_strict_ancestor(|ancestor| ancestor.add_child_locks(txn, -removed));
        self.discount_cached_subtree(txn, released);
    }

    fn discount_cached_subtree(&self, txn: TransactionId, released: &[ResourceName]) {
        let children = self.children.lock();
        for child in children.values() {
            let below = released
                .iter()
                .filter(|resource| resource.is_descendant_of(&child.name))
                .count();
            if below > 0 {
                child.add_child_locks(txn, -(below as i64));
                child.discount_cached_subtree(txn, released);
            }
        }
    }
}

impl std::fmt::Debug for LockContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockContext")
            .field("name", &self.name)
            .field("readonly", &self.readonly)
            .field(
                "child_locks_disabled",
                &self.child_locks_disabled.load(Ordering::Relaxed),
            )
            .field("capacity", &self.capacity.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lock_type::LockType::*;
    use crate::manager::Lock;
    use crate::transaction::SyncTransaction;

    fn txn(id: TransactionId) -> (Arc<SyncTransaction>, Arc<dyn Transaction>) {
        let inner = Arc::new(SyncTransaction::new(id));
        (Arc::clone(&inner), inner)
    }

    fn setup() -> (Arc<LockManager>, Arc<LockContext>) {
        let manager = Arc::new(LockManager::new());
        let db = manager.database_context();
        (manager, db)
    }

    #[test]
    fn test_acquire_requires_parent_intent() {
        let (_, db) = setup();
        let (_, t1) = txn(1);
        let table = db.child("orders");

        let err = table.acquire(&t1, S).unwrap_err();
        assert!(matches!(err, LockError::InvalidLock(_)));

        db.acquire(&t1, IS).unwrap();
        table.acquire(&t1, S).unwrap();
        assert_eq!(table.local_lock_type(1), Some(S));
    }

    #[test]
    fn test_any_is_or_stronger_parent_permits_shared_child() {
        for parent_type in [IS, IX, S, SIX, X] {
            let (_, db) = setup();
            let (_, t1) = txn(1);
            db.acquire(&t1, parent_type).unwrap();
            let table = db.child("orders");
            table
                .acquire(&t1, S)
                .unwrap_or_else(|err| panic!("{} on parent rejected S: {}", parent_type, err));
        }
    }

    #[test]
    fn test_exclusive_child_needs_ix_or_stronger() {
        let (_, db) = setup();
        let (_, t1) = txn(1);
        db.acquire(&t1, IS).unwrap();
        let table = db.child("orders");

        let err = table.acquire(&t1, X).unwrap_err();
        assert!(matches!(err, LockError::InvalidLock(_)));

        db.promote(&t1, IX).unwrap();
        table.acquire(&t1, X).unwrap();
    }

    #[test]
    fn test_child_lock_counts_cover_all_ancestors() {
        let (_, db) = setup();
        let (_, t1) = txn(1);
        let table = db.child("orders");
        let page = table.child("page1");

        db.acquire(&t1, IS).unwrap();
        table.acquire(&t1, IS).unwrap();
        page.acquire(&t1, S).unwrap();

        assert_eq!(db.child_lock_count(1), 2);
        assert_eq!(table.child_lock_count(1), 1);
        assert_eq!(page.child_lock_count(1), 0);

        page.release(&t1).unwrap();
        assert_eq!(db.child_lock_count(1), 1);
        assert_eq!(table.child_lock_count(1), 0);
    }

    #[test]
    fn test_release_rejects_orphaning_descendants() {
        let (_, db) = setup();
        let (_, t1) = txn(1);
        let table = db.child("orders");

        db.acquire(&t1, IS).unwrap();
        table.acquire(&t1, IS).unwrap();

        // The table lock is the only ancestor grant left satisfying nothing
        // here, but the database lock is what the table's IS depends on.
        let err = db.release(&t1).unwrap_err();
        assert!(matches!(err, LockError::InvalidLock(_)));

        table.release(&t1).unwrap();
        db.release(&t1).unwrap();
        assert_eq!(db.local_lock_type(1), None);
    }

    #[test]
    fn test_release_allowed_when_another_ancestor_covers_descendants() {
        let (_, db) = setup();
        let (_, t1) = txn(1);
        let table = db.child("orders");
        let page = table.child("page1");

        db.acquire(&t1, IS).unwrap();
        table.acquire(&t1, IS).unwrap();
        page.acquire(&t1, S).unwrap();

        // The database IS still satisfies the page's parent-lock requirement,
        // so the table lock can go.
        table.release(&t1).unwrap();
        assert_eq!(table.local_lock_type(1), None);
        assert_eq!(page.local_lock_type(1), Some(S));
        assert_eq!(db.child_lock_count(1), 1);
    }

    #[test]
    fn test_promote_checks_parent_intent() {
        let (_, db) = setup();
        let (_, t1) = txn(1);
        let table = db.child("orders");

        db.acquire(&t1, IS).unwrap();
        table.acquire(&t1, IS).unwrap();

        // S on the table only needs IS on the database.
        table.promote(&t1, S).unwrap();
        assert_eq!(table.local_lock_type(1), Some(S));

        // X on the table needs IX on the database, which IS does not give.
        let err = table.promote(&t1, X).unwrap_err();
        assert!(matches!(err, LockError::InvalidLock(_)));
    }

    #[test]
    fn test_promote_to_six_absorbs_shared_descendants() {
        let (manager, db) = setup();
        let (_, t1) = txn(1);
        let table = db.child("orders");
        let page1 = table.child("page1");
        let page2 = table.child("page2");

        db.acquire(&t1, IX).unwrap();
        table.acquire(&t1, IX).unwrap();
        page1.acquire(&t1, S).unwrap();
        page2.acquire(&t1, IS).unwrap();

        table.promote(&t1, SIX).unwrap();

        assert_eq!(table.local_lock_type(1), Some(SIX));
        assert_eq!(page1.local_lock_type(1), None);
        assert_eq!(page2.local_lock_type(1), None);
        // The table keeps its acquisition slot; the pages are gone.
        assert_eq!(
            manager.transaction_locks(1),
            vec![
                Lock {
                    name: db.name().clone(),
                    lock_type: IX
                },
                Lock {
                    name: table.name().clone(),
                    lock_type: SIX
                },
            ]
        );
        assert_eq!(db.child_lock_count(1), 1);
        assert_eq!(table.child_lock_count(1), 0);
    }

    #[test]
    fn test_promote_to_six_keeps_exclusive_descendants() {
        let (_, db) = setup();
        let (_, t1) = txn(1);
        let table = db.child("orders");
        let page1 = table.child("page1");
        let page2 = table.child("page2");

        db.acquire(&t1, IX).unwrap();
        table.acquire(&t1, IX).unwrap();
        page1.acquire(&t1, S).unwrap();
        page2.acquire(&t1, X).unwrap();

        table.promote(&t1, SIX).unwrap();
        assert_eq!(page1.local_lock_type(1), None);
        assert_eq!(page2.local_lock_type(1), Some(X));
        assert_eq!(table.child_lock_count(1), 1);
    }

    #[test]
    fn test_escalate_consolidates_to_minimal_type() {
        let (manager, db) = setup();
        let (_, t1) = txn(1);
        let table1 = db.child("table1");
        let table2 = db.child("table2");
        let page3 = table1.child("page3");
        let page5 = table1.child("page5");

        db.acquire(&t1, IX).unwrap();
        table1.acquire(&t1, IX).unwrap();
        table2.acquire(&t1, S).unwrap();
        page3.acquire(&t1, S).unwrap();
        page5.acquire(&t1, X).unwrap();

        table1.escalate(&t1).unwrap();

        assert_eq!(
            manager.transaction_locks(1),
            vec![
                Lock {
                    name: db.name().clone(),
                    lock_type: IX
                },
                Lock {
                    name: table1.name().clone(),
                    lock_type: X
                },
                Lock {
                    name: table2.name().clone(),
                    lock_type: S
                },
            ]
        );
        assert_eq!(table1.child_lock_count(1), 0);
        assert_eq!(db.child_lock_count(1), 2);
    }

    #[test]
    fn test_escalate_shared_only_descendants_take_shared() {
        let (_, db) = setup();
        let (_, t1) = txn(1);
        let table = db.child("orders");
        let page1 = table.child("page1");
        let page2 = table.child("page2");

        db.acquire(&t1, IS).unwrap();
        table.acquire(&t1, IS).unwrap();
        page1.acquire(&t1, S).unwrap();
        page2.acquire(&t1, S).unwrap();

        table.escalate(&t1).unwrap();
        assert_eq!(table.local_lock_type(1), Some(S));
        assert_eq!(page1.local_lock_type(1), None);
        assert_eq!(page2.local_lock_type(1), None);
        assert_eq!(table.child_lock_count(1), 0);
        assert_eq!(db.child_lock_count(1), 1);
    }

    #[test]
    fn test_escalate_without_descendant_locks_is_rejected() {
        let (_, db) = setup();
        let (_, t1) = txn(1);
        db.acquire(&t1, IX).unwrap();
        let err = db.escalate(&t1).unwrap_err();
        assert!(matches!(err, LockError::NoLockHeld(_)));
    }

    #[test]
    fn test_readonly_context_rejects_all_mutations() {
        let (_, db) = setup();
        let (_, t1) = txn(1);
        db.acquire(&t1, IX).unwrap();
        let index = db.child("orders_pk");
        db.disable_child_locks();
        // Already-cached children are unaffected; new ones are readonly.
        assert!(!index.readonly());
        let temp = db.child("temp_table");
        assert!(temp.readonly());

        for result in [
            temp.acquire(&t1, S),
            temp.release(&t1),
            temp.promote(&t1, X),
            temp.escalate(&t1),
        ] {
            let err = result.unwrap_err();
            assert!(matches!(err, LockError::Unsupported(_)));
        }

        // Readonly is monotonic down the tree.
        assert!(temp.child("page1").readonly());
    }

    #[test]
    fn test_global_and_local_lock_type() {
        let (_, db) = setup();
        let (_, t1) = txn(1);
        let table = db.child("orders");
        let page = table.child("page1");

        assert_eq!(page.global_lock_type(1), None);

        db.acquire(&t1, IS).unwrap();
        assert_eq!(page.global_lock_type(1), Some(IS));
        assert_eq!(page.local_lock_type(1), None);

        table.acquire(&t1, S).unwrap();
        assert_eq!(page.global_lock_type(1), Some(S));
        assert_eq!(table.local_lock_type(1), Some(S));
        assert_eq!(table.global_lock_type(1), Some(S));
    }

    #[test]
    fn test_saturation() {
        let (_, db) = setup();
        let (_, t1) = txn(1);
        let table = db.child("orders");

        // Zero capacity always reads as zero saturation.
        db.acquire(&t1, IS).unwrap();
        table.acquire(&t1, IS).unwrap();
        assert_eq!(db.saturation(1), 0.0);

        db.set_capacity(4);
        assert_eq!(db.capacity(), 4);
        assert_eq!(db.saturation(1), 0.25);
        // Unknown transactions saturate nothing.
        assert_eq!(db.saturation(42), 0.0);
    }

    #[test]
    fn test_child_contexts_are_cached() {
        let (_, db) = setup();
        let table = db.child("orders");
        assert!(Arc::ptr_eq(&table, &db.child("orders")));
        assert_eq!(table.parent().map(|p| p.name().clone()), Some(db.name().clone()));
        assert_eq!(table.name().to_string(), "database/orders");
    }
}
