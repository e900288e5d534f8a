// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! LockTree - multigranularity locking for transactional storage engines
//!
//! LockTree grants, queues, and releases locks on hierarchically nested
//! resources (database, table, page) so that concurrent transactions observe
//! serializable access.
//!
//! # Features
//!
//! - **Lock type algebra**: compatibility, required parent lock, and
//!   substitutability over `S`, `X`, `IS`, `IX`, `SIX`
//! - **Flat lock manager**: grant bookkeeping in acquisition order plus a
//!   single global FIFO wait queue
//! - **Hierarchical contexts**: intent-lock enforcement, lock escalation,
//!   readonly subtrees, and per-transaction saturation metrics
//!
//! # Usage
//!
//! ```ignore
//! let manager = Arc::new(LockManager::new());
//! let txn: Arc<dyn Transaction> = Arc::new(SyncTransaction::new(1));
//!
//! let db = manager.database_context();
//! let table = db.child("orders");
//!
//! db.acquire(&txn, LockType::IX)?;
//! table.acquire(&txn, LockType::X)?;
//! ```
//!
//! Callers interact with [`LockContext`] nodes; each node validates the
//! multigranularity invariant against its parent and delegates the actual
//! grant/queue/release mechanics to the [`LockManager`], which is the single
//! source of truth. Deadlock detection is out of scope: a cycle of mutual
//! waits hangs until an external actor aborts one of the transactions.

pub mod context;
pub mod error;
pub mod lock_type;
pub mod manager;
pub mod resource;
pub mod transaction;

pub use context::LockContext;
pub use error::{LockError, LockResult};
pub use lock_type::LockType;
pub use manager::{Lock, LockManager};
pub use resource::ResourceName;
pub use transaction::{SyncTransaction, Transaction, TransactionId};

/// LockTree version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
