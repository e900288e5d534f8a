// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Error types for the locking subsystem
//!
//! All variants are local, synchronous validation failures: the caller is
//! expected to have checked preconditions, never to retry the identical call.
//! Waiting for a grant is not an error condition.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LockError {
    /// The transaction already holds a lock where a fresh grant was requested.
    #[error("Duplicate lock request: {0}")]
    DuplicateLockRequest(String),

    /// The operation targets a resource the transaction holds nothing on.
    #[error("No lock held: {0}")]
    NoLockHeld(String),

    /// A promotion target, a parent-intent precondition, or a release that
    /// would orphan descendant locks.
    #[error("Invalid lock: {0}")]
    InvalidLock(String),

    /// A mutating call on a readonly lock context.
    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

pub type LockResult<T> = Result<T, LockError>;
