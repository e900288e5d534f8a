// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Lock type algebra for multigranularity locking
//!
//! Pure, total functions over the five lock types plus "no lock", which is
//! represented as `None` everywhere and never stored in the lock tables.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The lock types of the multigranularity scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LockType {
    /// Shared
    S,
    /// Exclusive
    X,
    /// Intention shared
    IS,
    /// Intention exclusive
    IX,
    /// Shared with intention exclusive
    SIX,
}

impl LockType {
    /// Whether a transaction holding `a` on a resource can coexist with
    /// another transaction holding `b` on the same resource. Symmetric.
    pub fn compatible(a: Option<LockType>, b: Option<LockType>) -> bool {
        use LockType::*;
        match (a, b) {
            (None, _) | (_, None) => true,
            (Some(a), Some(b)) => match (a, b) {
                (X, _) | (_, X) => false,
                (IS, _) | (_, IS) => true,
                (IX, IX) | (S, S) => true,
                _ => false,
            },
        }
    }

    /// The least permissive lock that must be held on the parent resource
    /// before `a` may be granted on a child.
    pub fn parent_lock(a: Option<LockType>) -> Option<LockType> {
        use LockType::*;
        a.map(|a| match a {
            S | IS => IS,
            X | IX | SIX => IX,
        })
    }

    /// Whether holding `substitute` entitles the holder to everything
    /// `required` would. Strict: a type never substitutes for itself, so a
    /// promotion to the currently held type is rejected rather than a no-op.
    pub fn substitutable(substitute: Option<LockType>, required: Option<LockType>) -> bool {
        use LockType::*;
        match (substitute, required) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(s), Some(r)) => match (s, r) {
                (X, X) => false,
                (X, _) => true,
                (SIX, S) | (SIX, IS) | (SIX, IX) => true,
                (S, IS) | (IX, IS) => true,
                _ => false,
            },
        }
    }
}

impl fmt::Display for LockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LockType::S => "S",
            LockType::X => "X",
            LockType::IS => "IS",
            LockType::IX => "IX",
            LockType::SIX => "SIX",
        };
        write!(f, "{}", name)
    }
}
