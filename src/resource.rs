// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Hierarchical resource names
//!
//! A resource is identified by its path in the hierarchy: an ordered sequence
//! of name segments such as `["database", "orders", "page3"]`. A resource's
//! ancestors are its proper prefixes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The position of a lockable resource in the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceName {
    segments: Vec<String>,
}

impl ResourceName {
    /// A top-level resource with no parent.
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            segments: vec![name.into()],
        }
    }

    /// The name of a child of this resource.
    pub fn child(&self, name: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(name.into());
        Self { segments }
    }

    /// The name of this resource's parent, or `None` at a root.
    pub fn parent(&self) -> Option<ResourceName> {
        if self.segments.len() <= 1 {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Whether this resource sits strictly below `other` in the hierarchy.
    pub fn is_descendant_of(&self, other: &ResourceName) -> bool {
        self.segments.len() > other.segments.len()
            && self.segments[..other.segments.len()] == other.segments[..]
    }

    /// The proper prefixes of this name, shortest first.
    pub fn ancestors(&self) -> Vec<ResourceName> {
        (1..self.segments.len())
            .map(|len| Self {
                segments: self.segments[..len].to_vec(),
            })
            .collect()
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}
