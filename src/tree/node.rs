//! Dependency tree node types

use crate::error::{ApiError, RangeError, RegistryError};
use crate::types::{Dependency, PackageKey};
use serde::{Deserialize, Serialize};

/// Why a non-root node could not be expanded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    NotFound,
    Transport,
    InvalidKey,
    UnsupportedRange,
    NoMatchingVersion,
}

/// Resolution error recorded on a node instead of failing the whole tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl From<&RegistryError> for ResolutionFailure {
    fn from(err: &RegistryError) -> Self {
        let kind = match err {
            RegistryError::NotFound { .. } => FailureKind::NotFound,
            RegistryError::Transport(_) | RegistryError::Decode(_) => FailureKind::Transport,
            RegistryError::InvalidKey(_) => FailureKind::InvalidKey,
        };
        Self {
            kind,
            message: err.to_string(),
        }
    }
}

impl From<&ApiError> for ResolutionFailure {
    fn from(err: &ApiError) -> Self {
        let kind = match err {
            ApiError::Registry(inner) => return inner.into(),
            ApiError::Range(RangeError::Unsupported { .. }) => FailureKind::UnsupportedRange,
            ApiError::Range(RangeError::NoMatch { .. }) => FailureKind::NoMatchingVersion,
            // Storage and config failures degrade to a registry call before reaching a node
            _ => FailureKind::Transport,
        };
        Self {
            kind,
            message: err.to_string(),
        }
    }
}

/// Node status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NodeStatus {
    /// Fully expanded; `children` mirrors the declared dependencies.
    Resolved,
    /// The key already appears on the path from the root; not expanded again.
    Cycle,
    /// Expansion stopped at the configured depth limit.
    Truncated,
    /// Resolution of this node failed; siblings are unaffected.
    Error(ResolutionFailure),
}

/// One occurrence of a package in a dependency tree.
///
/// Diamonds produce one node per occurrence; nodes are never shared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub key: PackageKey,
    /// Declared edge from the parent (None at the root)
    pub requested: Option<Dependency>,
    #[serde(flatten)]
    pub status: NodeStatus,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn resolved(key: PackageKey, requested: Option<Dependency>, children: Vec<TreeNode>) -> Self {
        Self {
            key,
            requested,
            status: NodeStatus::Resolved,
            children,
        }
    }

    /// Terminal node with no children.
    pub fn marker(key: PackageKey, requested: Option<Dependency>, status: NodeStatus) -> Self {
        Self {
            key,
            requested,
            status,
            children: Vec::new(),
        }
    }

    pub fn failed(
        key: PackageKey,
        requested: Option<Dependency>,
        failure: ResolutionFailure,
    ) -> Self {
        Self::marker(key, requested, NodeStatus::Error(failure))
    }

    pub fn is_cycle(&self) -> bool {
        matches!(self.status, NodeStatus::Cycle)
    }

    pub fn is_error(&self) -> bool {
        matches!(self.status, NodeStatus::Error(_))
    }

    pub fn failure(&self) -> Option<&ResolutionFailure> {
        match &self.status {
            NodeStatus::Error(failure) => Some(failure),
            _ => None,
        }
    }

    /// Declared dependency names of the direct children, in order.
    pub fn child_names(&self) -> Vec<&str> {
        self.children
            .iter()
            .map(|c| {
                c.requested
                    .as_ref()
                    .map(|d| d.name.as_str())
                    .unwrap_or(c.key.name.as_str())
            })
            .collect()
    }

    pub fn child(&self, name: &str) -> Option<&TreeNode> {
        self.children.iter().find(|c| {
            c.requested
                .as_ref()
                .map(|d| d.name == name)
                .unwrap_or(c.key.name == name)
        })
    }

    /// Visit every node depth-first, parents before children.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a TreeNode, usize)) {
        self.walk_at(0, visit);
    }

    fn walk_at<'a>(&'a self, depth: usize, visit: &mut impl FnMut(&'a TreeNode, usize)) {
        visit(self, depth);
        for child in &self.children {
            child.walk_at(depth + 1, visit);
        }
    }

    pub fn node_count(&self) -> usize {
        let mut count = 0;
        self.walk(&mut |_, _| count += 1);
        count
    }

    /// Depth of the deepest node; a lone root has depth 0.
    pub fn depth(&self) -> usize {
        let mut max = 0;
        self.walk(&mut |_, depth| max = max.max(depth));
        max
    }

    pub fn cycles(&self) -> Vec<&TreeNode> {
        let mut found = Vec::new();
        self.walk(&mut |node, _| {
            if node.is_cycle() {
                found.push(node);
            }
        });
        found
    }

    pub fn errors(&self) -> Vec<&TreeNode> {
        let mut found = Vec::new();
        self.walk(&mut |node, _| {
            if node.is_error() {
                found.push(node);
            }
        });
        found
    }
}
