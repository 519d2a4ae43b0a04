//! Dependency trees
//!
//! A resolved tree is a plain owned structure: one [`TreeNode`] per occurrence
//! of a package, with terminal markers for cycles, depth limits and failures.

pub mod node;
pub mod render;

pub use node::{FailureKind, NodeStatus, ResolutionFailure, TreeNode};
pub use render::{render_json, render_text, RenderOptions};
