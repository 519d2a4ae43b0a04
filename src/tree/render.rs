//! Text and JSON rendering of resolved trees.

use crate::error::ApiError;
use crate::tree::node::{NodeStatus, TreeNode};
use owo_colors::OwoColorize;

#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    pub color: bool,
}

/// Render a tree with box-drawing connectors, one node per line.
pub fn render_text(root: &TreeNode, options: RenderOptions) -> String {
    let mut out = String::new();
    out.push_str(&label(root, options));
    out.push('\n');
    render_children(root, "", options, &mut out);
    out
}

fn render_children(node: &TreeNode, prefix: &str, options: RenderOptions, out: &mut String) {
    let count = node.children.len();
    for (i, child) in node.children.iter().enumerate() {
        let last = i + 1 == count;
        out.push_str(prefix);
        out.push_str(if last { "└── " } else { "├── " });
        out.push_str(&label(child, options));
        out.push('\n');

        let child_prefix = format!("{}{}", prefix, if last { "    " } else { "│   " });
        render_children(child, &child_prefix, options, out);
    }
}

fn label(node: &TreeNode, options: RenderOptions) -> String {
    let mut text = match &node.requested {
        Some(dep) if dep.name != node.key.name => format!("{} → ", dep.name),
        _ => String::new(),
    };

    let failed = node.is_error();
    // Failed nodes keep the declared range as their version; don't print it twice.
    let unresolved = failed
        && node
            .requested
            .as_ref()
            .map_or(false, |dep| dep.range == node.key.version);
    if unresolved {
        text.push_str(&node.key.name);
    } else {
        text.push_str(&node.key.to_string());
    }

    if let Some(dep) = &node.requested {
        let range = format!("({})", dep.range);
        text.push(' ');
        if options.color {
            text.push_str(&range.dimmed().to_string());
        } else {
            text.push_str(&range);
        }
    }

    let marker = match &node.status {
        NodeStatus::Resolved => None,
        NodeStatus::Cycle => Some(("[cycle]".to_string(), false)),
        NodeStatus::Truncated => Some(("[truncated]".to_string(), false)),
        NodeStatus::Error(failure) => Some((format!("[error: {}]", failure.message), true)),
    };
    if let Some((marker, is_error)) = marker {
        text.push(' ');
        match (options.color, is_error) {
            (true, true) => text.push_str(&marker.red().to_string()),
            (true, false) => text.push_str(&marker.yellow().to_string()),
            (false, _) => text.push_str(&marker),
        }
    }
    text
}

/// Pretty-printed JSON of the whole tree.
pub fn render_json(root: &TreeNode) -> Result<String, ApiError> {
    serde_json::to_string_pretty(root)
        .map_err(|e| ApiError::Serialization(format!("Failed to serialize tree: {}", e)))
}
