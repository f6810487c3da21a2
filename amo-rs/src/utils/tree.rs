//! Tree structure rendering for model hierarchies

use console::Style;
use std::collections::BTreeMap;

/// Represents a node in a tree structure
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub name: String,
    pub node_type: NodeType,
    pub children: Vec<TreeNode>,
    pub metadata: BTreeMap<String, String>,
}

/// Types of nodes in the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Root,
    Section,
    Joint,
    Object,
    Animation,
    Track,
}

/// Options for tree rendering
#[derive(Debug, Clone)]
pub struct TreeOptions {
    pub max_depth: Option<usize>,
    pub no_color: bool,
    pub show_metadata: bool,
    /// Print metadata inline after the node name
    pub compact: bool,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            max_depth: None,
            no_color: false,
            show_metadata: true,
            compact: true,
        }
    }
}

impl TreeNode {
    /// Create a new tree node
    pub fn new(name: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            name: name.into(),
            node_type,
            children: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }

    /// Add a child node
    pub fn add_child(mut self, child: TreeNode) -> Self {
        self.children.push(child);
        self
    }

    /// Add metadata
    pub fn with_metadata(mut self, key: &str, value: impl ToString) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }
}

impl NodeType {
    /// Get emoji icon for node type
    pub fn icon(self) -> &'static str {
        match self {
            NodeType::Root => "📁",
            NodeType::Section => "📋",
            NodeType::Joint => "🦴",
            NodeType::Object => "🔷",
            NodeType::Animation => "📽️",
            NodeType::Track => "🏷️",
        }
    }

    /// Get color style for node type
    pub fn style(self, no_color: bool) -> Style {
        if no_color {
            Style::new()
        } else {
            match self {
                NodeType::Root => Style::new().bold().cyan(),
                NodeType::Section => Style::new().bold().yellow(),
                NodeType::Joint => Style::new().green(),
                NodeType::Object => Style::new().blue(),
                NodeType::Animation => Style::new().magenta(),
                NodeType::Track => Style::new().dim(),
            }
        }
    }
}

/// Render a tree structure to string
pub fn render_tree(root: &TreeNode, options: &TreeOptions) -> String {
    let mut output = String::new();
    render_node(root, &mut output, "", true, 0, options);
    output
}

/// Render a single node and its children
fn render_node(
    node: &TreeNode,
    output: &mut String,
    prefix: &str,
    is_last: bool,
    depth: usize,
    options: &TreeOptions,
) {
    if let Some(max_depth) = options.max_depth
        && depth > max_depth
    {
        return;
    }

    let icon = node.node_type.icon();
    let style = node.node_type.style(options.no_color);
    let connector = if depth == 0 {
        ""
    } else if is_last {
        "└── "
    } else {
        "├── "
    };

    output.push_str(&format!(
        "{}{}{} {}",
        prefix,
        connector,
        icon,
        style.apply_to(&node.name)
    ));

    if options.show_metadata && options.compact && !node.metadata.is_empty() {
        let meta_parts: Vec<String> = node
            .metadata
            .iter()
            .map(|(key, value)| format!("{key}:{value}"))
            .collect();
        output.push_str(&format!(" [{}]", meta_parts.join(", ")));
    }
    output.push('\n');

    let child_prefix = if depth == 0 {
        String::new()
    } else {
        format!("{}{}", prefix, if is_last { "    " } else { "│   " })
    };

    if options.show_metadata && !options.compact {
        let meta_style = if options.no_color {
            Style::new()
        } else {
            Style::new().dim()
        };
        for (key, value) in &node.metadata {
            output.push_str(&format!(
                "{}    {}: {}\n",
                child_prefix,
                meta_style.apply_to(key),
                value
            ));
        }
    }

    // Render children
    for (i, child) in node.children.iter().enumerate() {
        let is_last_child = i == node.children.len() - 1;
        render_node(
            child,
            output,
            &child_prefix,
            is_last_child,
            depth + 1,
            options,
        );
    }
}
