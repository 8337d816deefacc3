//! Tree rendering for model attachment hierarchies

use console::Style;

use md3_pose::model::BodyPart;

/// Represents a node in a tree structure
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub name: String,
    pub node_type: NodeType,
    pub children: Vec<TreeNode>,
    /// Shown in insertion order
    pub metadata: Vec<(String, String)>,
    pub external_refs: Vec<ExternalRef>,
}

/// Types of nodes in the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Scene,
    Model(BodyPart),
    /// Tag slot with nothing mounted on it
    EmptySlot,
}

/// File a model refers to, such as a shader texture
#[derive(Debug, Clone)]
pub struct ExternalRef {
    pub path: String,
    pub ref_type: RefType,
    pub exists: Option<bool>,
}

/// Types of external references
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefType {
    Texture,
    Model,
    Skin,
    Shader,
    Unknown,
}

/// Options for tree rendering
#[derive(Debug, Clone)]
pub struct TreeOptions {
    pub max_depth: Option<usize>,
    pub show_external_refs: bool,
    pub no_color: bool,
    pub show_metadata: bool,
    pub compact: bool,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            max_depth: None,
            show_external_refs: true,
            no_color: false,
            show_metadata: true,
            compact: false,
        }
    }
}

impl TreeNode {
    pub fn new(name: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            name: name.into(),
            node_type,
            children: Vec::new(),
            metadata: Vec::new(),
            external_refs: Vec::new(),
        }
    }

    /// Add a child node
    pub fn add_child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    /// Add metadata
    pub fn with_metadata(mut self, key: &str, value: impl ToString) -> Self {
        self.metadata.push((key.to_string(), value.to_string()));
        self
    }

    /// Add external reference
    pub fn with_external_ref(mut self, path: &str, ref_type: RefType) -> Self {
        self.external_refs.push(ExternalRef {
            path: path.to_string(),
            ref_type,
            exists: None,
        });
        self
    }
}

impl NodeType {
    pub fn icon(self) -> &'static str {
        match self {
            Self::Scene => "🎬",
            Self::Model(BodyPart::Head) => "🙂",
            Self::Model(BodyPart::Torso) => "👕",
            Self::Model(BodyPart::Legs) => "👖",
            Self::Model(BodyPart::Weapon) => "🔫",
            Self::Model(BodyPart::Light) => "🔦",
            Self::Model(BodyPart::Unknown) => "📦",
            Self::EmptySlot => "○",
        }
    }

    pub fn style(self, no_color: bool) -> Style {
        if no_color {
            return Style::new();
        }
        match self {
            Self::Scene => Style::new().bold(),
            Self::Model(BodyPart::Weapon) => Style::new().red(),
            Self::Model(BodyPart::Light) => Style::new().yellow(),
            Self::Model(_) => Style::new().cyan(),
            Self::EmptySlot => Style::new().dim(),
        }
    }
}

impl ExternalRef {
    pub fn icon(&self) -> &'static str {
        match self.ref_type {
            RefType::Texture => "🖼️",
            RefType::Model => "🏗️",
            RefType::Skin => "🎨",
            RefType::Shader => "✨",
            RefType::Unknown => "📁",
        }
    }

    /// Get color style based on existence
    pub fn style(&self, no_color: bool) -> Style {
        if no_color {
            Style::new()
        } else {
            match self.exists {
                Some(true) => Style::new().green(),
                Some(false) => Style::new().red(),
                None => Style::new().yellow(),
            }
        }
    }
}

/// Render a tree to a string
pub fn render_tree(root: &TreeNode, options: &TreeOptions) -> String {
    let mut output = String::new();
    render_node(root, &mut output, "", true, 0, options);
    output
}

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

    let style = node.node_type.style(options.no_color);
    let connector = if depth == 0 {
        ""
    } else if is_last {
        "└── "
    } else {
        "├── "
    };

    output.push_str(&format!(
        "{prefix}{connector}{} {}",
        node.node_type.icon(),
        style.apply_to(&node.name)
    ));

    if options.show_metadata && options.compact && !node.metadata.is_empty() {
        let meta_parts: Vec<String> = node
            .metadata
            .iter()
            .filter(|(key, _)| ["part", "frames", "tag"].contains(&key.as_str()))
            .map(|(key, value)| format!("{key}:{value}"))
            .collect();
        if !meta_parts.is_empty() {
            output.push_str(&format!(" [{}]", meta_parts.join(", ")));
        }
    }
    output.push('\n');

    let child_prefix = if depth == 0 {
        ""
    } else if is_last {
        "    "
    } else {
        "│   "
    };

    if options.show_metadata && !options.compact {
        let meta_prefix = format!("{prefix}{child_prefix}    ");
        let meta_style = Style::new().dim();
        for (key, value) in &node.metadata {
            output.push_str(&format!(
                "{meta_prefix}🏷️  {}: {value}\n",
                meta_style.apply_to(key)
            ));
        }
    }

    if options.show_external_refs {
        let ref_prefix = format!("{prefix}{child_prefix}    ");
        for ext_ref in &node.external_refs {
            output.push_str(&format!(
                "{ref_prefix}└─→ {} {}\n",
                ext_ref.icon(),
                ext_ref.style(options.no_color).apply_to(&ext_ref.path)
            ));
        }
    }

    let new_prefix = if depth == 0 {
        String::new()
    } else {
        format!("{prefix}{child_prefix}")
    };
    for (i, child) in node.children.iter().enumerate() {
        let is_last_child = i == node.children.len() - 1;
        render_node(
            child,
            output,
            &new_prefix,
            is_last_child,
            depth + 1,
            options,
        );
    }
}

/// Detect reference type from file extension
pub fn detect_ref_type(path: &str) -> RefType {
    let path_lower = path.to_lowercase();

    if [".tga", ".jpg", ".jpeg", ".png"]
        .iter()
        .any(|ext| path_lower.ends_with(ext))
    {
        RefType::Texture
    } else if path_lower.ends_with(".md3") {
        RefType::Model
    } else if path_lower.ends_with(".skin") {
        RefType::Skin
    } else if path_lower.ends_with(".shader") || !path_lower.contains('.') {
        RefType::Shader
    } else {
        RefType::Unknown
    }
}
