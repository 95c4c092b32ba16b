use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    Window,
    Container,
    Button,
    Selectable,
    Text,
    TextInput,
    Checkbox,
    Menu,
    MenuItem,
    Other,
}

impl NodeKind {
    pub const ALL: [NodeKind; 10] = [
        NodeKind::Window,
        NodeKind::Container,
        NodeKind::Button,
        NodeKind::Selectable,
        NodeKind::Text,
        NodeKind::TextInput,
        NodeKind::Checkbox,
        NodeKind::Menu,
        NodeKind::MenuItem,
        NodeKind::Other,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Window => "window",
            Self::Container => "container",
            Self::Button => "button",
            Self::Selectable => "selectable",
            Self::Text => "text",
            Self::TextInput => "textInput",
            Self::Checkbox => "checkbox",
            Self::Menu => "menu",
            Self::MenuItem => "menuItem",
            Self::Other => "other",
        }
    }

    pub fn from_name(raw: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(raw))
    }

    /// Kinds that accept pointer or keyboard interaction unless the host says
    /// otherwise.
    pub fn is_interactive_by_default(&self) -> bool {
        matches!(
            self,
            Self::Button
                | Self::Selectable
                | Self::TextInput
                | Self::Checkbox
                | Self::Menu
                | Self::MenuItem
        )
    }
}

fn default_interactive() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiNode {
    pub id: NodeId,
    #[serde(default)]
    pub label: String,
    pub kind: NodeKind,
    #[serde(default)]
    pub rect: Rect,
    #[serde(default = "default_interactive")]
    pub interactive: bool,
    #[serde(default)]
    pub children: Vec<UiNode>,
}

impl UiNode {
    pub fn new(id: u64, label: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: NodeId(id),
            label: label.into(),
            kind,
            rect: Rect::default(),
            interactive: kind.is_interactive_by_default(),
            children: Vec::new(),
        }
    }

    pub fn with_rect(mut self, rect: Rect) -> Self {
        self.rect = rect;
        self
    }

    pub fn with_interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    pub fn with_children(mut self, children: Vec<UiNode>) -> Self {
        self.children = children;
        self
    }

    pub fn push_child(&mut self, child: UiNode) {
        self.children.push(child);
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UiTree {
    #[serde(default)]
    pub frame: u64,
    #[serde(default)]
    pub roots: Vec<UiNode>,
}

impl UiTree {
    pub fn new(frame: u64, roots: Vec<UiNode>) -> Self {
        Self { frame, roots }
    }

    pub fn empty(frame: u64) -> Self {
        Self {
            frame,
            roots: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn node_at(&self, index_path: &[usize]) -> Option<&UiNode> {
        let (first, rest) = index_path.split_first()?;
        let mut node = self.roots.get(*first)?;
        for index in rest {
            node = node.children.get(*index)?;
        }
        Some(node)
    }

    pub fn walk(&self) -> Vec<(Vec<usize>, &UiNode)> {
        let mut out = Vec::new();
        for (index, root) in self.roots.iter().enumerate() {
            walk_node(root, vec![index], &mut out);
        }
        out
    }

    pub fn find_by_id(&self, id: NodeId) -> Option<&UiNode> {
        self.walk()
            .into_iter()
            .map(|(_, node)| node)
            .find(|node| node.id == id)
    }

    /// Deepest interactive node whose rect contains the point; later siblings
    /// win because they are drawn on top.
    pub fn hit_test(&self, x: f32, y: f32) -> Option<&UiNode> {
        self.walk()
            .into_iter()
            .map(|(_, node)| node)
            .filter(|node| node.interactive && node.rect.contains(x, y))
            .last()
    }
}

fn walk_node<'a>(node: &'a UiNode, path: Vec<usize>, out: &mut Vec<(Vec<usize>, &'a UiNode)>) {
    out.push((path.clone(), node));
    for (index, child) in node.children.iter().enumerate() {
        let mut child_path = path.clone();
        child_path.push(index);
        walk_node(child, child_path, out);
    }
}
