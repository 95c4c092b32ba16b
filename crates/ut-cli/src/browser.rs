use std::path::{Path, PathBuf};

use ut_api::HeadlessHost;
use ut_core::{InputEvent, Key, NodeId, NodeKind, Rect, UiNode, UiTree};
use walkdir::WalkDir;

use crate::{map_cli_source_path, map_cli_source_scan, CliError};

pub(crate) const BROWSER_WIDTH: f32 = 40.0;
/// Two clicks on the same row within this many frames open it.
pub(crate) const DOUBLE_CLICK_FRAMES: u64 = 30;

const WINDOW_ID: u64 = 1;
const LIST_ID: u64 = 2;
const OPEN_BUTTON_ID: u64 = 3;
const STATUS_ID: u64 = 4;
const FIRST_ROW_ID: u64 = 100;

/// Demo host: a one-directory file list with an Open button and a status
/// line. Layout units are terminal cells.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FileBrowser {
    pub(crate) root: PathBuf,
    pub(crate) files: Vec<String>,
    pub(crate) selected: Option<usize>,
    pub(crate) opened: Vec<String>,
    pub(crate) status: String,
    pub(crate) typed: String,
    pub(crate) cursor: (f32, f32),
    pressed: Option<NodeId>,
    last_click: Option<(NodeId, u64)>,
}

impl FileBrowser {
    pub(crate) fn from_files(root: PathBuf, files: Vec<String>) -> Self {
        Self {
            root,
            files,
            selected: None,
            opened: Vec::new(),
            status: "ready".to_string(),
            typed: String::new(),
            cursor: (0.0, 0.0),
            pressed: None,
            last_click: None,
        }
    }

    /// Lists the regular files directly inside `dir`, sorted by name.
    pub(crate) fn load(dir: &str) -> Result<Self, CliError> {
        let root = resolve_dir(dir)?;
        let mut files = Vec::new();
        for entry in WalkDir::new(&root)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
        {
            let entry = entry.map_err(map_cli_source_scan)?;
            if !entry.file_type().is_file() {
                continue;
            }
            files.push(entry.file_name().to_string_lossy().to_string());
        }
        files.sort();
        tracing::debug!(dir = %root.display(), files = files.len(), "loaded directory");
        Ok(Self::from_files(root, files))
    }

    pub(crate) fn height(&self) -> f32 {
        self.files.len() as f32 + 4.0
    }

    pub(crate) fn viewport(&self) -> Rect {
        Rect::new(0.0, 0.0, BROWSER_WIDTH, self.height())
    }

    pub(crate) fn row_rect(index: usize) -> Rect {
        Rect::new(1.0, 1.0 + index as f32, BROWSER_WIDTH - 2.0, 1.0)
    }

    pub(crate) fn open_button_rect(&self) -> Rect {
        Rect::new(1.0, self.files.len() as f32 + 2.0, 6.0, 1.0)
    }

    pub(crate) fn status_rect(&self) -> Rect {
        Rect::new(9.0, self.files.len() as f32 + 2.0, BROWSER_WIDTH - 10.0, 1.0)
    }

    pub(crate) fn tree(&self, frame: u64) -> UiTree {
        let rows = self
            .files
            .iter()
            .enumerate()
            .map(|(index, name)| {
                UiNode::new(FIRST_ROW_ID + index as u64, name.as_str(), NodeKind::Selectable)
                    .with_rect(Self::row_rect(index))
            })
            .collect();
        let list = UiNode::new(LIST_ID, "", NodeKind::Container)
            .with_rect(Rect::new(0.0, 1.0, BROWSER_WIDTH, self.files.len() as f32))
            .with_children(rows);
        let open = UiNode::new(OPEN_BUTTON_ID, "Open", NodeKind::Button)
            .with_rect(self.open_button_rect());
        let status = UiNode::new(STATUS_ID, self.status.as_str(), NodeKind::Text)
            .with_rect(self.status_rect())
            .with_interactive(false);
        UiTree::new(
            frame,
            vec![UiNode::new(WINDOW_ID, "Files", NodeKind::Window)
                .with_rect(self.viewport())
                .with_children(vec![list, open, status])],
        )
    }

    pub(crate) fn apply(&mut self, frame: u64, event: InputEvent) {
        match event {
            InputEvent::MouseMove { x, y } => self.cursor = (x, y),
            InputEvent::MouseDown { .. } => self.pressed = self.node_under_cursor(frame),
            InputEvent::MouseUp { .. } => {
                let released = self.node_under_cursor(frame);
                if let Some(node) = released.filter(|node| Some(*node) == self.pressed) {
                    self.click(node, frame);
                }
                self.pressed = None;
            }
            InputEvent::KeyDown { key } => self.key(key),
            InputEvent::KeyUp { .. } => {}
            InputEvent::Char { ch } => {
                self.typed.push(ch);
                self.status = format!("typed {}", self.typed);
            }
            InputEvent::NavFocus { node } => {
                if let Some(index) = self.row_index(node) {
                    self.select(index);
                }
            }
        }
    }

    pub(crate) fn apply_all(&mut self, frame: u64, events: Vec<InputEvent>) {
        for event in events {
            self.apply(frame, event);
        }
    }

    fn node_under_cursor(&self, frame: u64) -> Option<NodeId> {
        let (x, y) = self.cursor;
        self.tree(frame).hit_test(x, y).map(|node| node.id)
    }

    fn click(&mut self, node: NodeId, frame: u64) {
        let double = matches!(
            self.last_click,
            Some((last, at)) if last == node && frame.saturating_sub(at) <= DOUBLE_CLICK_FRAMES
        );
        self.last_click = if double { None } else { Some((node, frame)) };

        if node == NodeId(OPEN_BUTTON_ID) {
            self.open_selected();
            return;
        }
        let Some(index) = self.row_index(node) else {
            return;
        };
        if double {
            self.open(index);
        } else {
            self.select(index);
        }
    }

    fn key(&mut self, key: Key) {
        match key {
            Key::Enter => self.open_selected(),
            Key::Up => {
                let index = self.selected.map_or(0, |index| index.saturating_sub(1));
                self.select(index);
            }
            Key::Down => {
                let last = self.files.len().saturating_sub(1);
                let index = self.selected.map_or(0, |index| (index + 1).min(last));
                self.select(index);
            }
            Key::Escape => {
                self.selected = None;
                self.last_click = None;
                self.status = "ready".to_string();
            }
            Key::Backspace => {
                self.typed.pop();
            }
            _ => {}
        }
    }

    fn row_index(&self, node: NodeId) -> Option<usize> {
        let index = node.0.checked_sub(FIRST_ROW_ID)? as usize;
        (index < self.files.len()).then_some(index)
    }

    fn select(&mut self, index: usize) {
        let Some(name) = self.files.get(index) else {
            return;
        };
        self.selected = Some(index);
        self.status = format!("selected {}", name);
    }

    fn open_selected(&mut self) {
        match self.selected {
            Some(index) => self.open(index),
            None => self.status = "nothing selected".to_string(),
        }
    }

    fn open(&mut self, index: usize) {
        let Some(name) = self.files.get(index).cloned() else {
            return;
        };
        self.selected = Some(index);
        self.status = format!("opened {}", name);
        tracing::info!(file = %name, "opened");
        self.opened.push(name);
    }
}

impl HeadlessHost for FileBrowser {
    fn frame_tree(&mut self, frame: u64) -> UiTree {
        self.tree(frame)
    }

    fn handle_input(&mut self, frame: u64, events: Vec<InputEvent>) {
        self.apply_all(frame, events);
    }
}

fn resolve_dir(dir: &str) -> Result<PathBuf, CliError> {
    let path = Path::new(dir);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(map_cli_source_path)?
            .join(path)
    };

    if !absolute.exists() {
        return Err(CliError::new(
            "CLI_SOURCE_NOT_FOUND",
            format!("dir does not exist: {}", absolute.display()),
        ));
    }
    if !absolute.is_dir() {
        return Err(CliError::new(
            "CLI_SOURCE_NOT_DIR",
            format!("dir is not a directory: {}", absolute.display()),
        ));
    }
    Ok(absolute)
}
