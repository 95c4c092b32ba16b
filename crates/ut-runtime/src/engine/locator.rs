use ut_core::{NodeId, NodeKind, Rect, UiNode, UiTree};
use ut_path::ElementPath;

/// A located element. Only valid for the frame it was resolved in: the host
/// rebuilds its tree every frame, so refs are never carried across frames.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementRef {
    pub frame: u64,
    pub id: NodeId,
    pub index_path: Vec<usize>,
    pub label: String,
    pub kind: NodeKind,
    pub rect: Rect,
    pub interactive: bool,
}

impl ElementRef {
    fn from_node(frame: u64, index_path: Vec<usize>, node: &UiNode) -> Self {
        Self {
            frame,
            id: node.id,
            index_path,
            label: node.label.clone(),
            kind: node.kind,
            rect: node.rect,
            interactive: node.interactive,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub element: Option<ElementRef>,
    pub match_count: usize,
}

impl Resolution {
    pub fn is_ambiguous(&self) -> bool {
        self.match_count > 1
    }
}

/// Resolves `path` against the tree of frame `frame`. When several nodes
/// match, the first one in pre-order wins.
pub fn resolve(path: &ElementPath, tree: &UiTree, frame: u64) -> Resolution {
    let mut frontier: Vec<Vec<usize>> = vec![Vec::new()];
    let mut deep = false;

    for segment in path.segments() {
        if segment.is_deep() {
            deep = true;
            continue;
        }

        let mut next = Vec::new();
        for parent in &frontier {
            let candidates = if deep {
                descendants(tree, parent)
            } else {
                children(tree, parent)
            };
            next.extend(
                candidates
                    .into_iter()
                    .filter(|(_, node)| segment.matches(node))
                    .map(|(index_path, _)| index_path),
            );
        }
        // Index paths order lexicographically in pre-order.
        next.sort();
        next.dedup();

        deep = false;
        frontier = next;
        if frontier.is_empty() {
            break;
        }
    }

    let match_count = frontier.len();
    let element = frontier.into_iter().next().and_then(|index_path| {
        tree.node_at(&index_path)
            .map(|node| ElementRef::from_node(frame, index_path.clone(), node))
    });
    Resolution {
        element,
        match_count,
    }
}

fn child_nodes<'a>(tree: &'a UiTree, parent: &[usize]) -> &'a [UiNode] {
    if parent.is_empty() {
        return &tree.roots;
    }
    tree.node_at(parent)
        .map(|node| node.children.as_slice())
        .unwrap_or_default()
}

fn children<'a>(tree: &'a UiTree, parent: &[usize]) -> Vec<(Vec<usize>, &'a UiNode)> {
    child_nodes(tree, parent)
        .iter()
        .enumerate()
        .map(|(index, node)| {
            let mut index_path = parent.to_vec();
            index_path.push(index);
            (index_path, node)
        })
        .collect()
}

fn descendants<'a>(tree: &'a UiTree, parent: &[usize]) -> Vec<(Vec<usize>, &'a UiNode)> {
    let mut out = Vec::new();
    let mut stack = children(tree, parent);
    stack.reverse();
    while let Some((index_path, node)) = stack.pop() {
        let mut nested = children(tree, &index_path);
        nested.reverse();
        out.push((index_path, node));
        stack.extend(nested);
    }
    out
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchState {
    Searching { attempts_left: u32 },
    Found(ElementRef),
    NotFound,
}

impl SearchState {
    pub fn new(attempts: u32) -> Self {
        if attempts == 0 {
            return Self::NotFound;
        }
        Self::Searching {
            attempts_left: attempts,
        }
    }

    pub fn advance(self, path: &ElementPath, tree: &UiTree, frame: u64) -> Self {
        self.observe(resolve(path, tree, frame))
    }

    pub fn observe(self, resolution: Resolution) -> Self {
        let Self::Searching { attempts_left } = self else {
            return self;
        };
        if let Some(element) = resolution.element {
            return Self::Found(element);
        }
        match attempts_left.saturating_sub(1) {
            0 => Self::NotFound,
            attempts_left => Self::Searching { attempts_left },
        }
    }

    pub fn is_settled(&self) -> bool {
        !matches!(self, Self::Searching { .. })
    }
}

#[cfg(test)]
mod locator_tests {
    use super::*;
    use crate::engine::runtime_test_support::file_list_tree;

    fn path(raw: &str) -> ElementPath {
        ElementPath::parse(raw).expect("path should parse")
    }

    #[test]
    fn resolve_against_empty_tree_returns_no_match() {
        let resolution = resolve(&path("**/test.txt"), &UiTree::empty(1), 1);
        assert!(resolution.element.is_none());
        assert_eq!(resolution.match_count, 0);
    }

    #[test]
    fn deep_wildcard_skips_unnamed_containers() {
        let tree = file_list_tree(4, &["a.txt", "test.txt"]);
        let resolution = resolve(&path("**/test.txt"), &tree, 4);
        let element = resolution.element.expect("element should resolve");
        assert_eq!(element.label, "test.txt");
        assert_eq!(element.index_path, vec![0, 0, 1]);
        assert_eq!(element.frame, 4);
        assert!(element.interactive);

        let through_window = resolve(&path("Files/**/a.txt"), &tree, 4);
        assert_eq!(
            through_window.element.map(|element| element.index_path),
            Some(vec![0, 0, 0])
        );
    }

    #[test]
    fn literal_segments_only_match_direct_children() {
        let tree = file_list_tree(1, &["test.txt"]);
        assert!(resolve(&path("Files/test.txt"), &tree, 1).element.is_none());
        assert!(resolve(&path("Files/*/test.txt"), &tree, 1).element.is_some());
        assert_eq!(
            resolve(&path("Files/Open[button]"), &tree, 1)
                .element
                .map(|element| element.kind),
            Some(NodeKind::Button)
        );
    }

    #[test]
    fn ambiguous_matches_pick_first_in_pre_order() {
        let tree = file_list_tree(1, &["b.txt", "a.txt", "c.log"]);
        let resolution = resolve(&path("**/*.txt"), &tree, 1);
        assert_eq!(resolution.match_count, 2);
        assert!(resolution.is_ambiguous());
        assert_eq!(
            resolution.element.map(|element| element.label),
            Some("b.txt".to_string())
        );
    }

    #[test]
    fn nested_deep_matches_are_deduplicated() {
        let tree = UiTree::new(
            1,
            vec![UiNode::new(1, "pane", NodeKind::Container).with_children(vec![
                UiNode::new(2, "pane", NodeKind::Container)
                    .with_children(vec![UiNode::new(3, "go", NodeKind::Button)]),
            ])],
        );
        let resolution = resolve(&path("**/pane/**/go"), &tree, 1);
        assert_eq!(resolution.match_count, 1);
        assert_eq!(
            resolution.element.map(|element| element.id),
            Some(NodeId(3))
        );
    }

    #[test]
    fn search_state_succeeds_when_element_appears_within_budget() {
        let target = path("**/test.txt");
        let mut state = SearchState::new(3);

        state = state.advance(&target, &UiTree::empty(1), 1);
        assert_eq!(state, SearchState::Searching { attempts_left: 2 });
        state = state.advance(&target, &UiTree::empty(2), 2);
        assert!(!state.is_settled());
        state = state.advance(&target, &file_list_tree(3, &["test.txt"]), 3);

        let SearchState::Found(element) = state else {
            panic!("element should be found on the third frame");
        };
        assert_eq!(element.frame, 3);
    }

    #[test]
    fn search_state_gives_up_after_budget() {
        let target = path("**/test.txt");
        let mut state = SearchState::new(2);
        for frame in 1..=2 {
            state = state.advance(&target, &UiTree::empty(frame), frame);
        }
        assert_eq!(state, SearchState::NotFound);
        assert_eq!(
            state.advance(&target, &file_list_tree(3, &["test.txt"]), 3),
            SearchState::NotFound
        );
        assert_eq!(SearchState::new(0), SearchState::NotFound);
    }

    #[test]
    fn search_state_observes_a_resolution_made_by_the_caller() {
        let target = path("**/test.txt");
        let state = SearchState::new(1).observe(resolve(&target, &UiTree::empty(1), 1));
        assert_eq!(state, SearchState::NotFound);

        let tree = file_list_tree(2, &["test.txt"]);
        let state = SearchState::new(1).observe(resolve(&target, &tree, 2));
        assert!(state.is_settled());
        assert!(matches!(state, SearchState::Found(element) if element.frame == 2));
    }
}
