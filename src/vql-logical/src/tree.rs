//! Arena-backed plan tree.
//!
//! Nodes live in a single arena and refer to each other by [`NodeId`].
//! Children are owning edges in the sense that a node appears in exactly one
//! `children` list; `parent` is a plain back-index and never keeps anything
//! alive. Removed nodes leave a hole in the arena so ids are never reused.

use std::fmt;
use std::ops::Index;

use common_display::{DisplayTree, TreeSource};
use serde::{Deserialize, Serialize};
use vql_core::VideoSet;

use crate::ops::{FilterNode, InnerJoinNode, NodeKind, PlanNode, ProjectionNode, TableScanNode};

/// Stable handle to a node of a [`PlanTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of this node in the arena.
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Position a node occupies: the root, or one child position of a parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Root,
    Child { parent: NodeId, index: usize },
}

/// A node of the plan tree together with its links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeEntry {
    op: PlanNode,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    videos: VideoSet,
    produces_no_rows: bool,
}

impl NodeEntry {
    pub fn op(&self) -> &PlanNode {
        &self.op
    }

    pub fn kind(&self) -> NodeKind {
        self.op.kind()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Table aliases this node is scoped to.
    pub fn videos(&self) -> &VideoSet {
        &self.videos
    }

    /// Whether this node was proven to produce no rows.
    pub fn produces_no_rows(&self) -> bool {
        self.produces_no_rows
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// A logical plan: an arena of nodes plus the id of the root.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanTree {
    nodes: Vec<Option<NodeEntry>>,
    root: Option<NodeId>,
}

impl PlanTree {
    pub fn new() -> Self {
        Self::default()
    }

    // ========== Construction ==========

    fn push(&mut self, op: PlanNode, children: Vec<NodeId>, videos: VideoSet) -> NodeId {
        let id = NodeId(self.nodes.len());
        for &child in &children {
            debug_assert!(
                self[child].parent.is_none(),
                "node {child} is already attached"
            );
            self.entry_mut(child).parent = Some(id);
        }
        self.nodes.push(Some(NodeEntry {
            op,
            parent: None,
            children,
            videos,
            produces_no_rows: false,
        }));
        id
    }

    /// Add a scan of `alias`.
    pub fn scan(&mut self, alias: impl Into<String>) -> NodeId {
        let scan = TableScanNode::new(alias);
        let videos = VideoSet::singleton(scan.tablename.clone());
        self.push(scan.into(), Vec::new(), videos)
    }

    /// Add a filter above the detached node `child`.
    pub fn filter(&mut self, child: NodeId, mut node: FilterNode) -> NodeId {
        let videos = node
            .videos
            .take()
            .unwrap_or_else(|| node.column_ids.tables());
        self.push(node.into(), vec![child], videos)
    }

    /// Add a projection above the detached node `child`.
    pub fn project(&mut self, child: NodeId, node: ProjectionNode) -> NodeId {
        let videos = self.reachable_tables(child);
        self.push(node.into(), vec![child], videos)
    }

    /// Add a join over the detached nodes `children`, in branch order.
    pub fn join(&mut self, children: impl IntoIterator<Item = NodeId>, node: InnerJoinNode) -> NodeId {
        let children: Vec<NodeId> = children.into_iter().collect();
        let videos = children
            .iter()
            .fold(VideoSet::new(), |acc, &c| acc.union(&self.reachable_tables(c)));
        self.push(node.into(), children, videos)
    }

    pub fn set_root(&mut self, id: NodeId) {
        self.root = Some(id);
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    // ========== Access ==========

    /// Get a live node, or `None` if it was discarded.
    pub fn get(&self, id: NodeId) -> Option<&NodeEntry> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    fn entry_mut(&mut self, id: NodeId) -> &mut NodeEntry {
        match self.nodes.get_mut(id.0).and_then(Option::as_mut) {
            Some(entry) => entry,
            None => panic!("plan node {id} was discarded"),
        }
    }

    /// Mutable access to a node's operator.
    pub fn op_mut(&mut self, id: NodeId) -> Option<&mut PlanNode> {
        self.nodes
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .map(|entry| &mut entry.op)
    }

    pub fn set_videos(&mut self, id: NodeId, videos: VideoSet) {
        self.entry_mut(id).videos = videos;
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over live nodes in arena order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &NodeEntry)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, entry)| entry.as_ref().map(|e| (NodeId(i), e)))
    }

    /// Nodes of the subtree rooted at `from`, parents before children and
    /// siblings in branch order.
    pub fn preorder(&self, from: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self[id].children.iter().rev().copied());
        }
        order
    }

    /// Aliases of every table scanned in the subtree rooted at `id`.
    pub fn reachable_tables(&self, id: NodeId) -> VideoSet {
        self.scan_aliases(id).into_iter().collect()
    }

    /// Scanned aliases of the subtree rooted at `id`, in preorder, with
    /// repetitions.
    pub fn scan_aliases(&self, id: NodeId) -> Vec<String> {
        self.preorder(id)
            .into_iter()
            .filter_map(|n| self[n].op.as_scan().map(|scan| scan.tablename.clone()))
            .collect()
    }

    /// The slot `id` occupies, or `None` for a detached node.
    pub fn slot_of(&self, id: NodeId) -> Option<Slot> {
        match self[id].parent {
            Some(parent) => self[parent]
                .children
                .iter()
                .position(|&c| c == id)
                .map(|index| Slot::Child { parent, index }),
            None if self.root == Some(id) => Some(Slot::Root),
            None => None,
        }
    }

    /// The node currently occupying `slot`.
    pub fn occupant(&self, slot: Slot) -> Option<NodeId> {
        match slot {
            Slot::Root => self.root,
            Slot::Child { parent, index } => self.get(parent)?.children.get(index).copied(),
        }
    }

    // ========== Mutation ==========

    /// Unlink `id` from its parent, or clear the root if `id` is the root.
    pub fn detach(&mut self, id: NodeId) {
        let parent = self[id].parent;
        match parent {
            Some(parent) => {
                self.entry_mut(parent).children.retain(|&c| c != id);
                self.entry_mut(id).parent = None;
            }
            None if self.root == Some(id) => self.root = None,
            None => {}
        }
    }

    /// Put `new` in the slot held by `old`.
    ///
    /// `new` is detached from wherever it was first, so it may be a child of
    /// `old`. `old` ends up detached but keeps its own children.
    pub fn replace_in_slot(&mut self, old: NodeId, new: NodeId) {
        if old == new {
            return;
        }
        self.detach(new);
        match self.slot_of(old) {
            Some(Slot::Child { parent, index }) => {
                self.entry_mut(parent).children[index] = new;
                self.entry_mut(new).parent = Some(parent);
            }
            Some(Slot::Root) => self.root = Some(new),
            None => {}
        }
        self.entry_mut(old).parent = None;
    }

    /// Move `node` into the slot held by `target` and make `target` its last
    /// child.
    pub fn push_below(&mut self, node: NodeId, target: NodeId) {
        self.replace_in_slot(target, node);
        self.entry_mut(node).children.push(target);
        self.entry_mut(target).parent = Some(node);
    }

    /// Create a node directly above `target`, taking over its slot.
    pub fn insert_above(&mut self, target: NodeId, op: impl Into<PlanNode>) -> NodeId {
        let videos = self.reachable_tables(target);
        let id = self.push(op.into(), Vec::new(), videos);
        self.push_below(id, target);
        id
    }

    /// Replace a single-child node by its child and discard it.
    ///
    /// Returns the child, or `None` if the node does not have exactly one
    /// child, in which case the tree is left untouched.
    pub fn splice_out(&mut self, id: NodeId) -> Option<NodeId> {
        let child = match self[id].children.as_slice() {
            [child] => *child,
            _ => return None,
        };
        self.replace_in_slot(id, child);
        self.discard_subtree(id);
        Some(child)
    }

    /// Detach `id` and drop it together with everything below it.
    pub fn discard_subtree(&mut self, id: NodeId) {
        self.detach(id);
        for n in self.preorder(id) {
            self.nodes[n.0] = None;
        }
    }

    /// Recompute `videos` on `from` and each of its ancestors after the
    /// tables below them changed. Filters keep their narrower scope.
    pub fn refresh_videos_upward(&mut self, from: NodeId) {
        let mut current = Some(from);
        while let Some(id) = current {
            let reachable = self.reachable_tables(id);
            let videos = match self[id].kind() {
                NodeKind::TableScan => self[id].videos.clone(),
                NodeKind::Filter => self[id].videos.intersection(&reachable),
                NodeKind::Projection | NodeKind::InnerJoin => reachable,
            };
            self.entry_mut(id).videos = videos;
            current = self[id].parent;
        }
    }

    /// Flag `id` and its whole subtree as producing no rows.
    pub fn mark_no_rows(&mut self, id: NodeId) {
        for n in self.preorder(id) {
            self.entry_mut(n).produces_no_rows = true;
        }
    }

    // ========== Display ==========

    /// Render the plan as an indented tree.
    pub fn explain(&self) -> String {
        match self.root {
            Some(root) => DisplayTree::new(self, root).to_string(),
            None => String::new(),
        }
    }
}

impl Index<NodeId> for PlanTree {
    type Output = NodeEntry;

    fn index(&self, id: NodeId) -> &NodeEntry {
        match self.get(id) {
            Some(entry) => entry,
            None => panic!("plan node {id} was discarded"),
        }
    }
}

impl TreeSource for PlanTree {
    type Id = NodeId;

    fn label(&self, id: NodeId) -> String {
        let entry = &self[id];
        format!("{} {}", entry.op, entry.videos)
    }

    fn children(&self, id: NodeId) -> Vec<NodeId> {
        self[id].children.clone()
    }

    fn details(&self, id: NodeId) -> Option<String> {
        self[id].produces_no_rows.then(|| "no rows".to_string())
    }
}

impl fmt::Display for PlanTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.explain())
    }
}
