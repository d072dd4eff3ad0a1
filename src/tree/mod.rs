//! Arena-backed source tree.
//!
//! Parsed modules are lowered into a flat arena: every node gets a stable
//! integer handle, a kind tag, a half-open byte span and a parent link.
//! Collections elsewhere in the crate key off these handles instead of
//! object identity. Mutation is two-sided: a byte-range edit recorded
//! against the unit's source, plus (for deletions) a detach mark that later
//! attachment checks observe.

pub mod parse;
pub mod printer;
pub mod rewrite;

use crate::utils::LineIndex;
use ruff_python_ast::ModModule;
use std::path::{Path, PathBuf};

use rewrite::{validate_edit, Edit, RewriteError};

/// Stable handle of a node within one translation unit's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    /// Index into the unit's node arena.
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub(crate) fn from_index(index: usize) -> Self {
        Self(u32::try_from(index).unwrap_or(u32::MAX))
    }
}

/// Stable handle of a translation unit within a workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UnitId(u32);

impl UnitId {
    /// Index into the workspace's unit list.
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Fully-qualified node handle: unit plus node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeHandle {
    /// Owning translation unit.
    pub unit: UnitId,
    /// Node within that unit's arena.
    pub node: NodeId,
}

/// Kind tag of an arena node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum NodeKind {
    Module,
    FunctionDef,
    ClassDef,
    If,
    While,
    For,
    With,
    Try,
    ExceptHandler,
    Match,
    Return,
    Pass,
    Break,
    Continue,
    Import,
    ImportFrom,
    Assign,
    AnnAssign,
    AugAssign,
    ExprStmt,
    Raise,
    Assert,
    Delete,
    Global,
    Nonlocal,
    OtherStmt,
    Compare,
    Call,
    Name,
    Attribute,
    Subscript,
    BinOp,
    BoolOp,
    UnaryOp,
    Lambda,
    NoneLiteral,
    BooleanLiteral,
    NumberLiteral,
    StringLiteral,
    Tuple,
    List,
    Dict,
    Set,
    OtherExpr,
}

impl NodeKind {
    /// Whether this kind is a statement (as opposed to an expression,
    /// handler or the module root).
    #[must_use]
    pub fn is_statement(self) -> bool {
        matches!(
            self,
            Self::FunctionDef
                | Self::ClassDef
                | Self::If
                | Self::While
                | Self::For
                | Self::With
                | Self::Try
                | Self::Match
                | Self::Return
                | Self::Pass
                | Self::Break
                | Self::Continue
                | Self::Import
                | Self::ImportFrom
                | Self::Assign
                | Self::AnnAssign
                | Self::AugAssign
                | Self::ExprStmt
                | Self::Raise
                | Self::Assert
                | Self::Delete
                | Self::Global
                | Self::Nonlocal
                | Self::OtherStmt
        )
    }
}

/// One node of the arena tree.
#[derive(Debug, Clone)]
pub struct Node {
    /// Kind tag.
    pub kind: NodeKind,
    /// Start byte offset (inclusive).
    pub start: usize,
    /// End byte offset (exclusive).
    pub end: usize,
    /// Parent node, `None` for the module root.
    pub parent: Option<NodeId>,
    removed: bool,
}

impl Node {
    pub(crate) fn new(kind: NodeKind, start: usize, end: usize, parent: Option<NodeId>) -> Self {
        Self {
            kind,
            start,
            end,
            parent,
            removed: false,
        }
    }

    /// Span length in bytes.
    #[must_use]
    pub fn span_len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }
}

/// The in-memory representation of one source file: its normalized path,
/// source text, parsed AST, node arena and pending edits.
#[derive(Debug)]
pub struct TranslationUnit {
    path: PathBuf,
    source: String,
    ast: ModModule,
    line_index: LineIndex,
    nodes: Vec<Node>,
    edits: Vec<Edit>,
    released: bool,
}

impl TranslationUnit {
    /// Creates an empty unit over the given source. Nodes are added by the
    /// parser (or directly, in tests). The path is normalized on entry.
    #[must_use]
    pub fn new(path: &Path, source: String, ast: ModModule) -> Self {
        let line_index = LineIndex::new(&source);
        Self {
            path: crate::utils::normalize_path(path),
            source,
            ast,
            line_index,
            nodes: Vec::new(),
            edits: Vec::new(),
            released: false,
        }
    }

    /// Assembles a unit from a pre-lowered node arena.
    pub(crate) fn from_parts(
        path: &Path,
        source: String,
        ast: ModModule,
        nodes: Vec<Node>,
    ) -> Self {
        let mut unit = Self::new(path, source, ast);
        unit.nodes = nodes;
        unit
    }

    /// Normalized absolute path of the file this unit represents.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Original source text.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The parsed module, for analyzer traversal.
    #[must_use]
    pub fn ast(&self) -> &ModModule {
        &self.ast
    }

    /// Line-start offset table for this unit's source.
    #[must_use]
    pub fn line_index(&self) -> &LineIndex {
        &self.line_index
    }

    /// Appends a node to the arena and returns its handle.
    pub fn push_node(
        &mut self,
        kind: NodeKind,
        start: usize,
        end: usize,
        parent: Option<NodeId>,
    ) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        self.nodes.push(Node {
            kind,
            start,
            end,
            parent,
            removed: false,
        });
        id
    }

    /// Immutable access to a node.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    /// Iterator over all node handles, in arena (pre-)order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(|i| NodeId(u32::try_from(i).unwrap_or(u32::MAX)))
    }

    /// Number of nodes in the arena.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Source text covered by a node's span.
    #[must_use]
    pub fn span_text(&self, id: NodeId) -> &str {
        let node = self.node(id);
        &self.source[node.start.min(self.source.len())..node.end.min(self.source.len())]
    }

    /// 1-based line on which a node starts.
    #[must_use]
    pub fn start_line(&self, id: NodeId) -> usize {
        self.line_index.line_of(self.node(id).start)
    }

    /// Whether a node is still attached to the tree: neither it nor any of
    /// its ancestors has been detached by an earlier repair.
    #[must_use]
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = self.node(node_id);
            if node.removed {
                return false;
            }
            current = node.parent;
        }
        true
    }

    /// Detaches a node. Descendants become unattached implicitly, since
    /// attachment walks the ancestry chain.
    pub fn detach(&mut self, id: NodeId) {
        self.nodes[id.index()].removed = true;
    }

    /// Attached statement-kind nodes sharing the given node's parent,
    /// excluding the node itself.
    #[must_use]
    pub fn statement_siblings(&self, id: NodeId) -> Vec<NodeId> {
        let parent = self.node(id).parent;
        self.node_ids()
            .filter(|&other| {
                other != id
                    && self.node(other).parent == parent
                    && self.node(other).kind.is_statement()
                    && self.is_attached(other)
            })
            .collect()
    }

    /// Records an edit against this unit's source, rejecting edits that are
    /// out of bounds or that collide with an already-recorded repair.
    pub fn try_add_edit(&mut self, edit: Edit) -> Result<(), RewriteError> {
        validate_edit(self.source.len(), &self.edits, &edit)?;
        self.edits.push(edit);
        Ok(())
    }

    /// Edits recorded so far.
    #[must_use]
    pub fn edits(&self) -> &[Edit] {
        &self.edits
    }

    /// Whether any repair has touched this unit.
    #[must_use]
    pub fn has_edits(&self) -> bool {
        !self.edits.is_empty()
    }

    /// Drops the unit's source, AST, arena and edits, keeping only the path.
    /// Segmented repair flushes a segment's outputs and then releases its
    /// units so the next segment's memory is not stacked on top of them.
    pub fn release(&mut self) {
        self.source = String::new();
        self.ast.body = Vec::new().into();
        self.line_index = LineIndex::new("");
        self.nodes = Vec::new();
        self.edits = Vec::new();
        self.released = true;
    }

    /// Whether this unit's content has been released. Released units no
    /// longer resolve by path and must not be printed or matched against.
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.released
    }
}

/// All translation units loaded for one repair run, keyed by stable handles.
#[derive(Debug, Default)]
pub struct Workspace {
    units: Vec<TranslationUnit>,
}

impl Workspace {
    /// Creates an empty workspace.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a unit and returns its handle.
    pub fn add_unit(&mut self, unit: TranslationUnit) -> UnitId {
        let id = UnitId(u32::try_from(self.units.len()).unwrap_or(u32::MAX));
        self.units.push(unit);
        id
    }

    /// Immutable access to a unit.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> &TranslationUnit {
        &self.units[id.index()]
    }

    /// Mutable access to a unit.
    pub fn unit_mut(&mut self, id: UnitId) -> &mut TranslationUnit {
        &mut self.units[id.index()]
    }

    /// Iterator over (handle, unit) pairs in load order.
    pub fn iter(&self) -> impl Iterator<Item = (UnitId, &TranslationUnit)> {
        self.units
            .iter()
            .enumerate()
            .map(|(i, u)| (UnitId(u32::try_from(i).unwrap_or(u32::MAX)), u))
    }

    /// Finds the unit for a normalized absolute path. Released units are
    /// not found.
    #[must_use]
    pub fn find_by_path(&self, path: &Path) -> Option<UnitId> {
        self.iter()
            .find(|(_, unit)| !unit.is_released() && unit.path() == path)
            .map(|(id, _)| id)
    }

    /// Releases a unit's content. The handle stays valid; the unit is
    /// simply empty afterwards.
    pub fn release_unit(&mut self, id: UnitId) {
        self.units[id.index()].release();
    }

    /// Number of loaded units.
    #[must_use]
    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// Whether no units have been loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::synthetic_unit;

    #[test]
    fn attachment_follows_ancestry_chain() {
        let mut unit = synthetic_unit("/proj/a.py", "x = 1\ny = 2\n");
        let module = unit.push_node(NodeKind::Module, 0, 12, None);
        let outer = unit.push_node(NodeKind::While, 0, 12, Some(module));
        let inner = unit.push_node(NodeKind::Pass, 2, 6, Some(outer));

        assert!(unit.is_attached(inner));
        unit.detach(outer);
        assert!(!unit.is_attached(inner));
        assert!(!unit.is_attached(outer));
        assert!(unit.is_attached(module));
    }

    #[test]
    fn statement_siblings_skip_self_and_detached() {
        let mut unit = synthetic_unit("/proj/a.py", "pass\npass\npass\n");
        let module = unit.push_node(NodeKind::Module, 0, 15, None);
        let a = unit.push_node(NodeKind::Pass, 0, 4, Some(module));
        let b = unit.push_node(NodeKind::Pass, 5, 9, Some(module));
        let c = unit.push_node(NodeKind::Pass, 10, 14, Some(module));

        assert_eq!(unit.statement_siblings(a), vec![b, c]);
        unit.detach(c);
        assert_eq!(unit.statement_siblings(a), vec![b]);
    }

    #[test]
    fn conflicting_edits_are_rejected() {
        let mut unit = synthetic_unit("/proj/a.py", "x = 1\n");
        unit.try_add_edit(Edit::delete(0, 5)).unwrap();
        assert!(unit.try_add_edit(Edit::new(2, 4, "y")).is_err());
        assert_eq!(unit.edits().len(), 1);
    }

    #[test]
    fn released_units_drop_content_and_path_lookup() {
        let mut workspace = Workspace::new();
        let mut unit = synthetic_unit("/proj/a.py", "pass\n");
        unit.push_node(NodeKind::Pass, 0, 4, None);
        let id = workspace.add_unit(unit);

        workspace.release_unit(id);
        let released = workspace.unit(id);
        assert!(released.is_released());
        assert_eq!(released.node_count(), 0);
        assert!(released.source().is_empty());
        assert_eq!(
            workspace.find_by_path(std::path::Path::new("/proj/a.py")),
            None
        );
    }

    #[test]
    fn find_by_path_uses_normalized_paths() {
        let mut workspace = Workspace::new();
        let unit = synthetic_unit("/proj/pkg/../a.py", "");
        let id = workspace.add_unit(unit);

        assert_eq!(
            workspace.find_by_path(std::path::Path::new("/proj/a.py")),
            Some(id)
        );
    }
}
