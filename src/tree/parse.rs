//! Lowers a parsed Python module into the arena tree.
//!
//! The walker mirrors the AST's statement/expression structure: parents are
//! pushed before their children, so arena order is pre-order. Expression
//! coverage is deliberately broad rather than exhaustive; anything without a
//! dedicated kind tag still gets a node with a correct span.

use crate::tree::{Node, NodeId, NodeKind, TranslationUnit};
use ruff_python_ast::{ExceptHandler, Expr, Stmt};
use ruff_text_size::Ranged;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failure to parse one source file. Scoped to that file; other files of a
/// run continue processing.
#[derive(Debug, Clone, Error)]
#[error("failed to parse {}: {message}", .path.display())]
pub struct ParseFailure {
    /// File that failed to parse.
    pub path: PathBuf,
    /// Parser diagnostic.
    pub message: String,
}

/// Parses a source file and lowers it into a translation unit.
///
/// # Errors
///
/// Returns a [`ParseFailure`] when the source is not valid Python.
pub fn parse_unit(path: &Path, source: String) -> Result<TranslationUnit, ParseFailure> {
    let parsed = ruff_python_parser::parse_module(&source).map_err(|e| ParseFailure {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let ast = parsed.into_syntax();

    let mut lowerer = Lowerer { nodes: Vec::new() };
    let root = lowerer.push(NodeKind::Module, 0, source.len(), None);
    for stmt in &ast.body {
        lowerer.lower_stmt(stmt, root);
    }

    Ok(TranslationUnit::from_parts(path, source, ast, lowerer.nodes))
}

struct Lowerer {
    nodes: Vec<Node>,
}

impl Lowerer {
    fn push(&mut self, kind: NodeKind, start: usize, end: usize, parent: Option<NodeId>) -> NodeId {
        let id = NodeId::from_index(self.nodes.len());
        self.nodes.push(Node::new(kind, start, end, parent));
        id
    }

    fn push_ranged(&mut self, kind: NodeKind, ranged: &impl Ranged, parent: NodeId) -> NodeId {
        let range = ranged.range();
        self.push(
            kind,
            range.start().to_usize(),
            range.end().to_usize(),
            Some(parent),
        )
    }

    fn lower_body(&mut self, body: &[Stmt], parent: NodeId) {
        for stmt in body {
            self.lower_stmt(stmt, parent);
        }
    }

    #[allow(clippy::too_many_lines)]
    fn lower_stmt(&mut self, stmt: &Stmt, parent: NodeId) {
        match stmt {
            Stmt::FunctionDef(node) => {
                let id = self.push_ranged(NodeKind::FunctionDef, node, parent);
                self.lower_body(&node.body, id);
            }
            Stmt::ClassDef(node) => {
                let id = self.push_ranged(NodeKind::ClassDef, node, parent);
                self.lower_body(&node.body, id);
            }
            Stmt::If(node) => {
                let id = self.push_ranged(NodeKind::If, node, parent);
                self.lower_expr(&node.test, id);
                self.lower_body(&node.body, id);
                for clause in &node.elif_else_clauses {
                    if let Some(test) = &clause.test {
                        self.lower_expr(test, id);
                    }
                    self.lower_body(&clause.body, id);
                }
            }
            Stmt::While(node) => {
                let id = self.push_ranged(NodeKind::While, node, parent);
                self.lower_expr(&node.test, id);
                self.lower_body(&node.body, id);
                self.lower_body(&node.orelse, id);
            }
            Stmt::For(node) => {
                let id = self.push_ranged(NodeKind::For, node, parent);
                self.lower_expr(&node.target, id);
                self.lower_expr(&node.iter, id);
                self.lower_body(&node.body, id);
                self.lower_body(&node.orelse, id);
            }
            Stmt::With(node) => {
                let id = self.push_ranged(NodeKind::With, node, parent);
                for item in &node.items {
                    self.lower_expr(&item.context_expr, id);
                }
                self.lower_body(&node.body, id);
            }
            Stmt::Try(node) => {
                let id = self.push_ranged(NodeKind::Try, node, parent);
                self.lower_body(&node.body, id);
                for handler in &node.handlers {
                    let ExceptHandler::ExceptHandler(h) = handler;
                    let handler_id = self.push_ranged(NodeKind::ExceptHandler, h, id);
                    if let Some(type_) = &h.type_ {
                        self.lower_expr(type_, handler_id);
                    }
                    self.lower_body(&h.body, handler_id);
                }
                self.lower_body(&node.orelse, id);
                self.lower_body(&node.finalbody, id);
            }
            Stmt::Match(node) => {
                let id = self.push_ranged(NodeKind::Match, node, parent);
                self.lower_expr(&node.subject, id);
                for case in &node.cases {
                    if let Some(guard) = &case.guard {
                        self.lower_expr(guard, id);
                    }
                    self.lower_body(&case.body, id);
                }
            }
            Stmt::Return(node) => {
                let id = self.push_ranged(NodeKind::Return, node, parent);
                if let Some(value) = &node.value {
                    self.lower_expr(value, id);
                }
            }
            Stmt::Assign(node) => {
                let id = self.push_ranged(NodeKind::Assign, node, parent);
                for target in &node.targets {
                    self.lower_expr(target, id);
                }
                self.lower_expr(&node.value, id);
            }
            Stmt::AnnAssign(node) => {
                let id = self.push_ranged(NodeKind::AnnAssign, node, parent);
                self.lower_expr(&node.target, id);
                if let Some(value) = &node.value {
                    self.lower_expr(value, id);
                }
            }
            Stmt::AugAssign(node) => {
                let id = self.push_ranged(NodeKind::AugAssign, node, parent);
                self.lower_expr(&node.target, id);
                self.lower_expr(&node.value, id);
            }
            Stmt::Expr(node) => {
                let id = self.push_ranged(NodeKind::ExprStmt, node, parent);
                self.lower_expr(&node.value, id);
            }
            Stmt::Raise(node) => {
                let id = self.push_ranged(NodeKind::Raise, node, parent);
                if let Some(exc) = &node.exc {
                    self.lower_expr(exc, id);
                }
            }
            Stmt::Assert(node) => {
                let id = self.push_ranged(NodeKind::Assert, node, parent);
                self.lower_expr(&node.test, id);
                if let Some(msg) = &node.msg {
                    self.lower_expr(msg, id);
                }
            }
            Stmt::Delete(node) => {
                let id = self.push_ranged(NodeKind::Delete, node, parent);
                for target in &node.targets {
                    self.lower_expr(target, id);
                }
            }
            Stmt::Pass(node) => {
                self.push_ranged(NodeKind::Pass, node, parent);
            }
            Stmt::Break(node) => {
                self.push_ranged(NodeKind::Break, node, parent);
            }
            Stmt::Continue(node) => {
                self.push_ranged(NodeKind::Continue, node, parent);
            }
            Stmt::Import(node) => {
                self.push_ranged(NodeKind::Import, node, parent);
            }
            Stmt::ImportFrom(node) => {
                self.push_ranged(NodeKind::ImportFrom, node, parent);
            }
            Stmt::Global(node) => {
                self.push_ranged(NodeKind::Global, node, parent);
            }
            Stmt::Nonlocal(node) => {
                self.push_ranged(NodeKind::Nonlocal, node, parent);
            }
            other => {
                self.push_ranged(NodeKind::OtherStmt, other, parent);
            }
        }
    }

    #[allow(clippy::too_many_lines)]
    fn lower_expr(&mut self, expr: &Expr, parent: NodeId) {
        match expr {
            Expr::Call(node) => {
                let id = self.push_ranged(NodeKind::Call, node, parent);
                self.lower_expr(&node.func, id);
                for arg in &node.arguments.args {
                    self.lower_expr(arg, id);
                }
                for keyword in &node.arguments.keywords {
                    self.lower_expr(&keyword.value, id);
                }
            }
            Expr::Compare(node) => {
                let id = self.push_ranged(NodeKind::Compare, node, parent);
                self.lower_expr(&node.left, id);
                for comparator in &node.comparators {
                    self.lower_expr(comparator, id);
                }
            }
            Expr::Attribute(node) => {
                let id = self.push_ranged(NodeKind::Attribute, node, parent);
                self.lower_expr(&node.value, id);
            }
            Expr::Subscript(node) => {
                let id = self.push_ranged(NodeKind::Subscript, node, parent);
                self.lower_expr(&node.value, id);
                self.lower_expr(&node.slice, id);
            }
            Expr::BinOp(node) => {
                let id = self.push_ranged(NodeKind::BinOp, node, parent);
                self.lower_expr(&node.left, id);
                self.lower_expr(&node.right, id);
            }
            Expr::BoolOp(node) => {
                let id = self.push_ranged(NodeKind::BoolOp, node, parent);
                for value in &node.values {
                    self.lower_expr(value, id);
                }
            }
            Expr::UnaryOp(node) => {
                let id = self.push_ranged(NodeKind::UnaryOp, node, parent);
                self.lower_expr(&node.operand, id);
            }
            Expr::Lambda(node) => {
                let id = self.push_ranged(NodeKind::Lambda, node, parent);
                self.lower_expr(&node.body, id);
            }
            Expr::Tuple(node) => {
                let id = self.push_ranged(NodeKind::Tuple, node, parent);
                for elt in &node.elts {
                    self.lower_expr(elt, id);
                }
            }
            Expr::List(node) => {
                let id = self.push_ranged(NodeKind::List, node, parent);
                for elt in &node.elts {
                    self.lower_expr(elt, id);
                }
            }
            Expr::Set(node) => {
                let id = self.push_ranged(NodeKind::Set, node, parent);
                for elt in &node.elts {
                    self.lower_expr(elt, id);
                }
            }
            Expr::Dict(node) => {
                let id = self.push_ranged(NodeKind::Dict, node, parent);
                for item in &node.items {
                    if let Some(key) = &item.key {
                        self.lower_expr(key, id);
                    }
                    self.lower_expr(&item.value, id);
                }
            }
            Expr::Name(node) => {
                self.push_ranged(NodeKind::Name, node, parent);
            }
            Expr::NoneLiteral(node) => {
                self.push_ranged(NodeKind::NoneLiteral, node, parent);
            }
            Expr::BooleanLiteral(node) => {
                self.push_ranged(NodeKind::BooleanLiteral, node, parent);
            }
            Expr::NumberLiteral(node) => {
                self.push_ranged(NodeKind::NumberLiteral, node, parent);
            }
            Expr::StringLiteral(node) => {
                self.push_ranged(NodeKind::StringLiteral, node, parent);
            }
            Expr::Starred(node) => {
                let id = self.push_ranged(NodeKind::OtherExpr, node, parent);
                self.lower_expr(&node.value, id);
            }
            Expr::Await(node) => {
                let id = self.push_ranged(NodeKind::OtherExpr, node, parent);
                self.lower_expr(&node.value, id);
            }
            Expr::Yield(node) => {
                let id = self.push_ranged(NodeKind::OtherExpr, node, parent);
                if let Some(value) = &node.value {
                    self.lower_expr(value, id);
                }
            }
            Expr::YieldFrom(node) => {
                let id = self.push_ranged(NodeKind::OtherExpr, node, parent);
                self.lower_expr(&node.value, id);
            }
            other => {
                self.push_ranged(NodeKind::OtherExpr, other, parent);
            }
        }
    }
}
