//! Scope tree and symbol storage

use std::collections::HashMap;

use rill_ast::{NodeId, SymbolId};
use rill_lexer::Span;

/// Handle to a scope in the table's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(u32);

impl ScopeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// What kind of declaration a symbol binds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Function,
    Variable,
    Parameter,
}

/// An immutable binding of a name to the AST node that declared it
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub node: NodeId,
    pub span: Span,
}

/// One lexical scope: local entries plus an optional parent link
#[derive(Debug)]
struct Scope {
    entries: HashMap<String, SymbolId>,
    parent: Option<ScopeId>,
}

/// Arena of scopes and symbols, built by one resolution run.
///
/// Scopes form an immutable tree: the parent link is fixed at creation and
/// scopes are never removed. The root scope exists from construction and has
/// no parent; `new_detached` creates further parentless scopes for contexts
/// that must not see any enclosing bindings.
#[derive(Debug)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
    symbols: Vec<Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope { entries: HashMap::new(), parent: None }],
            symbols: Vec::new(),
        }
    }

    /// The global scope, created once per run
    pub fn root(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn new_child(&mut self, parent: ScopeId) -> ScopeId {
        self.alloc(Some(parent))
    }

    /// A scope with no parent link
    pub fn new_detached(&mut self) -> ScopeId {
        self.alloc(None)
    }

    fn alloc(&mut self, parent: Option<ScopeId>) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope { entries: HashMap::new(), parent });
        id
    }

    pub fn parent(&self, scope: ScopeId) -> Option<ScopeId> {
        self.scopes[scope.index()].parent
    }

    /// Insert a new symbol for `name` into `scope`.
    ///
    /// The caller is responsible for checking `lookup_local` first; this
    /// does not re-check, and an existing entry would be overwritten.
    pub fn declare(
        &mut self,
        scope: ScopeId,
        name: &str,
        kind: SymbolKind,
        node: NodeId,
        span: Span,
    ) -> SymbolId {
        let id = SymbolId::new(self.symbols.len() as u32);
        self.symbols.push(Symbol {
            name: name.to_string(),
            kind,
            node,
            span,
        });
        self.scopes[scope.index()].entries.insert(name.to_string(), id);
        id
    }

    /// Strict lookup in one scope, no ancestor search
    pub fn lookup_local(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        self.scopes[scope.index()].entries.get(name).copied()
    }

    /// Chained lookup: this scope, then its ancestors up to the root
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        let mut current = Some(scope);
        while let Some(s) = current {
            if let Some(id) = self.lookup_local(s, name) {
                return Some(id);
            }
            current = self.parent(s);
        }
        None
    }

    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0 as usize]
    }

    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    pub fn pretty_print(&self) -> String {
        let mut out = String::new();

        out.push_str("=== Symbol Table ===\n\n");

        out.push_str("--- Scopes ---\n");
        for (i, scope) in self.scopes.iter().enumerate() {
            match scope.parent {
                Some(parent) => out.push_str(&format!("  scope {} (parent {})\n", i, parent.0)),
                None if i == 0 => out.push_str("  scope 0 (root)\n"),
                None => out.push_str(&format!("  scope {} (detached)\n", i)),
            }
            let mut names: Vec<_> = scope.entries.iter().collect();
            names.sort_by(|a, b| a.0.cmp(b.0));
            for (name, id) in names {
                let symbol = self.symbol(*id);
                out.push_str(&format!("    {} -> {:?} ({:?})\n", name, id, symbol.kind));
            }
        }
        out.push('\n');

        out.push_str("--- Symbols ---\n");
        for (i, symbol) in self.symbols.iter().enumerate() {
            out.push_str(&format!(
                "  #{} {} ({:?}) declared at {}..{}\n",
                i, symbol.name, symbol.kind, symbol.span.start, symbol.span.end
            ));
        }

        out
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span() -> Span {
        Span::new(0, 0)
    }

    #[test]
    fn test_local_lookup_does_not_search_ancestors() {
        let mut table = SymbolTable::new();
        let root = table.root();
        let child = table.new_child(root);
        table.declare(root, "x", SymbolKind::Variable, 0, span());

        assert!(table.lookup_local(child, "x").is_none());
        assert!(table.lookup_local(root, "x").is_some());
    }

    #[test]
    fn test_chained_lookup_walks_to_root() {
        let mut table = SymbolTable::new();
        let root = table.root();
        let child = table.new_child(root);
        let grandchild = table.new_child(child);
        let id = table.declare(root, "x", SymbolKind::Variable, 0, span());

        assert_eq!(table.lookup(grandchild, "x"), Some(id));
        assert!(table.lookup(grandchild, "y").is_none());
    }

    #[test]
    fn test_inner_declaration_shadows_outer() {
        let mut table = SymbolTable::new();
        let root = table.root();
        let child = table.new_child(root);
        let outer = table.declare(root, "x", SymbolKind::Variable, 0, span());
        let inner = table.declare(child, "x", SymbolKind::Variable, 1, span());

        assert_eq!(table.lookup(child, "x"), Some(inner));
        assert_eq!(table.lookup(root, "x"), Some(outer));
    }

    #[test]
    fn test_detached_scope_sees_nothing_outside() {
        let mut table = SymbolTable::new();
        let root = table.root();
        table.declare(root, "x", SymbolKind::Variable, 0, span());
        let detached = table.new_detached();

        assert!(table.lookup(detached, "x").is_none());
        assert!(table.parent(detached).is_none());
    }

    #[test]
    fn test_symbol_records_declaring_node() {
        let mut table = SymbolTable::new();
        let root = table.root();
        let id = table.declare(root, "f", SymbolKind::Function, 7, Span::new(3, 4));

        let symbol = table.symbol(id);
        assert_eq!(symbol.name, "f");
        assert_eq!(symbol.node, 7);
        assert_eq!(symbol.kind, SymbolKind::Function);
    }
}
