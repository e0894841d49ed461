//! Semantic analysis: scope construction and name resolution
//!
//! This pass walks the AST once and:
//! 1. Builds the tree of lexical scopes
//! 2. Binds every declaration (variable, parameter, function) to a scope
//! 3. Resolves every use site to its declaring symbol, or fails with the
//!    first semantic error

mod resolve;
mod table;

pub use resolve::{Resolver, SemaError, SemaResult};
pub use table::{ScopeId, Symbol, SymbolKind, SymbolTable};
