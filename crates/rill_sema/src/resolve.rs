//! Name resolution - binds declarations to scopes and uses to declarations

use rill_ast::*;
use rill_lexer::Span;

use crate::table::{ScopeId, SymbolKind, SymbolTable};

/// Error during semantic analysis, tied to the offending node's span
#[derive(Debug, Clone)]
pub struct SemaError {
    pub message: String,
    pub span: Span,
}

impl std::fmt::Display for SemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at {}..{}", self.message, self.span.start, self.span.end)
    }
}

impl std::error::Error for SemaError {}

pub type SemaResult<T> = Result<T, SemaError>;

/// Name resolver.
///
/// Performs one depth-first walk of the program. A scope is pushed when a
/// scope-owning construct is entered and popped when it is left; every
/// declaration binds into whichever scope is on top of the stack at that
/// moment, and every use resolves through the chain from the top scope to
/// the root. The first error aborts the run; scopes opened on the way down
/// are still popped before the error propagates.
pub struct Resolver {
    table: SymbolTable,
    /// Open scopes, innermost last. The root scope sits at the bottom and
    /// is never popped.
    stack: Vec<ScopeId>,
}

impl Resolver {
    fn new() -> Self {
        let table = SymbolTable::new();
        let root = table.root();
        Self { table, stack: vec![root] }
    }

    /// Resolve a program in place.
    ///
    /// On success every declaration and use-site node carries its
    /// `SymbolId` and the populated symbol table is returned. On failure
    /// the AST is left partially annotated and the first semantic error is
    /// returned.
    pub fn resolve(program: &mut Program) -> SemaResult<SymbolTable> {
        let mut resolver = Resolver::new();
        resolver.resolve_program(program)?;
        debug_assert_eq!(resolver.stack.len(), 1);
        Ok(resolver.table)
    }

    fn current(&self) -> ScopeId {
        self.stack[self.stack.len() - 1]
    }

    /// Run `body` inside a fresh child of the current scope. The child is
    /// popped whether `body` succeeds or fails, so the stack depth is
    /// restored before any error propagates.
    fn in_child_scope<T>(
        &mut self,
        body: impl FnOnce(&mut Self) -> SemaResult<T>,
    ) -> SemaResult<T> {
        let child = self.table.new_child(self.current());
        self.stack.push(child);
        let result = body(self);
        debug_assert_eq!(self.current(), child);
        self.stack.pop();
        result
    }

    fn resolve_program(&mut self, program: &mut Program) -> SemaResult<()> {
        for f in &mut program.functions {
            self.resolve_fn_def(f)?;
        }

        // only after all functions are bound is the root scope complete
        if self.table.lookup(self.current(), "main").is_none() {
            return Err(SemaError {
                message: "no entry function 'main' found".to_string(),
                span: program.span,
            });
        }

        Ok(())
    }

    fn resolve_fn_def(&mut self, f: &mut FnDef) -> SemaResult<()> {
        // The return type names only builtin types and is visited in the
        // enclosing scope, before the function's own scope opens. The
        // function scope chains to the enclosing scope so that calls to
        // previously bound functions resolve from inside the body.
        self.in_child_scope(|r| {
            for param in &mut f.params {
                r.resolve_param(param)?;
            }
            r.resolve_block(&mut f.body)
        })?;

        // The name binds only after the function scope is popped: the body
        // could not see it (no self-recursion), later siblings can (no
        // forward references).
        if self.table.lookup(self.current(), &f.name.name).is_some() {
            return Err(SemaError {
                message: format!("function name '{}' already in use", f.name.name),
                span: f.name.span,
            });
        }
        let symbol = self.table.declare(
            self.current(),
            &f.name.name,
            SymbolKind::Function,
            f.id,
            f.name.span,
        );
        f.symbol = Some(symbol);

        Ok(())
    }

    fn resolve_param(&mut self, p: &mut Param) -> SemaResult<()> {
        if self.table.lookup_local(self.current(), &p.name.name).is_some() {
            return Err(SemaError {
                message: format!("parameter name '{}' already in use", p.name.name),
                span: p.name.span,
            });
        }
        let symbol = self.table.declare(
            self.current(),
            &p.name.name,
            SymbolKind::Parameter,
            p.id,
            p.name.span,
        );
        p.symbol = Some(symbol);
        Ok(())
    }

    /// Blocks are pure containers; the scope belongs to the construct that
    /// owns the block.
    fn resolve_block(&mut self, block: &mut Block) -> SemaResult<()> {
        for stmt in &mut block.stmts {
            self.resolve_stmt(stmt)?;
        }
        Ok(())
    }

    fn resolve_stmt(&mut self, stmt: &mut Stmt) -> SemaResult<()> {
        match stmt {
            Stmt::VarDecl(v) => self.resolve_var_decl(v),
            Stmt::Assign(a) => self.resolve_assign(a),
            Stmt::Return(r) => match &mut r.value {
                Some(value) => self.resolve_expr(value),
                None => Ok(()),
            },
            Stmt::If(i) => self.resolve_if(i),
            Stmt::While(w) => self.in_child_scope(|r| {
                r.resolve_expr(&mut w.cond)?;
                r.resolve_block(&mut w.body)
            }),
            Stmt::DoWhile(d) => self.in_child_scope(|r| {
                r.resolve_block(&mut d.body)?;
                r.resolve_expr(&mut d.cond)
            }),
            Stmt::For(f) => self.resolve_for(f),
            Stmt::Switch(s) => self.resolve_switch(s),
        }
    }

    fn resolve_var_decl(&mut self, v: &mut VarDeclStmt) -> SemaResult<()> {
        // The initializer resolves before the name binds, so a declaration
        // can never reference itself.
        self.resolve_expr(&mut v.init)?;

        if self.table.lookup_local(self.current(), &v.name.name).is_some() {
            return Err(SemaError {
                message: format!(
                    "'{}' has already been declared in this scope",
                    v.name.name
                ),
                span: v.name.span,
            });
        }
        let symbol = self.table.declare(
            self.current(),
            &v.name.name,
            SymbolKind::Variable,
            v.id,
            v.name.span,
        );
        v.symbol = Some(symbol);
        Ok(())
    }

    fn resolve_assign(&mut self, a: &mut AssignStmt) -> SemaResult<()> {
        self.resolve_expr(&mut a.value)?;

        if let Some(target) = &a.target {
            match self.table.lookup(self.current(), &target.name) {
                Some(symbol) => a.symbol = Some(symbol),
                None => {
                    return Err(SemaError {
                        message: format!("variable '{}' was not found", target.name),
                        span: target.span,
                    });
                }
            }
        }
        Ok(())
    }

    fn resolve_if(&mut self, i: &mut IfStmt) -> SemaResult<()> {
        self.in_child_scope(|r| {
            r.resolve_expr(&mut i.cond)?;
            r.resolve_block(&mut i.body)
        })?;

        // The else branch opens its own scope as a sibling of the then
        // branch: names declared in one branch are not visible in the other.
        match &mut i.else_branch {
            Some(ElseBranch::Else(e)) => {
                self.in_child_scope(|r| r.resolve_block(&mut e.body))
            }
            Some(ElseBranch::ElseIf(nested)) => self.resolve_if(nested),
            None => Ok(()),
        }
    }

    fn resolve_for(&mut self, f: &mut ForStmt) -> SemaResult<()> {
        self.in_child_scope(|r| {
            if let Some(init) = &mut f.init {
                r.resolve_var_decl(init)?;
            }
            if let Some(cond) = &mut f.cond {
                r.resolve_expr(cond)?;
            }
            if let Some(update) = &mut f.update {
                r.resolve_assign(update)?;
            }
            r.resolve_block(&mut f.body)?;

            // structural well-formedness: all three clauses must be present
            if f.init.is_none() {
                return Err(SemaError {
                    message: "for loop is missing its initializer".to_string(),
                    span: f.span,
                });
            }
            if f.cond.is_none() {
                return Err(SemaError {
                    message: "for loop is missing its condition".to_string(),
                    span: f.span,
                });
            }
            if f.update.is_none() {
                return Err(SemaError {
                    message: "for loop is missing its increment".to_string(),
                    span: f.span,
                });
            }
            Ok(())
        })
    }

    fn resolve_switch(&mut self, s: &mut SwitchStmt) -> SemaResult<()> {
        self.in_child_scope(|r| {
            r.resolve_expr(&mut s.scrutinee)?;

            // every arm gets its own scope; arms cannot see each other
            for case in &mut s.cases {
                r.resolve_expr(&mut case.value)?;
                r.in_child_scope(|r| r.resolve_block(&mut case.body))?;
            }
            if let Some(default) = &mut s.default {
                r.in_child_scope(|r| r.resolve_block(&mut default.body))?;
            }
            Ok(())
        })
    }

    fn resolve_expr(&mut self, expr: &mut Expr) -> SemaResult<()> {
        match &mut expr.kind {
            ExprKind::IntLiteral(_)
            | ExprKind::FloatLiteral(_)
            | ExprKind::BoolLiteral(_)
            | ExprKind::StringLiteral(_) => Ok(()),

            ExprKind::Var(v) => match self.table.lookup(self.current(), &v.name.name) {
                Some(symbol) => {
                    v.symbol = Some(symbol);
                    Ok(())
                }
                None => Err(SemaError {
                    message: format!("identifier '{}' not found", v.name.name),
                    span: v.name.span,
                }),
            },

            ExprKind::Binary(left, _, right) => {
                self.resolve_expr(left)?;
                self.resolve_expr(right)
            }

            ExprKind::Unary(_, inner) => self.resolve_expr(inner),

            ExprKind::Call(c) => {
                // arguments resolve before the callee is checked
                for arg in &mut c.args {
                    self.resolve_expr(arg)?;
                }
                match self.table.lookup(self.current(), &c.callee.name) {
                    Some(symbol) => {
                        c.symbol = Some(symbol);
                        Ok(())
                    }
                    None => Err(SemaError {
                        message: format!("function '{}' not defined", c.callee.name),
                        span: c.callee.span,
                    }),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rill_parser::Parser;

    fn resolve_src(source: &str) -> SemaResult<(Program, SymbolTable)> {
        let mut program = Parser::parse(source).expect("test source must parse");
        let table = Resolver::resolve(&mut program)?;
        Ok((program, table))
    }

    fn resolve_err(source: &str) -> SemaError {
        resolve_src(source).expect_err("expected a semantic error")
    }

    fn var_decl(stmt: &Stmt) -> &VarDeclStmt {
        let Stmt::VarDecl(v) = stmt else { panic!("expected var decl") };
        v
    }

    fn assign(stmt: &Stmt) -> &AssignStmt {
        let Stmt::Assign(a) = stmt else { panic!("expected assignment") };
        a
    }

    #[test]
    fn test_minimal_program() {
        let (program, table) = resolve_src("int main() { }").unwrap();
        let main = &program.functions[0];
        assert!(main.symbol.is_some());
        assert_eq!(table.lookup(table.root(), "main"), main.symbol);
        // root scope plus one function scope, one symbol
        assert_eq!(table.scope_count(), 2);
        assert_eq!(table.symbol_count(), 1);
    }

    #[test]
    fn test_missing_entry_point() {
        let err = resolve_err("void f() { }");
        assert!(err.message.contains("no entry function 'main' found"));
    }

    #[test]
    fn test_entry_point_position_does_not_matter() {
        assert!(resolve_src("int main() { } void f() { }").is_ok());
        assert!(resolve_src("void f() { } int main() { }").is_ok());
    }

    #[test]
    fn test_self_initialization_fails() {
        let err = resolve_err("int main() { int x = x; }");
        assert!(err.message.contains("identifier 'x' not found"));
    }

    #[test]
    fn test_duplicate_variable_in_same_scope() {
        let err = resolve_err("int main() { int x = 1; int x = 2; }");
        assert!(err.message.contains("'x' has already been declared in this scope"));
    }

    #[test]
    fn test_shadowing_resolves_to_inner_entry() {
        let source = r#"
            int main() {
                int x = 1;
                if (true) {
                    int x = 2;
                    x = 3;
                }
                x = 4;
            }
        "#;
        let (program, _table) = resolve_src(source).unwrap();
        let stmts = &program.functions[0].body.stmts;

        let outer = var_decl(&stmts[0]).symbol.unwrap();
        let Stmt::If(if_stmt) = &stmts[1] else { panic!("expected if") };
        let inner = var_decl(&if_stmt.body.stmts[0]).symbol.unwrap();
        assert_ne!(outer, inner);

        // inner assignment sees the inner declaration, outer the outer
        assert_eq!(assign(&if_stmt.body.stmts[1]).symbol, Some(inner));
        assert_eq!(assign(&stmts[2]).symbol, Some(outer));
    }

    #[test]
    fn test_sibling_branches_are_isolated() {
        let err = resolve_err(
            "int main() { if (true) { int x = 1; } else { x = 2; } }",
        );
        assert!(err.message.contains("variable 'x' was not found"));
    }

    #[test]
    fn test_outer_declaration_visible_in_both_branches() {
        let source = r#"
            int main() {
                int x = 0;
                if (true) { x = 1; } else { x = 2; }
            }
        "#;
        let (program, _table) = resolve_src(source).unwrap();
        let stmts = &program.functions[0].body.stmts;
        let decl = var_decl(&stmts[0]).symbol.unwrap();
        let Stmt::If(if_stmt) = &stmts[1] else { panic!("expected if") };
        let Some(ElseBranch::Else(else_stmt)) = &if_stmt.else_branch else {
            panic!("expected else");
        };
        assert_eq!(assign(&if_stmt.body.stmts[0]).symbol, Some(decl));
        assert_eq!(assign(&else_stmt.body.stmts[0]).symbol, Some(decl));
    }

    #[test]
    fn test_block_local_names_do_not_escape() {
        let err = resolve_err(
            "int main() { while (true) { int x = 1; } x = 2; }",
        );
        assert!(err.message.contains("variable 'x' was not found"));
    }

    #[test]
    fn test_duplicate_in_inner_scope_is_allowed() {
        let source = r#"
            int main() {
                int x = 1;
                while (true) { int x = 2; }
                do { int x = 3; } while (false);
            }
        "#;
        assert!(resolve_src(source).is_ok());
    }

    #[test]
    fn test_backward_function_call_resolves() {
        let source = r#"
            void f() { }
            void g() { f(); }
            int main() { g(); }
        "#;
        let (program, _table) = resolve_src(source).unwrap();
        let f_symbol = program.functions[0].symbol.unwrap();
        let a = assign(&program.functions[1].body.stmts[0]);
        let ExprKind::Call(call) = &a.value.kind else { panic!("expected call") };
        assert_eq!(call.symbol, Some(f_symbol));
    }

    #[test]
    fn test_forward_function_call_fails() {
        let err = resolve_err(
            "void g() { h(); } void h() { } int main() { }",
        );
        assert!(err.message.contains("function 'h' not defined"));
    }

    #[test]
    fn test_self_recursion_fails() {
        let err = resolve_err("void f() { f(); } int main() { }");
        assert!(err.message.contains("function 'f' not defined"));
    }

    #[test]
    fn test_duplicate_function_name() {
        let err = resolve_err("void f() { } int f() { } int main() { }");
        assert!(err.message.contains("function name 'f' already in use"));
    }

    #[test]
    fn test_duplicate_parameter_name() {
        let err = resolve_err("void f(int a, int a) { } int main() { }");
        assert!(err.message.contains("parameter name 'a' already in use"));
    }

    #[test]
    fn test_parameter_visible_in_body() {
        let source = "void f(int a) { a = a + 1; } int main() { }";
        let (program, _table) = resolve_src(source).unwrap();
        let f = &program.functions[0];
        let param_symbol = f.params[0].symbol.unwrap();
        assert_eq!(assign(&f.body.stmts[0]).symbol, Some(param_symbol));
    }

    #[test]
    fn test_variable_cannot_redeclare_parameter() {
        let err = resolve_err("void f(int a) { int a = 1; } int main() { }");
        assert!(err.message.contains("'a' has already been declared in this scope"));
    }

    #[test]
    fn test_for_loop_variable_stays_in_loop_scope() {
        let source = r#"
            int main() {
                for (int i = 0; i < 3; i = i + 1) { int j = i; }
                i = 5;
            }
        "#;
        let err = resolve_err(source);
        assert!(err.message.contains("variable 'i' was not found"));
    }

    #[test]
    fn test_for_loop_clauses_resolve_in_loop_scope() {
        let source = "int main() { for (int i = 0; i < 3; i = i + 1) { f(i); } } ";
        // `f` is not defined, so the body must actually be visited
        let err = resolve_err(source);
        assert!(err.message.contains("function 'f' not defined"));
    }

    #[test]
    fn test_malformed_for_loop() {
        let mut program = Parser::parse(
            "int main() { for (int i = 0; true; i = i + 1) { } }",
        )
        .unwrap();
        let Stmt::For(for_stmt) = &mut program.functions[0].body.stmts[0] else {
            panic!("expected for");
        };
        for_stmt.cond = None;

        let err = Resolver::resolve(&mut program).unwrap_err();
        assert!(err.message.contains("for loop is missing its condition"));
    }

    #[test]
    fn test_switch_arms_are_isolated() {
        let err = resolve_err(
            r#"
            int main() {
                switch (1) {
                    case 1: int y = 1;
                    case 2: y = 2;
                }
            }
            "#,
        );
        assert!(err.message.contains("variable 'y' was not found"));
    }

    #[test]
    fn test_switch_arms_may_reuse_names() {
        let source = r#"
            int main() {
                int x = 1;
                switch (x) {
                    case 1: int y = 1; y = 2;
                    case 2: int y = 3;
                    default: int y = 9;
                }
            }
        "#;
        assert!(resolve_src(source).is_ok());
    }

    #[test]
    fn test_assignment_to_undeclared_variable() {
        let err = resolve_err("int main() { x = 1; }");
        assert!(err.message.contains("variable 'x' was not found"));
    }

    #[test]
    fn test_undeclared_identifier_in_expression() {
        let err = resolve_err("int main() { int y = z + 1; }");
        assert!(err.message.contains("identifier 'z' not found"));
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let source = r#"
            void f(int a) { a = a * 2; }
            int main() { f(1); }
        "#;
        let (first, _) = resolve_src(source).unwrap();
        let (second, _) = resolve_src(source).unwrap();

        // resolving the same tree again yields the identical entries
        assert_eq!(first.functions[0].symbol, second.functions[0].symbol);
        assert_eq!(
            first.functions[0].params[0].symbol,
            second.functions[0].params[0].symbol
        );
        assert_eq!(
            assign(&first.functions[0].body.stmts[0]).symbol,
            assign(&second.functions[0].body.stmts[0]).symbol
        );
    }

    #[test]
    fn test_symbol_records_declaration() {
        let (program, table) = resolve_src("int main() { int count = 0; }").unwrap();
        let decl = var_decl(&program.functions[0].body.stmts[0]);
        let symbol = table.symbol(decl.symbol.unwrap());
        assert_eq!(symbol.name, "count");
        assert_eq!(symbol.kind, SymbolKind::Variable);
        assert_eq!(symbol.node, decl.id);
    }
}
