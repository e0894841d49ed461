use rill_lexer::Span;

/// Unique identifier for AST nodes that introduce declarations
pub type NodeId = u32;

/// Handle to a symbol table entry, assigned during semantic analysis.
///
/// Declaration and use-site nodes carry an `Option<SymbolId>` slot that
/// starts out `None` and is filled in place by the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolId(pub u32);

impl SymbolId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }
}

/// A complete Rill program (one source file)
#[derive(Debug, Clone)]
pub struct Program {
    pub functions: Vec<FnDef>,
    pub span: Span,
}

/// Builtin type names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Int,
    Float,
    Str,
    Bool,
    Void,
}

/// Type annotation as written in source
#[derive(Debug, Clone)]
pub struct TypeExpr {
    pub kind: TypeKind,
    pub span: Span,
}

impl std::fmt::Display for TypeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeKind::Int => write!(f, "int"),
            TypeKind::Float => write!(f, "float"),
            TypeKind::Str => write!(f, "string"),
            TypeKind::Bool => write!(f, "bool"),
            TypeKind::Void => write!(f, "void"),
        }
    }
}

/// Function definition
#[derive(Debug, Clone)]
pub struct FnDef {
    pub id: NodeId,
    pub return_type: TypeExpr,
    pub name: Ident,
    pub params: Vec<Param>,
    pub body: Block,
    pub symbol: Option<SymbolId>,
    pub span: Span,
}

/// Function parameter
#[derive(Debug, Clone)]
pub struct Param {
    pub id: NodeId,
    pub ty: TypeExpr,
    pub name: Ident,
    pub symbol: Option<SymbolId>,
    pub span: Span,
}

/// A braced statement list.
///
/// A block is a pure container: it does not open a scope by itself. Scopes
/// belong to the constructs that own a block (function bodies, branches,
/// loop bodies, case arms).
#[derive(Debug, Clone)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

/// Statements
#[derive(Debug, Clone)]
pub enum Stmt {
    VarDecl(VarDeclStmt),
    Assign(AssignStmt),
    Return(ReturnStmt),
    If(IfStmt),
    While(WhileStmt),
    DoWhile(DoWhileStmt),
    For(ForStmt),
    Switch(SwitchStmt),
}

/// Variable declaration: `int x = expr`
#[derive(Debug, Clone)]
pub struct VarDeclStmt {
    pub id: NodeId,
    pub ty: TypeExpr,
    pub name: Ident,
    pub init: Expr,
    pub symbol: Option<SymbolId>,
    pub span: Span,
}

/// Assignment or bare expression statement.
///
/// `x = expr` carries a target; a bare call like `foo();` has none.
#[derive(Debug, Clone)]
pub struct AssignStmt {
    pub target: Option<Ident>,
    pub value: Expr,
    pub symbol: Option<SymbolId>,
    pub span: Span,
}

impl AssignStmt {
    pub fn is_assignment(&self) -> bool {
        self.target.is_some()
    }
}

/// Return statement: `return expr?`
#[derive(Debug, Clone)]
pub struct ReturnStmt {
    pub value: Option<Expr>,
    pub span: Span,
}

/// If statement with optional else branch
#[derive(Debug, Clone)]
pub struct IfStmt {
    pub cond: Expr,
    pub body: Block,
    pub else_branch: Option<ElseBranch>,
    pub span: Span,
}

/// Else branch - a plain else block or a chained `else if`
#[derive(Debug, Clone)]
pub enum ElseBranch {
    Else(ElseStmt),
    ElseIf(Box<IfStmt>),
}

/// Plain else block
#[derive(Debug, Clone)]
pub struct ElseStmt {
    pub body: Block,
    pub span: Span,
}

/// While loop
#[derive(Debug, Clone)]
pub struct WhileStmt {
    pub cond: Expr,
    pub body: Block,
    pub span: Span,
}

/// Do-while loop
#[derive(Debug, Clone)]
pub struct DoWhileStmt {
    pub body: Block,
    pub cond: Expr,
    pub span: Span,
}

/// For loop: `for (init; cond; update) { ... }`
///
/// The parser always fills all three clauses; they are optional in the tree
/// so that semantic analysis can check structural well-formedness.
#[derive(Debug, Clone)]
pub struct ForStmt {
    pub init: Option<Box<VarDeclStmt>>,
    pub cond: Option<Expr>,
    pub update: Option<Box<AssignStmt>>,
    pub body: Block,
    pub span: Span,
}

/// Switch statement
#[derive(Debug, Clone)]
pub struct SwitchStmt {
    pub scrutinee: Expr,
    pub cases: Vec<CaseArm>,
    pub default: Option<DefaultArm>,
    pub span: Span,
}

/// One `case literal:` arm
#[derive(Debug, Clone)]
pub struct CaseArm {
    pub value: Expr,
    pub body: Block,
    pub span: Span,
}

/// The `default:` arm
#[derive(Debug, Clone)]
pub struct DefaultArm {
    pub body: Block,
    pub span: Span,
}

/// Expressions
#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    /// Integer literal: 42
    IntLiteral(i64),
    /// Float literal: 3.14
    FloatLiteral(f64),
    /// Boolean literal: true, false
    BoolLiteral(bool),
    /// String literal: "hello"
    StringLiteral(String),
    /// Variable reference: foo
    Var(VarExpr),
    /// Binary operation: a + b
    Binary(Box<Expr>, BinOp, Box<Expr>),
    /// Unary operation: -x, !x
    Unary(UnaryOp, Box<Expr>),
    /// Function call: foo(a, b)
    Call(CallExpr),
}

/// Identifier use site
#[derive(Debug, Clone)]
pub struct VarExpr {
    pub name: Ident,
    pub symbol: Option<SymbolId>,
}

/// Call to a named function
#[derive(Debug, Clone)]
pub struct CallExpr {
    pub callee: Ident,
    pub args: Vec<Expr>,
    pub symbol: Option<SymbolId>,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    // Comparison
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    // Logical
    And,
    Or,
}

impl BinOp {
    pub fn precedence(self) -> u8 {
        match self {
            BinOp::Or => 1,
            BinOp::And => 2,
            BinOp::Eq | BinOp::NotEq => 3,
            BinOp::Lt | BinOp::Gt | BinOp::LtEq | BinOp::GtEq => 4,
            BinOp::Add | BinOp::Sub => 5,
            BinOp::Mul | BinOp::Div | BinOp::Mod => 6,
        }
    }
}

impl std::fmt::Display for BinOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BinOp::Add => write!(f, "+"),
            BinOp::Sub => write!(f, "-"),
            BinOp::Mul => write!(f, "*"),
            BinOp::Div => write!(f, "/"),
            BinOp::Mod => write!(f, "%"),
            BinOp::Eq => write!(f, "=="),
            BinOp::NotEq => write!(f, "!="),
            BinOp::Lt => write!(f, "<"),
            BinOp::Gt => write!(f, ">"),
            BinOp::LtEq => write!(f, "<="),
            BinOp::GtEq => write!(f, ">="),
            BinOp::And => write!(f, "&&"),
            BinOp::Or => write!(f, "||"),
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg, // -
    Not, // !
}

impl std::fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnaryOp::Neg => write!(f, "-"),
            UnaryOp::Not => write!(f, "!"),
        }
    }
}

/// Identifier with span
#[derive(Debug, Clone)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: String, span: Span) -> Self {
        Self { name, span }
    }
}

// === Pretty Printing ===

impl Program {
    pub fn pretty_print(&self) -> String {
        let mut out = String::new();
        for f in &self.functions {
            out.push_str(&f.pretty_print(0));
            out.push('\n');
        }
        out
    }
}

impl FnDef {
    pub fn pretty_print(&self, indent: usize) -> String {
        let ind = "  ".repeat(indent);
        let mut out = format!("{}FnDef '{}' -> {}\n", ind, self.name.name, self.return_type.kind);
        if !self.params.is_empty() {
            out.push_str(&format!("{}  params:\n", ind));
            for p in &self.params {
                out.push_str(&format!("{}    {}: {}\n", ind, p.name.name, p.ty.kind));
            }
        }
        out.push_str(&format!("{}  body:\n", ind));
        out.push_str(&self.body.pretty_print(indent + 2));
        out
    }
}

impl Block {
    pub fn pretty_print(&self, indent: usize) -> String {
        let ind = "  ".repeat(indent);
        let mut out = format!("{}Block\n", ind);
        for stmt in &self.stmts {
            out.push_str(&stmt.pretty_print(indent + 1));
        }
        out
    }
}

impl Stmt {
    pub fn pretty_print(&self, indent: usize) -> String {
        let ind = "  ".repeat(indent);
        match self {
            Stmt::VarDecl(v) => {
                let mut out = format!("{}VarDecl {} {} =\n", ind, v.ty.kind, v.name.name);
                out.push_str(&v.init.pretty_print_indented(indent + 1));
                out
            }
            Stmt::Assign(a) => {
                if let Some(target) = &a.target {
                    let mut out = format!("{}Assign {} =\n", ind, target.name);
                    out.push_str(&a.value.pretty_print_indented(indent + 1));
                    out
                } else {
                    let mut out = format!("{}ExprStmt\n", ind);
                    out.push_str(&a.value.pretty_print_indented(indent + 1));
                    out
                }
            }
            Stmt::Return(r) => {
                let mut out = format!("{}Return\n", ind);
                if let Some(value) = &r.value {
                    out.push_str(&value.pretty_print_indented(indent + 1));
                }
                out
            }
            Stmt::If(i) => i.pretty_print(indent),
            Stmt::While(w) => {
                let mut out = format!("{}While\n", ind);
                out.push_str(&format!("{}  condition:\n", ind));
                out.push_str(&w.cond.pretty_print_indented(indent + 2));
                out.push_str(&format!("{}  body:\n", ind));
                out.push_str(&w.body.pretty_print(indent + 2));
                out
            }
            Stmt::DoWhile(d) => {
                let mut out = format!("{}DoWhile\n", ind);
                out.push_str(&format!("{}  body:\n", ind));
                out.push_str(&d.body.pretty_print(indent + 2));
                out.push_str(&format!("{}  condition:\n", ind));
                out.push_str(&d.cond.pretty_print_indented(indent + 2));
                out
            }
            Stmt::For(f) => {
                let mut out = format!("{}For\n", ind);
                if let Some(init) = &f.init {
                    out.push_str(&format!("{}  init:\n", ind));
                    out.push_str(&Stmt::VarDecl((**init).clone()).pretty_print(indent + 2));
                }
                if let Some(cond) = &f.cond {
                    out.push_str(&format!("{}  condition:\n", ind));
                    out.push_str(&cond.pretty_print_indented(indent + 2));
                }
                if let Some(update) = &f.update {
                    out.push_str(&format!("{}  update:\n", ind));
                    out.push_str(&Stmt::Assign((**update).clone()).pretty_print(indent + 2));
                }
                out.push_str(&format!("{}  body:\n", ind));
                out.push_str(&f.body.pretty_print(indent + 2));
                out
            }
            Stmt::Switch(s) => {
                let mut out = format!("{}Switch\n", ind);
                out.push_str(&format!("{}  scrutinee:\n", ind));
                out.push_str(&s.scrutinee.pretty_print_indented(indent + 2));
                for case in &s.cases {
                    out.push_str(&format!("{}  case {}:\n", ind, case.value.pretty_print()));
                    out.push_str(&case.body.pretty_print(indent + 2));
                }
                if let Some(default) = &s.default {
                    out.push_str(&format!("{}  default:\n", ind));
                    out.push_str(&default.body.pretty_print(indent + 2));
                }
                out
            }
        }
    }
}

impl IfStmt {
    pub fn pretty_print(&self, indent: usize) -> String {
        let ind = "  ".repeat(indent);
        let mut out = format!("{}If\n", ind);
        out.push_str(&format!("{}  condition:\n", ind));
        out.push_str(&self.cond.pretty_print_indented(indent + 2));
        out.push_str(&format!("{}  then:\n", ind));
        out.push_str(&self.body.pretty_print(indent + 2));
        match &self.else_branch {
            Some(ElseBranch::Else(e)) => {
                out.push_str(&format!("{}  else:\n", ind));
                out.push_str(&e.body.pretty_print(indent + 2));
            }
            Some(ElseBranch::ElseIf(i)) => {
                out.push_str(&format!("{}  else:\n", ind));
                out.push_str(&i.pretty_print(indent + 2));
            }
            None => {}
        }
        out
    }
}

impl Expr {
    /// Pretty print with indentation for full AST display
    pub fn pretty_print_indented(&self, indent: usize) -> String {
        let ind = "  ".repeat(indent);
        match &self.kind {
            ExprKind::IntLiteral(n) => format!("{}Int({})\n", ind, n),
            ExprKind::FloatLiteral(n) => format!("{}Float({})\n", ind, n),
            ExprKind::BoolLiteral(b) => format!("{}Bool({})\n", ind, b),
            ExprKind::StringLiteral(s) => format!("{}String(\"{}\")\n", ind, s),
            ExprKind::Var(v) => format!("{}Var({})\n", ind, v.name.name),
            ExprKind::Binary(l, op, r) => {
                let mut out = format!("{}Binary({})\n", ind, op);
                out.push_str(&l.pretty_print_indented(indent + 1));
                out.push_str(&r.pretty_print_indented(indent + 1));
                out
            }
            ExprKind::Unary(op, e) => {
                let mut out = format!("{}Unary({})\n", ind, op);
                out.push_str(&e.pretty_print_indented(indent + 1));
                out
            }
            ExprKind::Call(c) => {
                let mut out = format!("{}Call({})\n", ind, c.callee.name);
                for arg in &c.args {
                    out.push_str(&arg.pretty_print_indented(indent + 1));
                }
                out
            }
        }
    }

    /// Compact pretty print (for inline display)
    pub fn pretty_print(&self) -> String {
        match &self.kind {
            ExprKind::IntLiteral(n) => format!("{}", n),
            ExprKind::FloatLiteral(n) => format!("{}", n),
            ExprKind::BoolLiteral(b) => format!("{}", b),
            ExprKind::StringLiteral(s) => format!("\"{}\"", s),
            ExprKind::Var(v) => v.name.name.clone(),
            ExprKind::Binary(l, op, r) => {
                format!("({} {} {})", l.pretty_print(), op, r.pretty_print())
            }
            ExprKind::Unary(op, e) => format!("({}{})", op, e.pretty_print()),
            ExprKind::Call(c) => {
                let args: Vec<_> = c.args.iter().map(|a| a.pretty_print()).collect();
                format!("{}({})", c.callee.name, args.join(", "))
            }
        }
    }
}
