use rill_ast::*;
use rill_lexer::{Lexer, Span, SpannedToken, Token};

pub struct Parser {
    tokens: Vec<SpannedToken>,
    pos: usize,
    next_node_id: NodeId,
}

#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at {}..{}", self.message, self.span.start, self.span.end)
    }
}

impl std::error::Error for ParseError {}

pub type ParseResult<T> = Result<T, ParseError>;

impl Parser {
    pub fn new(source: &str) -> ParseResult<Self> {
        let tokens = Lexer::tokenize(source)
            .map_err(|e| ParseError { message: e.message, span: e.span })?;
        Ok(Self { tokens, pos: 0, next_node_id: 0 })
    }

    pub fn parse(source: &str) -> ParseResult<Program> {
        let mut parser = Parser::new(source)?;
        parser.parse_program()
    }

    // === Token Access ===

    fn current(&self) -> &SpannedToken {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek(&self) -> &Token {
        &self.current().token
    }

    fn peek_at(&self, offset: usize) -> &Token {
        let idx = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[idx].token
    }

    fn peek_span(&self) -> Span {
        self.current().span
    }

    fn advance(&mut self) -> &SpannedToken {
        let idx = self.pos.min(self.tokens.len() - 1);
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        &self.tokens[idx]
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek(), Token::Eof)
    }

    fn check(&self, token: &Token) -> bool {
        std::mem::discriminant(self.peek()) == std::mem::discriminant(token)
    }

    fn expect(&mut self, expected: Token) -> ParseResult<SpannedToken> {
        if self.check(&expected) {
            Ok(self.advance().clone())
        } else {
            Err(ParseError {
                message: format!("expected '{}', found '{}'", expected, self.peek()),
                span: self.peek_span(),
            })
        }
    }

    fn expect_ident(&mut self) -> ParseResult<Ident> {
        match self.peek().clone() {
            Token::Ident(name) => {
                let span = self.peek_span();
                self.advance();
                Ok(Ident::new(name, span))
            }
            _ => Err(ParseError {
                message: format!("expected identifier, found '{}'", self.peek()),
                span: self.peek_span(),
            }),
        }
    }

    fn fresh_id(&mut self) -> NodeId {
        let id = self.next_node_id;
        self.next_node_id += 1;
        id
    }

    // === Parsing ===

    fn parse_program(&mut self) -> ParseResult<Program> {
        let start = self.peek_span();
        let mut functions = Vec::new();

        while !self.is_at_end() {
            functions.push(self.parse_fn_def()?);
        }

        let span = start.to(self.peek_span());
        Ok(Program { functions, span })
    }

    fn parse_type(&mut self) -> ParseResult<TypeExpr> {
        let span = self.peek_span();
        let kind = match self.peek() {
            Token::KwInt => TypeKind::Int,
            Token::KwFloat => TypeKind::Float,
            Token::KwString => TypeKind::Str,
            Token::KwBool => TypeKind::Bool,
            Token::KwVoid => TypeKind::Void,
            other => {
                return Err(ParseError {
                    message: format!("expected type, found '{}'", other),
                    span,
                });
            }
        };
        self.advance();
        Ok(TypeExpr { kind, span })
    }

    fn is_type_start(&self) -> bool {
        matches!(
            self.peek(),
            Token::KwInt | Token::KwFloat | Token::KwString | Token::KwBool | Token::KwVoid
        )
    }

    fn parse_fn_def(&mut self) -> ParseResult<FnDef> {
        let start = self.peek_span();
        let id = self.fresh_id();
        let return_type = self.parse_type()?;
        let name = self.expect_ident()?;

        self.expect(Token::LParen)?;
        let mut params = Vec::new();
        if !self.check(&Token::RParen) {
            loop {
                params.push(self.parse_param()?);
                if !self.check(&Token::Comma) {
                    break;
                }
                self.advance();
            }
        }
        self.expect(Token::RParen)?;

        let body = self.parse_block()?;
        let span = start.to(body.span);

        Ok(FnDef { id, return_type, name, params, body, symbol: None, span })
    }

    fn parse_param(&mut self) -> ParseResult<Param> {
        let start = self.peek_span();
        let id = self.fresh_id();
        let ty = self.parse_type()?;
        let name = self.expect_ident()?;
        let span = start.to(name.span);
        Ok(Param { id, ty, name, symbol: None, span })
    }

    fn parse_block(&mut self) -> ParseResult<Block> {
        let start = self.expect(Token::LBrace)?.span;
        let mut stmts = Vec::new();

        while !self.check(&Token::RBrace) && !self.is_at_end() {
            stmts.push(self.parse_stmt()?);
        }

        let end = self.expect(Token::RBrace)?.span;
        Ok(Block { stmts, span: start.to(end) })
    }

    fn parse_stmt(&mut self) -> ParseResult<Stmt> {
        match self.peek() {
            Token::If => self.parse_if_stmt().map(Stmt::If),
            Token::While => self.parse_while_stmt().map(Stmt::While),
            Token::Do => {
                let stmt = self.parse_do_while_stmt()?;
                self.expect(Token::Semi)?;
                Ok(Stmt::DoWhile(stmt))
            }
            Token::For => self.parse_for_stmt().map(Stmt::For),
            Token::Switch => self.parse_switch_stmt().map(Stmt::Switch),
            Token::Return => {
                let stmt = self.parse_return_stmt()?;
                self.expect(Token::Semi)?;
                Ok(Stmt::Return(stmt))
            }
            _ if self.is_type_start() => {
                let decl = self.parse_var_decl()?;
                self.expect(Token::Semi)?;
                Ok(Stmt::VarDecl(decl))
            }
            _ => {
                let stmt = self.parse_assign_stmt()?;
                self.expect(Token::Semi)?;
                Ok(Stmt::Assign(stmt))
            }
        }
    }

    fn parse_var_decl(&mut self) -> ParseResult<VarDeclStmt> {
        let start = self.peek_span();
        let id = self.fresh_id();
        let ty = self.parse_type()?;
        let name = self.expect_ident()?;
        self.expect(Token::Eq)?;
        let init = self.parse_expr()?;
        let span = start.to(init.span);
        Ok(VarDeclStmt { id, ty, name, init, symbol: None, span })
    }

    fn parse_assign_stmt(&mut self) -> ParseResult<AssignStmt> {
        let start = self.peek_span();

        // `name = expr` needs two tokens of lookahead to disambiguate from a
        // bare expression statement starting with an identifier
        let target = if matches!(self.peek(), Token::Ident(_))
            && matches!(self.peek_at(1), Token::Eq)
        {
            let name = self.expect_ident()?;
            self.expect(Token::Eq)?;
            Some(name)
        } else {
            None
        };

        let value = self.parse_expr()?;
        let span = start.to(value.span);
        Ok(AssignStmt { target, value, symbol: None, span })
    }

    fn parse_return_stmt(&mut self) -> ParseResult<ReturnStmt> {
        let start = self.expect(Token::Return)?.span;
        let value = if self.check(&Token::Semi) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        let end = value.as_ref().map(|v| v.span).unwrap_or(start);
        Ok(ReturnStmt { value, span: start.to(end) })
    }

    fn parse_if_stmt(&mut self) -> ParseResult<IfStmt> {
        let start = self.expect(Token::If)?.span;
        self.expect(Token::LParen)?;
        let cond = self.parse_expr()?;
        self.expect(Token::RParen)?;
        let body = self.parse_block()?;

        let mut end = body.span;
        let else_branch = if self.check(&Token::Else) {
            let else_span = self.advance().span;
            if self.check(&Token::If) {
                let nested = self.parse_if_stmt()?;
                end = nested.span;
                Some(ElseBranch::ElseIf(Box::new(nested)))
            } else {
                let else_body = self.parse_block()?;
                end = else_body.span;
                Some(ElseBranch::Else(ElseStmt {
                    span: else_span.to(else_body.span),
                    body: else_body,
                }))
            }
        } else {
            None
        };

        Ok(IfStmt { cond, body, else_branch, span: start.to(end) })
    }

    fn parse_while_stmt(&mut self) -> ParseResult<WhileStmt> {
        let start = self.expect(Token::While)?.span;
        self.expect(Token::LParen)?;
        let cond = self.parse_expr()?;
        self.expect(Token::RParen)?;
        let body = self.parse_block()?;
        let span = start.to(body.span);
        Ok(WhileStmt { cond, body, span })
    }

    fn parse_do_while_stmt(&mut self) -> ParseResult<DoWhileStmt> {
        let start = self.expect(Token::Do)?.span;
        let body = self.parse_block()?;
        self.expect(Token::While)?;
        self.expect(Token::LParen)?;
        let cond = self.parse_expr()?;
        let end = self.expect(Token::RParen)?.span;
        Ok(DoWhileStmt { body, cond, span: start.to(end) })
    }

    fn parse_for_stmt(&mut self) -> ParseResult<ForStmt> {
        let start = self.expect(Token::For)?.span;
        self.expect(Token::LParen)?;
        let init = self.parse_var_decl()?;
        self.expect(Token::Semi)?;
        let cond = self.parse_expr()?;
        self.expect(Token::Semi)?;
        let update = self.parse_assign_stmt()?;
        self.expect(Token::RParen)?;
        let body = self.parse_block()?;
        let span = start.to(body.span);

        Ok(ForStmt {
            init: Some(Box::new(init)),
            cond: Some(cond),
            update: Some(Box::new(update)),
            body,
            span,
        })
    }

    fn parse_switch_stmt(&mut self) -> ParseResult<SwitchStmt> {
        let start = self.expect(Token::Switch)?.span;
        self.expect(Token::LParen)?;
        let scrutinee = self.parse_expr()?;
        self.expect(Token::RParen)?;
        self.expect(Token::LBrace)?;

        let mut cases = Vec::new();
        let mut default = None;

        while !self.check(&Token::RBrace) && !self.is_at_end() {
            match self.peek() {
                Token::Case => {
                    let case_start = self.advance().span;
                    let value = self.parse_case_literal()?;
                    self.expect(Token::Colon)?;
                    let body = self.parse_case_body()?;
                    let span = case_start.to(body.span);
                    cases.push(CaseArm { value, body, span });
                }
                Token::Default => {
                    if default.is_some() {
                        return Err(ParseError {
                            message: "duplicate 'default' arm in switch".to_string(),
                            span: self.peek_span(),
                        });
                    }
                    let default_start = self.advance().span;
                    self.expect(Token::Colon)?;
                    let body = self.parse_case_body()?;
                    let span = default_start.to(body.span);
                    default = Some(DefaultArm { body, span });
                }
                other => {
                    return Err(ParseError {
                        message: format!("expected 'case' or 'default', found '{}'", other),
                        span: self.peek_span(),
                    });
                }
            }
        }

        let end = self.expect(Token::RBrace)?.span;
        Ok(SwitchStmt { scrutinee, cases, default, span: start.to(end) })
    }

    fn parse_case_literal(&mut self) -> ParseResult<Expr> {
        let span = self.peek_span();
        let kind = match self.peek().clone() {
            Token::IntLiteral(n) => ExprKind::IntLiteral(n),
            Token::FloatLiteral(n) => ExprKind::FloatLiteral(n),
            Token::StringLiteral(s) => ExprKind::StringLiteral(s),
            Token::True => ExprKind::BoolLiteral(true),
            Token::False => ExprKind::BoolLiteral(false),
            other => {
                return Err(ParseError {
                    message: format!("expected literal in case label, found '{}'", other),
                    span,
                });
            }
        };
        self.advance();
        Ok(Expr { kind, span })
    }

    /// Statements of one case arm, up to the next arm or the closing brace
    fn parse_case_body(&mut self) -> ParseResult<Block> {
        let start = self.peek_span();
        let mut stmts = Vec::new();

        while !matches!(self.peek(), Token::Case | Token::Default | Token::RBrace)
            && !self.is_at_end()
        {
            stmts.push(self.parse_stmt()?);
        }

        let end = stmts
            .last()
            .map(|_| self.tokens[self.pos - 1].span)
            .unwrap_or(start);
        Ok(Block { stmts, span: start.to(end) })
    }

    // === Expressions ===

    fn parse_expr(&mut self) -> ParseResult<Expr> {
        self.parse_binary(0)
    }

    fn peek_binop(&self) -> Option<BinOp> {
        let op = match self.peek() {
            Token::Plus => BinOp::Add,
            Token::Minus => BinOp::Sub,
            Token::Star => BinOp::Mul,
            Token::Slash => BinOp::Div,
            Token::Percent => BinOp::Mod,
            Token::EqEq => BinOp::Eq,
            Token::NotEq => BinOp::NotEq,
            Token::Lt => BinOp::Lt,
            Token::Gt => BinOp::Gt,
            Token::LtEq => BinOp::LtEq,
            Token::GtEq => BinOp::GtEq,
            Token::AndAnd => BinOp::And,
            Token::OrOr => BinOp::Or,
            _ => return None,
        };
        Some(op)
    }

    fn parse_binary(&mut self, min_prec: u8) -> ParseResult<Expr> {
        let mut lhs = self.parse_unary()?;

        while let Some(op) = self.peek_binop() {
            let prec = op.precedence();
            if prec < min_prec {
                break;
            }
            self.advance();
            let rhs = self.parse_binary(prec + 1)?;
            let span = lhs.span.to(rhs.span);
            lhs = Expr {
                kind: ExprKind::Binary(Box::new(lhs), op, Box::new(rhs)),
                span,
            };
        }

        Ok(lhs)
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        let op = match self.peek() {
            Token::Minus => Some(UnaryOp::Neg),
            Token::Not => Some(UnaryOp::Not),
            _ => None,
        };

        if let Some(op) = op {
            let start = self.advance().span;
            let inner = self.parse_unary()?;
            let span = start.to(inner.span);
            return Ok(Expr {
                kind: ExprKind::Unary(op, Box::new(inner)),
                span,
            });
        }

        self.parse_atom()
    }

    fn parse_atom(&mut self) -> ParseResult<Expr> {
        let span = self.peek_span();
        match self.peek().clone() {
            Token::IntLiteral(n) => {
                self.advance();
                Ok(Expr { kind: ExprKind::IntLiteral(n), span })
            }
            Token::FloatLiteral(n) => {
                self.advance();
                Ok(Expr { kind: ExprKind::FloatLiteral(n), span })
            }
            Token::StringLiteral(s) => {
                self.advance();
                Ok(Expr { kind: ExprKind::StringLiteral(s), span })
            }
            Token::True => {
                self.advance();
                Ok(Expr { kind: ExprKind::BoolLiteral(true), span })
            }
            Token::False => {
                self.advance();
                Ok(Expr { kind: ExprKind::BoolLiteral(false), span })
            }
            Token::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Token::Ident(_) => {
                let name = self.expect_ident()?;
                if self.check(&Token::LParen) {
                    self.parse_call(name)
                } else {
                    let span = name.span;
                    Ok(Expr {
                        kind: ExprKind::Var(VarExpr { name, symbol: None }),
                        span,
                    })
                }
            }
            other => Err(ParseError {
                message: format!("expected expression, found '{}'", other),
                span,
            }),
        }
    }

    fn parse_call(&mut self, callee: Ident) -> ParseResult<Expr> {
        self.expect(Token::LParen)?;
        let mut args = Vec::new();
        if !self.check(&Token::RParen) {
            loop {
                args.push(self.parse_expr()?);
                if !self.check(&Token::Comma) {
                    break;
                }
                self.advance();
            }
        }
        let end = self.expect(Token::RParen)?.span;
        let span = callee.span.to(end);

        Ok(Expr {
            kind: ExprKind::Call(CallExpr { callee, args, symbol: None }),
            span,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_fn() {
        let source = "int main() { int x = 5; }";
        let ast = Parser::parse(source).unwrap();
        assert_eq!(ast.functions.len(), 1);
        assert_eq!(ast.functions[0].name.name, "main");
        assert_eq!(ast.functions[0].body.stmts.len(), 1);
    }

    #[test]
    fn test_parse_params() {
        let source = "void add(int a, int b) { return; }";
        let ast = Parser::parse(source).unwrap();
        let f = &ast.functions[0];
        assert_eq!(f.params.len(), 2);
        assert_eq!(f.params[0].name.name, "a");
        assert_eq!(f.params[1].name.name, "b");
        assert_ne!(f.params[0].id, f.params[1].id);
    }

    #[test]
    fn test_parse_if_else_chain() {
        let source = r#"
            int main() {
                if (true) { int x = 1; } else if (false) { int y = 2; } else { int z = 3; }
            }
        "#;
        let ast = Parser::parse(source).unwrap();
        let Stmt::If(if_stmt) = &ast.functions[0].body.stmts[0] else {
            panic!("expected if");
        };
        let Some(ElseBranch::ElseIf(nested)) = &if_stmt.else_branch else {
            panic!("expected else if");
        };
        assert!(matches!(nested.else_branch, Some(ElseBranch::Else(_))));
    }

    #[test]
    fn test_parse_for_loop() {
        let source = "int main() { for (int i = 0; i < 10; i = i + 1) { f(i); } }";
        let ast = Parser::parse(source).unwrap();
        let Stmt::For(for_stmt) = &ast.functions[0].body.stmts[0] else {
            panic!("expected for");
        };
        assert!(for_stmt.init.is_some());
        assert!(for_stmt.cond.is_some());
        assert!(for_stmt.update.is_some());
    }

    #[test]
    fn test_parse_switch() {
        let source = r#"
            int main() {
                switch (x) {
                    case 1: int a = 1;
                    case 2: int b = 2; b = 3;
                    default: int c = 0;
                }
            }
        "#;
        let ast = Parser::parse(source).unwrap();
        let Stmt::Switch(switch) = &ast.functions[0].body.stmts[0] else {
            panic!("expected switch");
        };
        assert_eq!(switch.cases.len(), 2);
        assert_eq!(switch.cases[1].body.stmts.len(), 2);
        assert!(switch.default.is_some());
    }

    #[test]
    fn test_parse_do_while() {
        let source = "int main() { do { int x = 1; } while (true); }";
        let ast = Parser::parse(source).unwrap();
        assert!(matches!(ast.functions[0].body.stmts[0], Stmt::DoWhile(_)));
    }

    #[test]
    fn test_parse_precedence() {
        let source = "int main() { int x = 1 + 2 * 3; }";
        let ast = Parser::parse(source).unwrap();
        let Stmt::VarDecl(decl) = &ast.functions[0].body.stmts[0] else {
            panic!("expected var decl");
        };
        assert_eq!(decl.init.pretty_print(), "(1 + (2 * 3))");
    }

    #[test]
    fn test_assignment_vs_expr_stmt() {
        let source = "int main() { x = 1; f(2); }";
        let ast = Parser::parse(source).unwrap();
        let stmts = &ast.functions[0].body.stmts;
        let Stmt::Assign(a) = &stmts[0] else { panic!("expected assign") };
        assert!(a.is_assignment());
        let Stmt::Assign(b) = &stmts[1] else { panic!("expected expr stmt") };
        assert!(!b.is_assignment());
    }

    #[test]
    fn test_parse_error_missing_semi() {
        let source = "int main() { int x = 5 }";
        let err = Parser::parse(source).unwrap_err();
        assert!(err.message.contains("expected ';'"));
    }

    #[test]
    fn test_parse_error_case_label() {
        let source = "int main() { switch (x) { case y: int a = 1; } }";
        let err = Parser::parse(source).unwrap_err();
        assert!(err.message.contains("expected literal in case label"));
    }
}
