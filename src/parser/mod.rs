use tracing::debug;

use crate::ast::*;
use crate::error::{CompileError, ErrorKind};
use crate::scanner::token::{Literal, Span, Token, TokenKind};

type ParseResult<T> = Result<T, CompileError>;

/// Recursive-descent parser producing a list of statements.
///
/// Errors are collected per declaration; after each one the parser skips to
/// the next statement boundary and keeps going, so a single run reports every
/// independent syntax error.
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    errors: Vec<CompileError>,
    /// Number of function bodies enclosing the current token.
    function_depth: usize,
    /// Number of open `{` blocks, function bodies included.
    block_depth: usize,
}

impl Parser {
    /// `tokens` must end with an `Eof` token, as produced by the scanner.
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            current: 0,
            errors: Vec::new(),
            function_depth: 0,
            block_depth: 0,
        }
    }

    pub fn parse(mut self) -> Result<Vec<Stmt>, Vec<CompileError>> {
        let mut statements = Vec::new();
        while !self.is_at_end() {
            if let Some(stmt) = self.recovering_declaration() {
                statements.push(stmt);
            }
        }
        if self.errors.is_empty() {
            Ok(statements)
        } else {
            Err(self.errors)
        }
    }

    /// Parse one declaration; on failure record the error and resynchronize.
    fn recovering_declaration(&mut self) -> Option<Stmt> {
        match self.declaration() {
            Ok(stmt) => Some(stmt),
            Err(e) => {
                debug!(error = %e, "recovering from syntax error");
                self.errors.push(e);
                self.synchronize();
                None
            }
        }
    }

    fn declaration(&mut self) -> ParseResult<Stmt> {
        match self.peek().kind {
            TokenKind::Variabile => self.var_declaration(),
            TokenKind::Funzione => self.function_declaration(),
            _ => self.statement(),
        }
    }

    fn var_declaration(&mut self) -> ParseResult<Stmt> {
        let start = self.current_span();
        self.advance(); // consume 'variabile'
        let name = self.expect_identifier("variable name")?;

        let initializer = if self.match_token(TokenKind::Equal) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(TokenKind::Semicolon, "';' after variable declaration")?;
        Ok(Stmt::Var(VarStmt {
            name,
            initializer,
            span: self.span_from(start),
        }))
    }

    fn function_declaration(&mut self) -> ParseResult<Stmt> {
        let start = self.current_span();
        self.advance(); // consume 'funzione'
        let name = self.expect_identifier("function name")?;

        self.consume(TokenKind::LeftParen, "'(' after function name")?;
        let mut params = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                params.push(self.expect_identifier("parameter name")?);
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "')' after parameters")?;
        self.consume(TokenKind::LeftBrace, "'{' before function body")?;

        self.function_depth += 1;
        let body = self.block_statements();
        self.function_depth -= 1;

        Ok(Stmt::Function(FunctionStmt {
            name,
            params,
            body: body?,
            span: self.span_from(start),
        }))
    }

    fn statement(&mut self) -> ParseResult<Stmt> {
        match self.peek().kind {
            TokenKind::Se => self.if_statement(),
            TokenKind::Mentre => self.while_statement(),
            TokenKind::Ritorna => self.return_statement(),
            TokenKind::LeftBrace => self.block_statement(),
            _ => self.expression_statement(),
        }
    }

    fn if_statement(&mut self) -> ParseResult<Stmt> {
        let start = self.current_span();
        self.advance(); // consume 'se'
        self.consume(TokenKind::LeftParen, "'(' after 'se'")?;
        let condition = self.expression()?;
        self.consume(TokenKind::RightParen, "')' after condition")?;

        let then_branch = Box::new(self.statement()?);
        let else_branch = if self.match_token(TokenKind::Oppure) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Ok(Stmt::If(IfStmt {
            condition,
            then_branch,
            else_branch,
            span: self.span_from(start),
        }))
    }

    fn while_statement(&mut self) -> ParseResult<Stmt> {
        let start = self.current_span();
        self.advance(); // consume 'mentre'
        self.consume(TokenKind::LeftParen, "'(' after 'mentre'")?;
        if self.check(TokenKind::RightParen) {
            return Err(self.error_at_current(
                ErrorKind::MissingWhileCondition,
                "missing condition in 'mentre'",
            ));
        }
        let condition = self.expression()?;
        self.consume(TokenKind::RightParen, "')' after condition")?;
        let body = Box::new(self.statement()?);
        Ok(Stmt::While(WhileStmt {
            condition,
            body,
            span: self.span_from(start),
        }))
    }

    fn return_statement(&mut self) -> ParseResult<Stmt> {
        let start = self.current_span();
        if self.function_depth == 0 {
            return Err(self.error_at_current(
                ErrorKind::ReturnOutsideFunction,
                "'ritorna' outside of a function",
            ));
        }
        self.advance(); // consume 'ritorna'
        let value = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(TokenKind::Semicolon, "';' after return value")?;
        Ok(Stmt::Return(ReturnStmt {
            value,
            span: self.span_from(start),
        }))
    }

    fn block_statement(&mut self) -> ParseResult<Stmt> {
        let start = self.current_span();
        self.advance(); // consume '{'
        let statements = self.block_statements()?;
        Ok(Stmt::Block(BlockStmt {
            statements,
            span: self.span_from(start),
        }))
    }

    /// Declarations up to and including the closing `}`. A bad declaration
    /// inside the block is recorded and skipped rather than aborting the block.
    fn block_statements(&mut self) -> ParseResult<Vec<Stmt>> {
        let mut statements = Vec::new();
        self.block_depth += 1;
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            if let Some(stmt) = self.recovering_declaration() {
                statements.push(stmt);
            }
        }
        self.block_depth -= 1;
        self.consume(TokenKind::RightBrace, "'}' after block")?;
        Ok(statements)
    }

    fn expression_statement(&mut self) -> ParseResult<Stmt> {
        let expression = self.expression()?;
        self.consume(TokenKind::Semicolon, "';' after expression")?;
        let span = expression.span().to(self.previous_span());
        Ok(Stmt::Expression(ExprStmt { expression, span }))
    }

    // --- Expressions, lowest precedence first ---

    fn expression(&mut self) -> ParseResult<Expr> {
        self.assignment()
    }

    fn assignment(&mut self) -> ParseResult<Expr> {
        let expr = self.equality()?;

        if !self.check(TokenKind::Equal) {
            return Ok(expr);
        }
        let equals = self.advance().clone();
        let value = Box::new(self.assignment()?);
        let span = expr.span().to(value.span());

        match expr {
            Expr::Variable(v) => Ok(Expr::Assign(AssignExpr {
                name: v.name,
                value,
                span,
            })),
            Expr::Get(g) => Ok(Expr::Set(SetExpr {
                object: g.object,
                name: g.name,
                value,
                span,
            })),
            _ => Err(self.error_at(
                &equals,
                ErrorKind::InvalidAssignmentTarget,
                "invalid assignment target",
            )),
        }
    }

    fn equality(&mut self) -> ParseResult<Expr> {
        self.left_assoc(
            Self::xor,
            &[TokenKind::EqualEqual, TokenKind::BangEqual],
            binary,
        )
    }

    fn xor(&mut self) -> ParseResult<Expr> {
        self.left_assoc(Self::or, &[TokenKind::CaretCaret], logical)
    }

    fn or(&mut self) -> ParseResult<Expr> {
        self.left_assoc(Self::and, &[TokenKind::PipePipe], logical)
    }

    fn and(&mut self) -> ParseResult<Expr> {
        self.left_assoc(Self::comparison, &[TokenKind::AmpersandAmpersand], logical)
    }

    fn comparison(&mut self) -> ParseResult<Expr> {
        self.left_assoc(
            Self::term,
            &[
                TokenKind::Greater,
                TokenKind::GreaterEqual,
                TokenKind::Less,
                TokenKind::LessEqual,
            ],
            binary,
        )
    }

    fn term(&mut self) -> ParseResult<Expr> {
        self.left_assoc(
            Self::factor,
            &[TokenKind::Plus, TokenKind::Minus, TokenKind::At],
            binary,
        )
    }

    fn factor(&mut self) -> ParseResult<Expr> {
        self.left_assoc(Self::bitwise, &[TokenKind::Star, TokenKind::Slash], binary)
    }

    fn bitwise(&mut self) -> ParseResult<Expr> {
        self.left_assoc(
            Self::unary,
            &[TokenKind::Ampersand, TokenKind::Pipe, TokenKind::Caret],
            binary,
        )
    }

    /// `operand (op operand)*`, folded to the left.
    fn left_assoc(
        &mut self,
        operand: fn(&mut Self) -> ParseResult<Expr>,
        operators: &[TokenKind],
        build: fn(Expr, TokenKind, Expr) -> Expr,
    ) -> ParseResult<Expr> {
        let mut expr = operand(self)?;
        while let Some(kind) = self.match_any(operators) {
            let right = operand(self)?;
            expr = build(expr, kind, right);
        }
        Ok(expr)
    }

    fn unary(&mut self) -> ParseResult<Expr> {
        let operator = match self.peek().kind {
            TokenKind::Bang => UnaryOp::Not,
            TokenKind::Minus => UnaryOp::Negate,
            _ => return self.call(),
        };
        let start = self.advance().span;
        let operand = self.unary()?;
        Ok(Expr::Unary(UnaryExpr {
            operator,
            span: start.to(operand.span()),
            operand: Box::new(operand),
        }))
    }

    fn call(&mut self) -> ParseResult<Expr> {
        let mut expr = self.primary()?;

        loop {
            if self.match_token(TokenKind::LeftParen) {
                expr = self.finish_call(expr)?;
            } else if self.match_token(TokenKind::Dot) {
                let name = self.expect_identifier("property name after '.'")?;
                let span = expr.span().to(self.previous_span());
                expr = Expr::Get(GetExpr {
                    object: Box::new(expr),
                    name,
                    span,
                });
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> ParseResult<Expr> {
        let mut arguments = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                arguments.push(self.expression()?);
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "')' after arguments")?;
        Ok(Expr::Call(CallExpr {
            span: callee.span().to(self.previous_span()),
            callee: Box::new(callee),
            arguments,
        }))
    }

    fn primary(&mut self) -> ParseResult<Expr> {
        let token = self.peek().clone();
        let value = match (token.kind, token.literal) {
            (TokenKind::Vero, _) => LiteralValue::Bool(true),
            (TokenKind::Falso, _) => LiteralValue::Bool(false),
            (TokenKind::Niente, _) => LiteralValue::Null,
            (TokenKind::Integer, Some(Literal::Integer(n))) => LiteralValue::Integer(n),
            (TokenKind::Float, Some(Literal::Float(n))) => LiteralValue::Float(n),
            (TokenKind::String, Some(Literal::Str(s))) => LiteralValue::Str(s),
            (TokenKind::Questo, _) => {
                self.advance();
                return Ok(Expr::This(ThisExpr { span: token.span }));
            }
            (TokenKind::Super, _) => {
                self.advance();
                self.consume(TokenKind::Dot, "'.' after 'super'")?;
                let method = self.expect_identifier("method name after 'super.'")?;
                return Ok(Expr::Super(SuperExpr {
                    method,
                    span: self.span_from(token.span),
                }));
            }
            (TokenKind::Identifier, _) => {
                self.advance();
                return Ok(Expr::Variable(VariableExpr {
                    name: token.lexeme,
                    span: token.span,
                }));
            }
            (TokenKind::LeftParen, _) => {
                self.advance();
                let expression = Box::new(self.expression()?);
                self.consume(TokenKind::RightParen, "')' after expression")?;
                return Ok(Expr::Grouping(GroupingExpr {
                    expression,
                    span: self.span_from(token.span),
                }));
            }
            _ => {
                return Err(self.error_at_current(
                    ErrorKind::ExpectedExpression,
                    format!("expected expression, found {}", describe(self.peek())),
                ));
            }
        };
        self.advance();
        Ok(Expr::Literal(LiteralExpr {
            value,
            span: token.span,
        }))
    }

    // --- Helper methods ---

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn match_token(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn match_any(&mut self, kinds: &[TokenKind]) -> Option<TokenKind> {
        let kind = self.peek().kind;
        if kinds.contains(&kind) {
            self.advance();
            Some(kind)
        } else {
            None
        }
    }

    fn consume(&mut self, kind: TokenKind, expected: &str) -> ParseResult<&Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error_at_current(
                ErrorKind::ExpectedToken,
                format!("expected {expected}, found {}", describe(self.peek())),
            ))
        }
    }

    fn expect_identifier(&mut self, context: &str) -> ParseResult<String> {
        if self.check(TokenKind::Identifier) {
            Ok(self.advance().lexeme.clone())
        } else {
            Err(self.error_at_current(
                ErrorKind::ExpectedToken,
                format!("expected {context}, found {}", describe(self.peek())),
            ))
        }
    }

    fn error_at(&self, token: &Token, kind: ErrorKind, message: impl Into<String>) -> CompileError {
        let span = Span::new(token.span.offset, token.span.len.max(1), token.line);
        CompileError::parse(kind, message, span)
    }

    fn error_at_current(&self, kind: ErrorKind, message: impl Into<String>) -> CompileError {
        self.error_at(self.peek(), kind, message)
    }

    fn current_span(&self) -> Span {
        self.peek().span
    }

    fn previous_span(&self) -> Span {
        self.previous().span
    }

    fn span_from(&self, start: Span) -> Span {
        start.to(self.previous_span())
    }

    /// Skip tokens until a likely statement boundary.
    ///
    /// Consumes at least one token so the caller makes progress, unless the
    /// failure is at the `}` closing an open block: the block loop consumes
    /// that itself. An `oppure` branch belongs to the `se` being discarded,
    /// so it is skipped as well.
    fn synchronize(&mut self) {
        if self.block_depth > 0 && self.check(TokenKind::RightBrace) {
            return;
        }
        self.advance();
        loop {
            if self.check(TokenKind::Oppure) {
                while self.match_token(TokenKind::Oppure) {
                    self.skip_branch();
                }
                return;
            }
            if self.is_at_end() || self.previous().kind == TokenKind::Semicolon {
                return;
            }
            match self.peek().kind {
                TokenKind::Se
                | TokenKind::Mentre
                | TokenKind::Variabile
                | TokenKind::Funzione
                | TokenKind::Ritorna
                | TokenKind::RightBrace => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Skip one statement: through its `;`, or through the `}` that closes
    /// a block it opens. Stops before a `}` it did not open.
    fn skip_branch(&mut self) {
        let mut depth = 0usize;
        while !self.is_at_end() {
            match self.peek().kind {
                TokenKind::LeftBrace => depth += 1,
                TokenKind::RightBrace if depth == 0 => return,
                TokenKind::RightBrace => {
                    depth -= 1;
                    if depth == 0 {
                        self.advance();
                        return;
                    }
                }
                TokenKind::Semicolon if depth == 0 => {
                    self.advance();
                    return;
                }
                _ => {}
            }
            self.advance();
        }
    }
}

fn describe(token: &Token) -> String {
    if token.kind == TokenKind::Eof {
        "end of input".to_string()
    } else {
        format!("'{}'", token.lexeme)
    }
}

fn binary(left: Expr, kind: TokenKind, right: Expr) -> Expr {
    let operator = match kind {
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Subtract,
        TokenKind::Star => BinaryOp::Multiply,
        TokenKind::Slash => BinaryOp::Divide,
        TokenKind::At => BinaryOp::Concat,
        TokenKind::Ampersand => BinaryOp::BitAnd,
        TokenKind::Pipe => BinaryOp::BitOr,
        TokenKind::Caret => BinaryOp::BitXor,
        TokenKind::EqualEqual => BinaryOp::Equal,
        TokenKind::BangEqual => BinaryOp::NotEqual,
        TokenKind::Less => BinaryOp::Less,
        TokenKind::LessEqual => BinaryOp::LessEqual,
        TokenKind::Greater => BinaryOp::Greater,
        TokenKind::GreaterEqual => BinaryOp::GreaterEqual,
        _ => unreachable!("only called with matched operator tokens"),
    };
    Expr::Binary(BinaryExpr {
        span: left.span().to(right.span()),
        left: Box::new(left),
        operator,
        right: Box::new(right),
    })
}

fn logical(left: Expr, kind: TokenKind, right: Expr) -> Expr {
    let operator = match kind {
        TokenKind::AmpersandAmpersand => LogicalOp::And,
        TokenKind::PipePipe => LogicalOp::Or,
        TokenKind::CaretCaret => LogicalOp::Xor,
        _ => unreachable!("only called with matched operator tokens"),
    };
    Expr::Logical(LogicalExpr {
        span: left.span().to(right.span()),
        left: Box::new(left),
        operator,
        right: Box::new(right),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner;
    use rstest::rstest;

    fn parse_ok(source: &str) -> Vec<Stmt> {
        let tokens = scanner::scan(source).expect("scan should succeed");
        Parser::new(tokens).parse().expect("parse should succeed")
    }

    fn parse_err(source: &str) -> Vec<CompileError> {
        let tokens = scanner::scan(source).expect("scan should succeed");
        Parser::new(tokens).parse().unwrap_err()
    }

    fn parse_sexp(source: &str) -> String {
        let statements = parse_ok(source);
        crate::ast::printer::to_sexp(&statements).trim().to_string()
    }

    #[rstest]
    #[case("1 + 2 * 3;", "(+ 1 (* 2 3))")]
    #[case("(1 + 2) * 3;", "(* (group (+ 1 2)) 3)")]
    #[case("1 - 2 - 3;", "(- (- 1 2) 3)")]
    #[case("2 * 3 & 1;", "(* 2 (& 3 1))")]
    #[case("-1 | 2;", "(| (- 1) 2)")]
    #[case("\"a\" @ \"b\" @ c;", "(@ (@ \"a\" \"b\") c)")]
    #[case("1 < 2 && vero;", "(&& (< 1 2) vero)")]
    #[case("a && b || c;", "(|| (&& a b) c)")]
    #[case("a || b ^^ c;", "(^^ (|| a b) c)")]
    #[case("a == b ^^ c;", "(== a (^^ b c))")]
    #[case("!vero;", "(! vero)")]
    #[case("--1;", "")]
    #[case("- -1;", "(- (- 1))")]
    #[case("1.5;", "1.5")]
    #[case("niente;", "niente")]
    fn expression_precedence(#[case] source: &str, #[case] expected: &str) {
        assert_eq!(parse_sexp(source), expected);
    }

    #[test]
    fn var_declaration() {
        assert_eq!(parse_sexp("variabile x = 42;"), "(variabile x 42)");
        assert_eq!(parse_sexp("variabile x;"), "(variabile x)");
    }

    #[test]
    fn if_else() {
        assert_eq!(
            parse_sexp("se (vero) f(1); oppure f(2);"),
            "(se vero (call f 1) (call f 2))"
        );
    }

    #[test]
    fn while_loop() {
        assert_eq!(
            parse_sexp("mentre (x < 3) { x = x + 1; }"),
            "(mentre (< x 3) (blocco (= x (+ x 1))))"
        );
    }

    #[test]
    fn function_decl() {
        assert_eq!(
            parse_sexp("funzione somma(a, b) { ritorna a + b; }"),
            "(funzione somma (a b) (ritorna (+ a b)))"
        );
    }

    #[test]
    fn bare_return_in_nested_block() {
        assert_eq!(
            parse_sexp("funzione f() { se (vero) { ritorna; } }"),
            "(funzione f () (se vero (blocco (ritorna))))"
        );
    }

    #[test]
    fn function_call_chain() {
        assert_eq!(parse_sexp("f(1, 2)(3);"), "(call (call f 1 2) 3)");
    }

    #[test]
    fn property_access_and_set() {
        assert_eq!(parse_sexp("obj.campo;"), "(. obj campo)");
        assert_eq!(parse_sexp("obj.campo = 42;"), "(.= obj campo 42)");
    }

    #[test]
    fn assignment_is_right_associative() {
        assert_eq!(parse_sexp("a = b = 1;"), "(= a (= b 1))");
    }

    #[test]
    fn questo_and_super() {
        assert_eq!(parse_sexp("questo;"), "questo");
        assert_eq!(parse_sexp("super.metodo;"), "(super metodo)");
    }

    #[test]
    fn invalid_assignment_target() {
        let errors = parse_err("1 + 2 = 3;");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind(), ErrorKind::InvalidAssignmentTarget);
    }

    #[test]
    fn single_error_then_recovery() {
        let tokens = scanner::scan("1 + ;  2 + 3;").unwrap();
        let mut parser = Parser::new(tokens);
        let mut statements = Vec::new();
        while !parser.is_at_end() {
            if let Some(stmt) = parser.recovering_declaration() {
                statements.push(stmt);
            }
        }
        assert_eq!(parser.errors.len(), 1);
        assert_eq!(parser.errors[0].kind(), ErrorKind::ExpectedExpression);
        assert_eq!(statements.len(), 1);
    }

    /// Parse everything, keeping both the statements that survived recovery
    /// and the errors.
    fn parse_recovering(source: &str) -> (Vec<Stmt>, Vec<CompileError>) {
        let tokens = scanner::scan(source).expect("scan should succeed");
        let mut parser = Parser::new(tokens);
        let mut statements = Vec::new();
        while !parser.is_at_end() {
            if let Some(stmt) = parser.recovering_declaration() {
                statements.push(stmt);
            }
        }
        (statements, parser.errors)
    }

    #[rstest]
    #[case("{ x = 1 + }\nScriveLina(2);", 2)]
    #[case("{ { x = } }\nScriveLina(2);", 2)]
    #[case("funzione f() { ritorna 1 + }\nScriveLina(2);", 2)]
    #[case("{ se (vero) }\nScriveLina(2);", 2)]
    fn error_at_closing_brace_keeps_the_block(#[case] source: &str, #[case] statements: usize) {
        let (parsed, errors) = parse_recovering(source);
        assert_eq!(errors.len(), 1, "{errors:?}");
        assert_eq!(errors[0].kind(), ErrorKind::ExpectedExpression);
        assert_eq!(errors[0].line(), 1);
        assert_eq!(parsed.len(), statements);
        assert!(matches!(parsed[statements - 1], Stmt::Expression(_)));
    }

    #[test]
    fn stray_closing_brace_at_top_level_is_skipped() {
        let (parsed, errors) = parse_recovering("}\nvariabile a = 2;");
        assert_eq!(errors.len(), 1);
        assert_eq!(parsed.len(), 1);
    }

    #[rstest]
    #[case("se (vero) 1 + ; oppure 2;\nScriveLina(3);")]
    #[case("se (vero) 1 + ; oppure { 2; 3; }\nScriveLina(3);")]
    #[case("se (vero) 1 + ; oppure se (falso) 2; oppure 4;\nScriveLina(3);")]
    #[case("se (vero) oppure 2;\nScriveLina(3);")]
    #[case("{ se (vero) 1 + ; oppure 2; }\nScriveLina(3);")]
    fn malformed_if_discards_its_else_branch(#[case] source: &str) {
        let (parsed, errors) = parse_recovering(source);
        assert_eq!(errors.len(), 1, "{errors:?}");
        assert!(matches!(parsed.last(), Some(Stmt::Expression(_))));
    }

    #[test]
    fn errors_inside_blocks_are_all_reported() {
        let errors = parse_err("{ variabile = 1; x = ; }\nvariabile y = ;");
        assert_eq!(errors.len(), 3);
        assert_eq!(errors[2].line(), 2);
    }

    #[test]
    fn missing_semicolon() {
        let errors = parse_err("variabile x = 1");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind(), ErrorKind::ExpectedToken);
        assert!(errors[0].message().contains("end of input"));
    }

    #[test]
    fn empty_while_condition() {
        let errors = parse_err("mentre () { }");
        assert_eq!(errors[0].kind(), ErrorKind::MissingWhileCondition);
    }

    #[test]
    fn return_outside_function() {
        let errors = parse_err("ritorna 1;");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind(), ErrorKind::ReturnOutsideFunction);
    }

    #[test]
    fn unclosed_group() {
        let errors = parse_err("(1 + 2;");
        assert_eq!(errors[0].kind(), ErrorKind::ExpectedToken);
    }

    #[test]
    fn spans_cover_statement() {
        let statements = parse_ok("variabile x = 1 + 2;");
        assert_eq!(statements[0].span(), Span::new(0, 20, 1));
    }
}
