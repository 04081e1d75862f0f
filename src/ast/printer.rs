use crate::ast::*;

/// Render a program as S-expressions, one top-level statement per line.
pub fn to_sexp(statements: &[Stmt]) -> String {
    let mut buf = String::new();
    for stmt in statements {
        sexp_stmt(&mut buf, stmt);
        buf.push('\n');
    }
    buf
}

pub fn to_json(statements: &[Stmt]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(statements)
}

fn sexp_stmt(buf: &mut String, stmt: &Stmt) {
    match stmt {
        Stmt::Expression(e) => sexp_expr(buf, &e.expression),
        Stmt::Var(v) => {
            buf.push_str("(variabile ");
            buf.push_str(&v.name);
            if let Some(ref init) = v.initializer {
                buf.push(' ');
                sexp_expr(buf, init);
            }
            buf.push(')');
        }
        Stmt::Block(b) => {
            buf.push_str("(blocco");
            sexp_body(buf, &b.statements);
            buf.push(')');
        }
        Stmt::If(i) => {
            buf.push_str("(se ");
            sexp_expr(buf, &i.condition);
            buf.push(' ');
            sexp_stmt(buf, &i.then_branch);
            if let Some(ref else_branch) = i.else_branch {
                buf.push(' ');
                sexp_stmt(buf, else_branch);
            }
            buf.push(')');
        }
        Stmt::While(w) => {
            buf.push_str("(mentre ");
            sexp_expr(buf, &w.condition);
            buf.push(' ');
            sexp_stmt(buf, &w.body);
            buf.push(')');
        }
        Stmt::Function(f) => {
            buf.push_str("(funzione ");
            buf.push_str(&f.name);
            buf.push_str(" (");
            buf.push_str(&f.params.join(" "));
            buf.push(')');
            sexp_body(buf, &f.body);
            buf.push(')');
        }
        Stmt::Return(r) => {
            buf.push_str("(ritorna");
            if let Some(ref value) = r.value {
                buf.push(' ');
                sexp_expr(buf, value);
            }
            buf.push(')');
        }
    }
}

fn sexp_body(buf: &mut String, statements: &[Stmt]) {
    for stmt in statements {
        buf.push(' ');
        sexp_stmt(buf, stmt);
    }
}

fn sexp_expr(buf: &mut String, expr: &Expr) {
    match expr {
        Expr::Binary(b) => sexp_infix(buf, &b.operator.to_string(), &b.left, &b.right),
        Expr::Logical(l) => sexp_infix(buf, &l.operator.to_string(), &l.left, &l.right),
        Expr::Unary(u) => {
            buf.push('(');
            buf.push_str(&u.operator.to_string());
            buf.push(' ');
            sexp_expr(buf, &u.operand);
            buf.push(')');
        }
        Expr::Literal(l) => match &l.value {
            LiteralValue::Integer(n) => buf.push_str(&n.to_string()),
            LiteralValue::Float(n) => buf.push_str(&format!("{n:?}")),
            LiteralValue::Str(s) => {
                buf.push('"');
                buf.push_str(s);
                buf.push('"');
            }
            LiteralValue::Bool(b) => buf.push_str(if *b { "vero" } else { "falso" }),
            LiteralValue::Null => buf.push_str("niente"),
        },
        Expr::Grouping(g) => {
            buf.push_str("(group ");
            sexp_expr(buf, &g.expression);
            buf.push(')');
        }
        Expr::Variable(v) => buf.push_str(&v.name),
        Expr::Assign(a) => {
            buf.push_str("(= ");
            buf.push_str(&a.name);
            buf.push(' ');
            sexp_expr(buf, &a.value);
            buf.push(')');
        }
        Expr::Call(c) => {
            buf.push_str("(call ");
            sexp_expr(buf, &c.callee);
            for arg in &c.arguments {
                buf.push(' ');
                sexp_expr(buf, arg);
            }
            buf.push(')');
        }
        Expr::Get(g) => {
            buf.push_str("(. ");
            sexp_expr(buf, &g.object);
            buf.push(' ');
            buf.push_str(&g.name);
            buf.push(')');
        }
        Expr::Set(s) => {
            buf.push_str("(.= ");
            sexp_expr(buf, &s.object);
            buf.push(' ');
            buf.push_str(&s.name);
            buf.push(' ');
            sexp_expr(buf, &s.value);
            buf.push(')');
        }
        Expr::This(_) => buf.push_str("questo"),
        Expr::Super(s) => {
            buf.push_str("(super ");
            buf.push_str(&s.method);
            buf.push(')');
        }
    }
}

fn sexp_infix(buf: &mut String, operator: &str, left: &Expr, right: &Expr) {
    buf.push('(');
    buf.push_str(operator);
    buf.push(' ');
    sexp_expr(buf, left);
    buf.push(' ');
    sexp_expr(buf, right);
    buf.push(')');
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(n: i64, offset: usize) -> Expr {
        Expr::Literal(LiteralExpr {
            value: LiteralValue::Integer(n),
            span: Span::new(offset, 1, 1),
        })
    }

    #[test]
    fn sexp_binary_expression() {
        let statements = vec![Stmt::Expression(ExprStmt {
            expression: Expr::Binary(BinaryExpr {
                left: Box::new(int(1, 0)),
                operator: BinaryOp::Add,
                right: Box::new(Expr::Binary(BinaryExpr {
                    left: Box::new(int(2, 4)),
                    operator: BinaryOp::Multiply,
                    right: Box::new(int(3, 8)),
                    span: Span::new(4, 5, 1),
                })),
                span: Span::new(0, 9, 1),
            }),
            span: Span::new(0, 10, 1),
        })];
        assert_eq!(to_sexp(&statements).trim(), "(+ 1 (* 2 3))");
    }

    #[test]
    fn sexp_function_and_literals() {
        let statements = vec![Stmt::Function(FunctionStmt {
            name: "f".to_string(),
            params: vec!["a".to_string(), "b".to_string()],
            body: vec![Stmt::Return(ReturnStmt {
                value: Some(Expr::Logical(LogicalExpr {
                    left: Box::new(Expr::Literal(LiteralExpr {
                        value: LiteralValue::Bool(true),
                        span: Span::new(0, 4, 1),
                    })),
                    operator: LogicalOp::Xor,
                    right: Box::new(Expr::Literal(LiteralExpr {
                        value: LiteralValue::Float(2.0),
                        span: Span::new(8, 3, 1),
                    })),
                    span: Span::new(0, 11, 1),
                })),
                span: Span::new(0, 12, 1),
            })],
            span: Span::new(0, 20, 1),
        })];
        assert_eq!(
            to_sexp(&statements).trim(),
            "(funzione f (a b) (ritorna (^^ vero 2.0)))"
        );
    }

    #[test]
    fn json_output_is_valid() {
        let statements = vec![Stmt::Var(VarStmt {
            name: "x".to_string(),
            initializer: Some(int(42, 14)),
            span: Span::new(0, 17, 1),
        })];
        let json = to_json(&statements).expect("AST should serialize");
        let parsed: serde_json::Value =
            serde_json::from_str(&json).expect("JSON output should be valid");
        assert_eq!(parsed[0]["type"], "Var");
        assert_eq!(parsed[0]["name"], "x");
        assert_eq!(parsed[0]["initializer"]["value"]["Integer"], 42);
        assert_eq!(parsed[0]["span"]["line"], 1);
    }
}
