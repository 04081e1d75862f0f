pub mod callable;
pub mod environment;
pub mod value;

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use tracing::debug;

use crate::ast::*;
use crate::error::{ErrorKind, RuntimeError};
use crate::interpreter::callable::{Callable, UserFunction};
use crate::interpreter::environment::Environment;
use crate::interpreter::value::Value;

type EvalResult<T> = Result<T, RuntimeError>;

/// Tree-walking evaluator.
///
/// The current environment persists between calls to [`Interpreter::interpret`],
/// so a prompt can feed a program to it one line at a time.
pub struct Interpreter {
    environment: Rc<RefCell<Environment>>,
    /// Destination for `Scrive` and `ScriveLina`.
    writer: Box<dyn Write>,
    /// Copy of everything written to `writer`, kept only when capturing.
    output: Option<String>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_writer(Box::new(std::io::stdout()))
    }

    pub fn with_writer(writer: Box<dyn Write>) -> Self {
        Self {
            environment: Rc::new(RefCell::new(Environment::globals())),
            writer,
            output: None,
        }
    }

    /// Interpreter whose output only lands in [`Interpreter::output`].
    pub fn capturing() -> Self {
        Self {
            output: Some(String::new()),
            ..Self::with_writer(Box::new(std::io::sink()))
        }
    }

    pub fn interpret(&mut self, statements: &[Stmt]) -> EvalResult<()> {
        debug!(statements = statements.len(), "interpreting");
        for stmt in statements {
            self.execute(stmt)?;
        }
        Ok(())
    }

    /// Everything the program has printed so far. Always empty unless the
    /// interpreter was built with [`Interpreter::capturing`].
    pub fn output(&self) -> &str {
        self.output.as_deref().unwrap_or_default()
    }

    pub(crate) fn write_output(&mut self, text: &str) -> EvalResult<()> {
        self.writer
            .write_all(text.as_bytes())
            .and_then(|()| self.writer.flush())
            .map_err(|e| {
                RuntimeError::new(ErrorKind::OutputFailed, format!("failed to write output: {e}"))
            })?;
        if let Some(output) = &mut self.output {
            output.push_str(text);
        }
        Ok(())
    }

    fn execute(&mut self, stmt: &Stmt) -> EvalResult<()> {
        match stmt {
            Stmt::Expression(e) => {
                self.evaluate(&e.expression)?;
                Ok(())
            }
            Stmt::Var(v) => {
                let value = match &v.initializer {
                    Some(init) => self.evaluate(init)?,
                    None => Value::Null,
                };
                self.environment
                    .borrow_mut()
                    .define_or_overwrite(&v.name, value)
                    .map_err(|e| e.at_line(v.span.line))
            }
            Stmt::Block(b) => {
                let env = Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
                    &self.environment,
                ))));
                self.execute_block(&b.statements, env)
            }
            Stmt::If(i) => {
                if self.evaluate(&i.condition)?.is_truthy() {
                    self.execute(&i.then_branch)
                } else if let Some(ref else_branch) = i.else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(())
                }
            }
            Stmt::While(w) => {
                loop {
                    let condition = self.evaluate(&w.condition)?;
                    if matches!(condition, Value::Null) {
                        return Err(RuntimeError::with_line(
                            ErrorKind::MissingWhileCondition,
                            "'mentre' condition evaluated to niente",
                            w.condition.line(),
                        ));
                    }
                    if !condition.is_truthy() {
                        return Ok(());
                    }
                    self.execute(&w.body)?;
                }
            }
            Stmt::Function(f) => {
                let function = UserFunction {
                    declaration: Rc::new(f.clone()),
                    closure: Rc::clone(&self.environment),
                };
                self.environment
                    .borrow_mut()
                    .define_or_overwrite(&f.name, Value::Function(Callable::User(function)))
                    .map_err(|e| e.at_line(f.span.line))
            }
            Stmt::Return(r) => {
                let value = match &r.value {
                    Some(value) => self.evaluate(value)?,
                    None => Value::Null,
                };
                Err(RuntimeError::Return { value })
            }
        }
    }

    /// Run `statements` in `env`, then restore the previous environment
    /// whether or not they succeeded.
    pub(crate) fn execute_block(
        &mut self,
        statements: &[Stmt],
        env: Rc<RefCell<Environment>>,
    ) -> EvalResult<()> {
        let previous = std::mem::replace(&mut self.environment, env);
        let result = statements.iter().try_for_each(|s| self.execute(s));
        self.environment = previous;
        result
    }

    fn evaluate(&mut self, expr: &Expr) -> EvalResult<Value> {
        match expr {
            Expr::Literal(l) => Ok(match &l.value {
                LiteralValue::Integer(n) => Value::Int(*n),
                LiteralValue::Float(n) => Value::Float(*n),
                LiteralValue::Str(s) => Value::Str(s.clone()),
                LiteralValue::Bool(b) => Value::Bool(*b),
                LiteralValue::Null => Value::Null,
            }),
            Expr::Grouping(g) => self.evaluate(&g.expression),
            Expr::Unary(u) => {
                let operand = self.evaluate(&u.operand)?;
                match (u.operator, operand) {
                    (UnaryOp::Negate, Value::Int(n)) => Ok(Value::Int(n.wrapping_neg())),
                    (UnaryOp::Negate, Value::Float(n)) => Ok(Value::Float(-n)),
                    (UnaryOp::Negate, other) => Err(RuntimeError::with_line(
                        ErrorKind::MismatchedType,
                        format!("cannot negate a value of type {}", other.type_name()),
                        u.span.line,
                    )),
                    (UnaryOp::Not, operand) => Ok(Value::Bool(!operand.is_truthy())),
                }
            }
            Expr::Binary(b) => self.evaluate_binary(b),
            Expr::Logical(l) => self.evaluate_logical(l),
            Expr::Variable(v) => self
                .environment
                .borrow()
                .get_value(&v.name)
                .map_err(|e| e.at_line(v.span.line)),
            Expr::Assign(a) => {
                let value = self.evaluate(&a.value)?;
                self.environment
                    .borrow_mut()
                    .assign_if_exists(&a.name, value.clone())
                    .map_err(|e| e.at_line(a.span.line))?;
                Ok(value)
            }
            Expr::Call(c) => self.evaluate_call(c),
            Expr::Get(g) => {
                let object = self.evaluate(&g.object)?;
                Err(no_properties(&object, &g.name, g.span.line))
            }
            Expr::Set(s) => {
                let object = self.evaluate(&s.object)?;
                Err(no_properties(&object, &s.name, s.span.line))
            }
            Expr::This(t) => self
                .environment
                .borrow()
                .get_value("questo")
                .map_err(|e| e.at_line(t.span.line)),
            Expr::Super(s) => self
                .environment
                .borrow()
                .get_value("super")
                .map_err(|e| e.at_line(s.span.line)),
        }
    }

    fn evaluate_binary(&mut self, b: &BinaryExpr) -> EvalResult<Value> {
        let left = self.evaluate(&b.left)?;
        let right = self.evaluate(&b.right)?;

        let result = match b.operator {
            BinaryOp::Equal => Some(Value::Bool(left.is_equal(&right))),
            BinaryOp::NotEqual => Some(Value::Bool(!left.is_equal(&right))),
            BinaryOp::Less | BinaryOp::LessEqual | BinaryOp::Greater | BinaryOp::GreaterEqual => {
                compare(b.operator, &left, &right)
            }
            _ => arithmetic(b.operator, &left, &right),
        };

        result.ok_or_else(|| {
            RuntimeError::with_line(
                ErrorKind::MismatchedType,
                format!(
                    "operator '{}' cannot be applied to {} and {}",
                    b.operator,
                    left.type_name(),
                    right.type_name()
                ),
                b.span.line,
            )
        })
    }

    /// `&&` and `||` skip the right operand once the left one decides the
    /// result; `^^` always needs both.
    fn evaluate_logical(&mut self, l: &LogicalExpr) -> EvalResult<Value> {
        let left = self.evaluate(&l.left)?;
        let left = expect_bool(l, &left)?;

        match (l.operator, left) {
            (LogicalOp::And, false) => return Ok(Value::Bool(false)),
            (LogicalOp::Or, true) => return Ok(Value::Bool(true)),
            _ => {}
        }

        let right = self.evaluate(&l.right)?;
        let right = expect_bool(l, &right)?;
        Ok(Value::Bool(match l.operator {
            LogicalOp::And | LogicalOp::Or => right,
            LogicalOp::Xor => left ^ right,
        }))
    }

    fn evaluate_call(&mut self, c: &CallExpr) -> EvalResult<Value> {
        let callee = self.evaluate(&c.callee)?;

        let mut args = Vec::with_capacity(c.arguments.len());
        for arg in &c.arguments {
            args.push(self.evaluate(arg)?);
        }

        let function = match callee {
            Value::Function(function) => function,
            other => {
                return Err(RuntimeError::with_line(
                    ErrorKind::NotCallable,
                    format!("a value of type {} is not callable", other.type_name()),
                    c.span.line,
                ));
            }
        };
        if args.len() != function.arity() {
            return Err(RuntimeError::with_line(
                ErrorKind::ArityMismatch,
                format!(
                    "'{}' expects {} argument(s) but got {}",
                    function.name(),
                    function.arity(),
                    args.len()
                ),
                c.span.line,
            ));
        }

        debug!(function = function.name(), line = c.span.line, "call");
        function
            .call(self, args)
            .map_err(|e| e.at_line(c.span.line))
    }
}

fn arithmetic(op: BinaryOp, left: &Value, right: &Value) -> Option<Value> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => integer_op(op, *a, *b),
        (Value::Float(a), Value::Float(b)) => float_op(op, *a, *b).map(Value::Float),
        (Value::Str(a), Value::Str(b)) if op == BinaryOp::Concat => {
            Some(Value::Str(format!("{a}{b}")))
        }
        _ => None,
    }
}

/// Integer arithmetic wraps on overflow; division always yields a float.
fn integer_op(op: BinaryOp, a: i64, b: i64) -> Option<Value> {
    let n = match op {
        BinaryOp::Add => a.wrapping_add(b),
        BinaryOp::Subtract => a.wrapping_sub(b),
        BinaryOp::Multiply => a.wrapping_mul(b),
        BinaryOp::Divide => return Some(Value::Float(a as f64 / b as f64)),
        BinaryOp::BitAnd => a & b,
        BinaryOp::BitOr => a | b,
        BinaryOp::BitXor => a ^ b,
        _ => return None,
    };
    Some(Value::Int(n))
}

fn float_op(op: BinaryOp, a: f64, b: f64) -> Option<f64> {
    match op {
        BinaryOp::Add => Some(a + b),
        BinaryOp::Subtract => Some(a - b),
        BinaryOp::Multiply => Some(a * b),
        BinaryOp::Divide => Some(a / b),
        _ => None,
    }
}

fn compare(op: BinaryOp, left: &Value, right: &Value) -> Option<Value> {
    let ordering = match (left, right) {
        (Value::Int(a), Value::Int(b)) => a.partial_cmp(b),
        (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
        _ => return None,
    };
    // NaN compares false against everything.
    let result = ordering.is_some_and(|ord| match op {
        BinaryOp::Less => ord.is_lt(),
        BinaryOp::LessEqual => ord.is_le(),
        BinaryOp::Greater => ord.is_gt(),
        _ => ord.is_ge(),
    });
    Some(Value::Bool(result))
}

fn expect_bool(l: &LogicalExpr, value: &Value) -> EvalResult<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        other => Err(RuntimeError::with_line(
            ErrorKind::MismatchedType,
            format!(
                "operator '{}' needs Booleano operands, found {}",
                l.operator,
                other.type_name()
            ),
            l.span.line,
        )),
    }
}

fn no_properties(object: &Value, name: &str, line: usize) -> RuntimeError {
    RuntimeError::with_line(
        ErrorKind::InvalidPropertyAccess,
        format!(
            "cannot access property '{name}' on a value of type {}",
            object.type_name()
        ),
        line,
    )
}
