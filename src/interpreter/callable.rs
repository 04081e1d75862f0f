use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::ast::FunctionStmt;
use crate::error::RuntimeError;
use crate::interpreter::Interpreter;
use crate::interpreter::environment::Environment;
use crate::interpreter::value::Value;
use crate::stdlib;

/// Anything a call expression can invoke.
#[derive(Debug, Clone)]
pub enum Callable {
    Native(NativeFunction),
    User(UserFunction),
}

impl Callable {
    pub fn name(&self) -> &str {
        match self {
            Self::Native(n) => n.name(),
            Self::User(u) => &u.declaration.name,
        }
    }

    pub fn arity(&self) -> usize {
        match self {
            Self::Native(n) => n.arity(),
            Self::User(u) => u.declaration.params.len(),
        }
    }

    /// Invoke with already-evaluated arguments. The caller checks the arity.
    pub fn call(
        &self,
        interpreter: &mut Interpreter,
        args: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        match self {
            Self::Native(n) => n.call(interpreter, &args),
            Self::User(u) => u.call(interpreter, args),
        }
    }

    /// Identity comparison: two user functions are the same only if they come
    /// from the same declaration evaluated in the same scope.
    pub fn same_as(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Native(a), Self::Native(b)) => a == b,
            (Self::User(a), Self::User(b)) => {
                Rc::ptr_eq(&a.declaration, &b.declaration) && Rc::ptr_eq(&a.closure, &b.closure)
            }
            _ => false,
        }
    }
}

impl fmt::Display for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<funzione {}>", self.name())
    }
}

/// A function declared with `funzione`, closed over the scope it was declared in.
#[derive(Debug, Clone)]
pub struct UserFunction {
    pub declaration: Rc<FunctionStmt>,
    pub closure: Rc<RefCell<Environment>>,
}

impl UserFunction {
    fn call(&self, interpreter: &mut Interpreter, args: Vec<Value>) -> Result<Value, RuntimeError> {
        let env = Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
            &self.closure,
        ))));
        for (param, arg) in self.declaration.params.iter().zip(args) {
            env.borrow_mut().define_or_overwrite(param, arg)?;
        }

        match interpreter.execute_block(&self.declaration.body, env) {
            Ok(()) => Ok(Value::Null),
            Err(RuntimeError::Return { value }) => Ok(value),
            Err(e) => Err(e),
        }
    }
}

/// Functions available in the global scope of every program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::IntoStaticStr, strum::EnumIter)]
pub enum NativeFunction {
    Scrive,
    ScriveLina,
    TipoDiDato,
    TrasformaInIntero,
    TrasformaInVirgola,
    TrasformaInBool,
    TrasformaInStringa,
    TempoMillis,
}

impl NativeFunction {
    pub fn name(&self) -> &'static str {
        self.into()
    }

    pub fn arity(&self) -> usize {
        match self {
            Self::TempoMillis => 0,
            _ => 1,
        }
    }

    pub fn call(&self, interpreter: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
        let arg = || args.first().cloned().unwrap_or(Value::Null);
        match self {
            Self::Scrive => {
                interpreter.write_output(&arg().to_string())?;
                Ok(Value::Null)
            }
            Self::ScriveLina => {
                interpreter.write_output(&format!("{}\n", arg()))?;
                Ok(Value::Null)
            }
            Self::TipoDiDato => Ok(Value::Str(arg().type_name().to_string())),
            Self::TrasformaInIntero => stdlib::to_integer(&arg()).map(Value::Int),
            Self::TrasformaInVirgola => stdlib::to_float(&arg()).map(Value::Float),
            Self::TrasformaInBool => stdlib::to_bool(&arg()).map(Value::Bool),
            Self::TrasformaInStringa => Ok(Value::Str(arg().to_string())),
            Self::TempoMillis => {
                let millis = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_secs_f64() * 1000.0)
                    .unwrap_or_default();
                Ok(Value::Float(millis))
            }
        }
    }
}
