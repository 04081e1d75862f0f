use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use strum::IntoEnumIterator;

use crate::error::{ErrorKind, RuntimeError};
use crate::interpreter::callable::{Callable, NativeFunction};
use crate::interpreter::value::Value;
use crate::scanner::token::is_reserved;

/// One scope of variable bindings, linked to the scope that encloses it.
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Outermost scope, holding the built-in functions.
    pub fn globals() -> Self {
        let values = NativeFunction::iter()
            .map(|native| {
                (
                    native.name().to_string(),
                    Value::Function(Callable::Native(native)),
                )
            })
            .collect();
        Self {
            values,
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Self {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Bind `name` in this scope, replacing any binding it already has here.
    pub fn define_or_overwrite(&mut self, name: &str, value: Value) -> Result<(), RuntimeError> {
        if is_reserved(name) {
            return Err(RuntimeError::new(
                ErrorKind::ReservedKeyword,
                format!("'{name}' is a reserved word"),
            ));
        }
        self.values.insert(name.to_string(), value);
        Ok(())
    }

    pub fn get_value(&self, name: &str) -> Result<Value, RuntimeError> {
        if let Some(value) = self.values.get(name) {
            return Ok(value.clone());
        }
        match self.enclosing {
            Some(ref enclosing) => enclosing.borrow().get_value(name),
            None => Err(undefined(name)),
        }
    }

    /// Update the nearest binding of `name`. The new value must have the same
    /// type as the old one, unless the old one is `niente`.
    pub fn assign_if_exists(&mut self, name: &str, value: Value) -> Result<(), RuntimeError> {
        if let Some(current) = self.values.get_mut(name) {
            if !matches!(current, Value::Null) && !current.same_type(&value) {
                return Err(RuntimeError::new(
                    ErrorKind::UndefinedVariable,
                    format!(
                        "cannot assign a value of type {} to '{name}', which holds type {}",
                        value.type_name(),
                        current.type_name()
                    ),
                ));
            }
            *current = value;
            return Ok(());
        }
        match self.enclosing {
            Some(ref enclosing) => enclosing.borrow_mut().assign_if_exists(name, value),
            None => Err(undefined(name)),
        }
    }
}

fn undefined(name: &str) -> RuntimeError {
    RuntimeError::new(
        ErrorKind::UndefinedVariable,
        format!("undefined variable '{name}'"),
    )
}
