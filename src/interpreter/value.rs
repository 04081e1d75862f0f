use std::fmt;

use crate::interpreter::callable::Callable;

#[derive(Clone, Debug)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Function(Callable),
}

impl Value {
    /// Only `falso` is false; `niente`, zero and the empty string are true.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Self::Bool(false))
    }

    /// Values of different types are never equal, so `1 == 1.0` is false.
    pub fn is_equal(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Function(a), Self::Function(b)) => a.same_as(b),
            _ => false,
        }
    }

    /// Name of the value's runtime type, as reported by `TipoDiDato`.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "Niente",
            Self::Bool(_) => "Booleano",
            Self::Int(_) => "Intero",
            Self::Float(_) => "Virgola",
            Self::Str(_) => "Stringa",
            Self::Function(_) => "Funzione",
        }
    }

    pub fn same_type(&self, other: &Self) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "niente"),
            Self::Bool(true) => write!(f, "vero"),
            Self::Bool(false) => write!(f, "falso"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(n) => write_float(f, *n),
            Self::Str(s) => write!(f, "{s}"),
            Self::Function(func) => write!(f, "{func}"),
        }
    }
}

/// Plain decimal notation with at least one fractional digit, so that every
/// finite value reads back through `TrasformaInVirgola`. Infinities and NaN
/// have no literal form and print as `inf`, `-inf` and `NaN`.
fn write_float(f: &mut fmt::Formatter<'_>, n: f64) -> fmt::Result {
    if !n.is_finite() {
        return write!(f, "{n}");
    }
    let digits = n.to_string();
    if digits.contains('.') {
        f.write_str(&digits)
    } else {
        write!(f, "{digits}.0")
    }
}
