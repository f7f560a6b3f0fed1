use crate::error::Result;
use crate::resolver::Argument;
use crate::types::Document;
use serde_json::Value;

/// Supplies the identity of the caller for ownership checks.
pub trait Visitor: Send + Sync {
    /// Id of the logged-in visitor, `None` when anonymous
    fn visitor_id(&self) -> Option<i64>;
}

/// What a function runs against: the enclosing document and, when known,
/// the caller.
pub struct Scope<'a> {
    pub document: &'a mut Document,
    pub visitor: Option<&'a dyn Visitor>,
}

impl<'a> Scope<'a> {
    pub fn new(document: &'a mut Document) -> Self {
        Self { document, visitor: None }
    }

    pub fn with_visitor(mut self, visitor: &'a dyn Visitor) -> Self {
        self.visitor = Some(visitor);
        self
    }
}

/// Trait for implementing functions callable from call expressions
///
/// # Example
/// ```rust
/// use jfunc::custom::{CustomFunction, Scope};
/// use jfunc::resolver::Argument;
/// use jfunc::Error;
/// use serde_json::Value;
///
/// struct DoubleFunction;
///
/// impl CustomFunction for DoubleFunction {
///     fn name(&self) -> &str { "double" }
///     fn arity(&self) -> usize { 1 }
///
///     fn execute(&self, _scope: &mut Scope<'_>, args: &[Argument]) -> Result<Value, Error> {
///         Ok(Value::from(args[0].as_f64() * 2.0))
///     }
/// }
/// ```
pub trait CustomFunction: Send + Sync {
    /// The name of the function (case-sensitive)
    fn name(&self) -> &str;

    /// Exact number of arguments; overloads are registered separately
    fn arity(&self) -> usize;

    /// Execute with arguments already resolved against `scope.document`.
    /// The invoker guarantees `args.len() == self.arity()`.
    fn execute(&self, scope: &mut Scope<'_>, args: &[Argument]) -> Result<Value>;

    /// Optional: Description of the function for documentation
    fn description(&self) -> Option<&str> {
        None
    }

    /// Optional: Example usage for documentation
    fn example(&self) -> Option<&str> {
        None
    }
}

pub type Handler = fn(&mut Scope<'_>, &[Argument]) -> Result<Value>;

/// A built-in function backed by a plain function pointer.
#[derive(Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    pub arity: usize,
    pub handler: Handler,
    pub description: &'static str,
    pub example: &'static str,
}

impl CustomFunction for Builtin {
    fn name(&self) -> &str {
        self.name
    }

    fn arity(&self) -> usize {
        self.arity
    }

    fn execute(&self, scope: &mut Scope<'_>, args: &[Argument]) -> Result<Value> {
        (self.handler)(scope, args)
    }

    fn description(&self) -> Option<&str> {
        Some(self.description)
    }

    fn example(&self) -> Option<&str> {
        Some(self.example)
    }
}
