use crate::ast::CallExpression;
use crate::custom::Scope;
use crate::error::Result;
use crate::parser::Parser;
use crate::registry::Snapshot;
use crate::resolver::{self, Argument};
use serde_json::Value;

/// Run the built-in `name` with already resolved arguments.
///
/// The overload is chosen by exact arity; a count no overload declares is
/// an `ArityMismatch`. Remote descriptors are not executable on their own:
/// a name with only a descriptor is an `UnknownFunction` here.
pub fn invoke(snapshot: &Snapshot, name: &str, args: &[Argument], scope: &mut Scope<'_>) -> Result<Value> {
    let function = snapshot.function(name, args.len())?;
    function.execute(scope, args)
}

/// Resolve the arguments of `expr` against the scope's document, then invoke.
pub fn invoke_expression(snapshot: &Snapshot, expr: &CallExpression, scope: &mut Scope<'_>) -> Result<Value> {
    let args = resolver::resolve(&expr.args, scope.document);
    log::debug!("invoking {} with {} argument(s)", expr, args.len());
    invoke(snapshot, &expr.name, &args, scope)
}

/// Parse, resolve and invoke a call expression string.
pub fn call(snapshot: &Snapshot, expr: &str, scope: &mut Scope<'_>) -> Result<Value> {
    let parsed = Parser::new(expr).parse()?;
    invoke_expression(snapshot, &parsed, scope)
}
