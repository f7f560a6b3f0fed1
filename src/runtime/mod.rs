pub mod access;
pub mod arithmetic;
pub mod builtin_functions;
pub mod collection;
pub mod introspection;
pub mod type_casting;

pub use builtin_functions::{self_check, standard, BUILTINS};
