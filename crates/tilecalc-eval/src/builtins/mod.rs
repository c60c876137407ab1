//! Built-in function catalog.

use std::sync::Arc;

use crate::function::Function;

pub mod array;
pub mod info;
pub mod logical;
pub mod math;
pub mod operators;
pub mod volatile;
mod utils;

/// Every built-in, for preloading the registry.
pub fn all() -> Vec<Arc<dyn Function>> {
    let mut all = operators::builtins();
    all.extend(logical::builtins());
    all.extend(math::builtins());
    all.extend(array::builtins());
    all.extend(info::builtins());
    all.extend(volatile::builtins());
    all
}
