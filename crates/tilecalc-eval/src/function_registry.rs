//! Process-wide function table, keyed by upper-cased name.

use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;

use crate::function::Function;

static REG: Lazy<DashMap<String, Arc<dyn Function>>> = Lazy::new(|| {
    let reg = DashMap::new();
    for f in crate::builtins::all() {
        reg.insert(f.name().to_ascii_uppercase(), f);
    }
    reg
});

/// Add or replace a function. Names are case-insensitive.
pub fn register(f: Arc<dyn Function>) {
    REG.insert(f.name().to_ascii_uppercase(), f);
}

pub fn get(name: &str) -> Option<Arc<dyn Function>> {
    REG.get(&name.to_ascii_uppercase())
        .map(|v| Arc::clone(v.value()))
}

pub fn contains(name: &str) -> bool {
    REG.contains_key(&name.to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_preloaded_and_case_insensitive() {
        assert!(contains("sum"));
        assert_eq!(get("If").map(|f| f.name()), Some("IF"));
        assert!(get("NO_SUCH_FUNCTION").is_none());
    }
}
