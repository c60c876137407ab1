/// Implements `Function::caps` from a `|`-separated list of flag names.
macro_rules! func_caps {
    ($($flag:ident)|+) => {
        fn caps(&self) -> $crate::function::FnCaps {
            $($crate::function::FnCaps::$flag)|+
        }
    };
}

/// Boxes function values into registry entries.
macro_rules! builtin_list {
    ( $($fn:expr),+ $(,)? ) => {
        vec![ $( std::sync::Arc::new($fn) as std::sync::Arc<dyn $crate::function::Function> ),+ ]
    };
}
