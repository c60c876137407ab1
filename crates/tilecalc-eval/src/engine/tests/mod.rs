mod array_formulas;
mod common;
mod row_operations;
mod support_sets;
