//! Parser module for Python test files

pub mod ast_helpers;
pub mod python;

pub use ast_helpers::{
    block_statements, body_block, call_name, descendants, is_docstring_expression, node_line,
    node_text,
};
pub use python::PythonParser;
