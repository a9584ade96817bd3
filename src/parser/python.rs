//! Python parser using tree-sitter

use anyhow::{Context, Result};
use tree_sitter::{Language, Parser, Tree};

/// Parser for Python files using tree-sitter
pub struct PythonParser {
    parser: Parser,
}

impl PythonParser {
    /// Create a new Python parser
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        let language: Language = tree_sitter_python::LANGUAGE.into();
        parser
            .set_language(&language)
            .context("Failed to set Python language")?;
        Ok(Self { parser })
    }

    /// Parse source code into a syntax tree
    pub fn parse(&mut self, source: &str) -> Result<Tree> {
        self.parser
            .parse(source, None)
            .context("Failed to parse Python source")
    }

    /// Get the tree-sitter language for Python
    pub fn language() -> Language {
        tree_sitter_python::LANGUAGE.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple() {
        let mut parser = PythonParser::new().unwrap();
        let tree = parser.parse("x = 1\n").unwrap();
        assert!(!tree.root_node().has_error());
    }

    #[test]
    fn parse_test_function() {
        let mut parser = PythonParser::new().unwrap();
        let source = "def test_add():\n    assert 1 + 1 == 2\n";
        let tree = parser.parse(source).unwrap();
        assert!(!tree.root_node().has_error());
    }

    #[test]
    fn parse_class_with_methods() {
        let mut parser = PythonParser::new().unwrap();
        let source = "class TestFoo:\n    def setUp(self):\n        self.x = 1\n\n    def test_x(self):\n        assert self.x == 1\n";
        let tree = parser.parse(source).unwrap();
        assert!(!tree.root_node().has_error());
    }
}
