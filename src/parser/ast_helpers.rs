//! Helpers for walking tree-sitter Python syntax trees.
//!
//! The detector threads explicit accumulators through these traversals
//! instead of holding shared mutable state, so per-file analysis can run in
//! parallel.

use tree_sitter::Node;

/// Source text covered by a node.
pub fn node_text<'a>(node: Node<'_>, source: &'a str) -> &'a str {
    &source[node.byte_range()]
}

/// 1-indexed line of a node's start.
pub fn node_line(node: Node<'_>) -> usize {
    node.start_position().row + 1
}

/// All descendants of `node` in preorder, excluding `node` itself.
pub fn descendants<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut out = Vec::new();
    collect(node, &mut out);
    out
}

fn collect<'t>(node: Node<'t>, out: &mut Vec<Node<'t>>) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        out.push(child);
        collect(child, out);
    }
}

/// The `block` child holding a function or class body.
pub fn body_block<'t>(definition: Node<'t>) -> Option<Node<'t>> {
    definition.child_by_field_name("body")
}

/// Named statements of a body block, skipping comments.
pub fn block_statements<'t>(block: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = block.walk();
    block
        .named_children(&mut cursor)
        .filter(|n| n.kind() != "comment")
        .collect()
}

/// True when a statement is an expression statement wrapping a bare string
/// (the docstring shape).
pub fn is_docstring_expression(statement: Node<'_>) -> bool {
    statement.kind() == "expression_statement"
        && statement.named_child_count() == 1
        && statement
            .named_child(0)
            .is_some_and(|n| n.kind() == "string")
}

/// Name of the function being called, when the callee is a plain identifier
/// or an attribute access (`obj.method` yields `method`).
pub fn call_name<'a>(call: Node<'_>, source: &'a str) -> Option<&'a str> {
    let func = call.child_by_field_name("function")?;
    match func.kind() {
        "identifier" => Some(node_text(func, source)),
        "attribute" => func
            .child_by_field_name("attribute")
            .map(|attr| node_text(attr, source)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::PythonParser;

    fn parse(source: &str) -> tree_sitter::Tree {
        PythonParser::new().unwrap().parse(source).unwrap()
    }

    #[test]
    fn descendants_covers_nested_nodes() {
        let source = "def f():\n    if True:\n        x = 1\n";
        let tree = parse(source);
        let nodes = descendants(tree.root_node());
        assert!(nodes.iter().any(|n| n.kind() == "if_statement"));
        assert!(nodes.iter().any(|n| n.kind() == "assignment"));
    }

    #[test]
    fn docstring_expression_detected() {
        let source = "def f():\n    \"\"\"doc only\"\"\"\n";
        let tree = parse(source);
        let func = descendants(tree.root_node())
            .into_iter()
            .find(|n| n.kind() == "function_definition")
            .unwrap();
        let body = body_block(func).unwrap();
        let stmts = block_statements(body);
        assert_eq!(stmts.len(), 1);
        assert!(is_docstring_expression(stmts[0]));
    }

    #[test]
    fn call_name_handles_attribute_calls() {
        let source = "time.sleep(1)\nprint('x')\n";
        let tree = parse(source);
        let calls: Vec<_> = descendants(tree.root_node())
            .into_iter()
            .filter(|n| n.kind() == "call")
            .collect();
        let names: Vec<_> = calls
            .iter()
            .filter_map(|c| call_name(*c, source))
            .collect();
        assert!(names.contains(&"sleep"));
        assert!(names.contains(&"print"));
    }

    #[test]
    fn node_line_is_one_indexed() {
        let source = "x = 1\ny = 2\n";
        let tree = parse(source);
        let assigns: Vec<_> = descendants(tree.root_node())
            .into_iter()
            .filter(|n| n.kind() == "assignment")
            .collect();
        assert_eq!(node_line(assigns[0]), 1);
        assert_eq!(node_line(assigns[1]), 2);
    }
}
