//! Class-scope smell checks: Constructor Initialization, General Fixture,
//! Test Maverick, Lack of Cohesion of Test Cases.

use super::{function_name, is_test_name, CheckContext, SETUP_HOOKS};
use crate::parser::{block_statements, body_block, descendants, node_line, node_text};
use crate::{SmellInstance, SmellType};
use std::collections::BTreeSet;
use tree_sitter::Node;

/// Run every class-scope check against one `class_definition` node, in a
/// fixed order.
pub fn analyze_class(class_node: Node<'_>, ctx: &CheckContext<'_>) -> Vec<SmellInstance> {
    let methods = class_methods(class_node, ctx.source);
    let test_methods: Vec<&Method<'_>> = methods
        .iter()
        .filter(|m| is_test_name(m.name))
        .collect();

    let mut smells = Vec::new();
    smells.extend(check_constructor_initialization(class_node, &methods, ctx));
    smells.extend(check_general_fixture(&methods, ctx));
    smells.extend(check_test_maverick(class_node, &test_methods, ctx));
    smells.extend(check_lack_of_cohesion(class_node, &test_methods, ctx));
    smells
}

struct Method<'t> {
    name: &'t str,
    node: Node<'t>,
}

/// Direct methods of a class body (ignores nested classes and functions
/// defined inside methods).
fn class_methods<'t>(class_node: Node<'t>, source: &'t str) -> Vec<Method<'t>> {
    let Some(body) = body_block(class_node) else {
        return Vec::new();
    };
    block_statements(body)
        .into_iter()
        .filter_map(|stmt| match stmt.kind() {
            "function_definition" => Some(stmt),
            // @decorator\ndef method(...)
            "decorated_definition" => stmt
                .child_by_field_name("definition")
                .filter(|d| d.kind() == "function_definition"),
            _ => None,
        })
        .filter_map(|node| {
            function_name(node, source).map(|name| Method { name, node })
        })
        .collect()
}

/// CI: a test class initializes state in `__init__` instead of a dedicated
/// setup hook.
fn check_constructor_initialization(
    class_node: Node<'_>,
    methods: &[Method<'_>],
    ctx: &CheckContext<'_>,
) -> Vec<SmellInstance> {
    if methods.iter().any(|m| m.name == "__init__") {
        vec![SmellInstance {
            smell_type: SmellType::ConstructorInitialization,
            file: ctx.file.to_string(),
            line: node_line(class_node),
            message: "__init__ used in test class instead of a setup hook".to_string(),
        }]
    } else {
        Vec::new()
    }
}

/// GF: a setup hook binds more state than any single test needs.
fn check_general_fixture(methods: &[Method<'_>], ctx: &CheckContext<'_>) -> Vec<SmellInstance> {
    let limit = ctx.thresholds.general_fixture_max_bindings;
    let mut smells = Vec::new();
    for method in methods.iter().filter(|m| SETUP_HOOKS.contains(&m.name)) {
        let bindings = descendants(method.node)
            .into_iter()
            .filter(|n| n.kind() == "assignment")
            .count();
        if bindings > limit {
            smells.push(SmellInstance {
                smell_type: SmellType::GeneralFixture,
                file: ctx.file.to_string(),
                line: node_line(method.node),
                message: format!(
                    "{}() contains {bindings} bindings (limit {limit}) - likely \
                     initializes more than any single test needs",
                    method.name
                ),
            });
        }
    }
    smells
}

/// TM: a class exposing exactly one test method.
fn check_test_maverick(
    class_node: Node<'_>,
    test_methods: &[&Method<'_>],
    ctx: &CheckContext<'_>,
) -> Vec<SmellInstance> {
    if test_methods.len() == 1 {
        vec![SmellInstance {
            smell_type: SmellType::TestMaverick,
            file: ctx.file.to_string(),
            line: node_line(class_node),
            message: "Test class contains only one test method".to_string(),
        }]
    } else {
        Vec::new()
    }
}

/// LCTC: with two or more test methods, the intersection of per-method
/// `self.*` attribute sets is empty while each method references at least
/// one instance attribute. The "each references something" guard avoids
/// false positives on attribute-free methods.
fn check_lack_of_cohesion(
    class_node: Node<'_>,
    test_methods: &[&Method<'_>],
    ctx: &CheckContext<'_>,
) -> Vec<SmellInstance> {
    if test_methods.len() < 2 {
        return Vec::new();
    }

    let attr_sets: Vec<BTreeSet<&str>> = test_methods
        .iter()
        .map(|m| self_attributes(m.node, ctx.source))
        .collect();

    if attr_sets.iter().any(|s| s.is_empty()) {
        return Vec::new();
    }

    let mut common = attr_sets[0].clone();
    for set in &attr_sets[1..] {
        common = common.intersection(set).copied().collect();
    }

    if common.is_empty() {
        vec![SmellInstance {
            smell_type: SmellType::LackOfCohesion,
            file: ctx.file.to_string(),
            line: node_line(class_node),
            message: "Test methods share no common instance attributes".to_string(),
        }]
    } else {
        Vec::new()
    }
}

/// Instance attributes referenced inside a method body (`self.x` reads and
/// writes alike).
fn self_attributes<'t>(method: Node<'t>, source: &'t str) -> BTreeSet<&'t str> {
    descendants(method)
        .into_iter()
        .filter(|n| n.kind() == "attribute")
        .filter_map(|n| {
            let object = n.child_by_field_name("object")?;
            let attribute = n.child_by_field_name("attribute")?;
            if object.kind() == "identifier" && node_text(object, source) == "self" {
                Some(node_text(attribute, source))
            } else {
                None
            }
        })
        .collect()
}
