//! Function-scope smell checks, run per test function or method.
//!
//! Empty Test short-circuits everything else. The remaining checks share a
//! single tree walk: all assert-like statements are collected once and every
//! check is a pure function over that collected scope.

use super::CheckContext;
use crate::parser::{
    block_statements, body_block, call_name, descendants, is_docstring_expression, node_line,
    node_text,
};
use crate::{SmellInstance, SmellType};
use std::collections::BTreeMap;
use tree_sitter::Node;

/// Numeric literals that never count as magic numbers in assertions.
const ALLOWED_ASSERTION_LITERALS: &[f64] = &[0.0, 1.0, -1.0];

/// One assert-like statement: either a bare `assert` or a unittest-style
/// `assert*` method call.
struct AssertLike<'t> {
    line: usize,
    /// Text of the asserted expression (condition for `assert`, the whole
    /// call for `assert*` methods); used for duplicate detection.
    text: &'t str,
    /// Explanatory message present (`assert x, "msg"` or `msg=` keyword)
    has_message: bool,
    /// The condition expression of a bare `assert`, for shape checks
    condition: Option<Node<'t>>,
    /// Positional arguments of an `assert*` call, for literal checks
    call_args: Vec<Node<'t>>,
}

/// Everything the per-function checks need, collected in one walk.
struct FunctionScope<'t> {
    node: Node<'t>,
    nodes: Vec<Node<'t>>,
    assertions: Vec<AssertLike<'t>>,
    first_assert_line: Option<usize>,
}

type FunctionCheck = for<'t> fn(&FunctionScope<'t>, &CheckContext<'_>) -> Vec<SmellInstance>;

/// Fixed execution order. Checks are independent; the order only pins the
/// order of emitted instances.
const FUNCTION_CHECKS: &[FunctionCheck] = &[
    check_assertion_roulette,
    check_redundant_assertion,
    check_suboptimal_assert,
    check_duplicate_assert,
    check_magic_number,
    check_obscure_inline_setup,
    check_conditional_test_logic,
    check_exception_handling,
    check_sleepy_test,
    check_redundant_print,
];

/// Run all function-scope checks against one test `function_definition`.
pub fn analyze_function(func_node: Node<'_>, ctx: &CheckContext<'_>) -> Vec<SmellInstance> {
    if let Some(empty) = check_empty_test(func_node, ctx) {
        return vec![empty];
    }

    let nodes = descendants(func_node);
    let assertions = collect_assertions(&nodes, ctx.source);
    let first_assert_line = assertions.iter().map(|a| a.line).min();
    let scope = FunctionScope {
        node: func_node,
        nodes,
        assertions,
        first_assert_line,
    };

    let mut smells = Vec::new();
    for check in FUNCTION_CHECKS {
        smells.extend(check(&scope, ctx));
    }
    smells
}

/// ET: no body, `pass`/`...` only, or docstring only. Short-circuits the
/// remaining checks.
fn check_empty_test(func_node: Node<'_>, ctx: &CheckContext<'_>) -> Option<SmellInstance> {
    let statements = body_block(func_node).map(block_statements)?;
    let message = match statements.as_slice() {
        [] => "Test has no body",
        [only] if only.kind() == "pass_statement" => "Test contains only 'pass'",
        [only] if is_docstring_expression(*only) => {
            "Test contains only a docstring - no assertions"
        }
        [only]
            if only.kind() == "expression_statement"
                && only.named_child(0).is_some_and(|n| n.kind() == "ellipsis") =>
        {
            "Test contains only '...'"
        }
        _ => return None,
    };
    Some(SmellInstance {
        smell_type: SmellType::EmptyTest,
        file: ctx.file.to_string(),
        line: node_line(func_node),
        message: message.to_string(),
    })
}

fn collect_assertions<'t>(nodes: &[Node<'t>], source: &'t str) -> Vec<AssertLike<'t>> {
    let mut assertions = Vec::new();
    for node in nodes {
        match node.kind() {
            "assert_statement" => {
                let condition = node.named_child(0);
                let Some(condition) = condition else { continue };
                assertions.push(AssertLike {
                    line: node_line(*node),
                    text: node_text(condition, source),
                    has_message: node.named_child_count() >= 2,
                    condition: Some(condition),
                    call_args: Vec::new(),
                });
            }
            "call" => {
                let Some(name) = call_name(*node, source) else { continue };
                if !name.starts_with("assert") {
                    continue;
                }
                // An assert* call inside a bare assert's condition is already
                // counted through the enclosing statement.
                if inside_assert_statement(*node) {
                    continue;
                }
                let mut has_message = false;
                let mut call_args = Vec::new();
                if let Some(args) = node.child_by_field_name("arguments") {
                    let mut cursor = args.walk();
                    for arg in args.named_children(&mut cursor) {
                        if arg.kind() == "keyword_argument" {
                            let is_msg = arg
                                .child_by_field_name("name")
                                .is_some_and(|n| node_text(n, source) == "msg");
                            has_message = has_message || is_msg;
                        } else if arg.kind() != "comment" {
                            call_args.push(arg);
                        }
                    }
                }
                assertions.push(AssertLike {
                    line: node_line(*node),
                    text: node_text(*node, source),
                    has_message,
                    condition: None,
                    call_args,
                });
            }
            _ => {}
        }
    }
    assertions.sort_by_key(|a| a.line);
    assertions
}

fn inside_assert_statement(node: Node<'_>) -> bool {
    let mut current = node.parent();
    while let Some(parent) = current {
        match parent.kind() {
            "assert_statement" => return true,
            "function_definition" => return false,
            _ => current = parent.parent(),
        }
    }
    false
}

/// AR: many assertions, most of them without an explanatory message.
fn check_assertion_roulette(
    scope: &FunctionScope<'_>,
    ctx: &CheckContext<'_>,
) -> Vec<SmellInstance> {
    let limit = ctx.thresholds.assertion_roulette_max_unexplained;
    if scope.assertions.len() <= limit {
        return Vec::new();
    }
    let unexplained = scope.assertions.iter().filter(|a| !a.has_message).count();
    if unexplained <= limit {
        return Vec::new();
    }
    vec![SmellInstance {
        smell_type: SmellType::AssertionRoulette,
        file: ctx.file.to_string(),
        line: node_line(scope.node),
        message: format!(
            "{unexplained} assertions have no failure message - hard to tell \
             which one fails"
        ),
    }]
}

/// RA: literal-true assertion or tautological equality.
fn check_redundant_assertion(
    scope: &FunctionScope<'_>,
    ctx: &CheckContext<'_>,
) -> Vec<SmellInstance> {
    let mut smells = Vec::new();
    for assertion in &scope.assertions {
        let Some(condition) = assertion.condition else { continue };
        let redundant = condition.kind() == "true" || is_tautological_equality(condition, ctx.source);
        if redundant {
            smells.push(SmellInstance {
                smell_type: SmellType::RedundantAssertion,
                file: ctx.file.to_string(),
                line: assertion.line,
                message: "Assertion always passes - provides no real verification".to_string(),
            });
        }
    }
    smells
}

/// `a == a` or `1 == 1`: a single `==` whose sides are textually identical.
fn is_tautological_equality(condition: Node<'_>, source: &str) -> bool {
    if condition.kind() != "comparison_operator" || condition.named_child_count() != 2 {
        return false;
    }
    let operators = comparison_operators(condition);
    if operators.as_slice() != ["=="] {
        return false;
    }
    match (condition.named_child(0), condition.named_child(1)) {
        (Some(left), Some(right)) => node_text(left, source) == node_text(right, source),
        _ => false,
    }
}

/// Operator tokens of a `comparison_operator` node (`==`, `!=`, `is`...).
fn comparison_operators(condition: Node<'_>) -> Vec<&'static str> {
    const OPS: &[&str] = &["==", "!=", "<", "<=", ">", ">=", "is", "is not", "in", "not in", "<>"];
    let mut cursor = condition.walk();
    condition
        .children(&mut cursor)
        .filter_map(|c| OPS.iter().find(|op| **op == c.kind()).copied())
        .collect()
}

/// SA: comparing against a boolean literal instead of asserting directly.
fn check_suboptimal_assert(
    scope: &FunctionScope<'_>,
    ctx: &CheckContext<'_>,
) -> Vec<SmellInstance> {
    let mut smells = Vec::new();
    for assertion in &scope.assertions {
        let Some(condition) = assertion.condition else { continue };
        if condition.kind() != "comparison_operator" {
            continue;
        }
        let compares_boolean = (1..condition.named_child_count())
            .filter_map(|i| condition.named_child(i as u32))
            .any(|comparator| matches!(comparator.kind(), "true" | "false"));
        if compares_boolean {
            smells.push(SmellInstance {
                smell_type: SmellType::SuboptimalAssert,
                file: ctx.file.to_string(),
                line: assertion.line,
                message: "Comparing against a boolean literal - assert the condition directly"
                    .to_string(),
            });
        }
    }
    smells
}

/// DA: textually identical assertion expressions repeated. Reported at each
/// repeat, referencing the first occurrence's line.
fn check_duplicate_assert(
    scope: &FunctionScope<'_>,
    ctx: &CheckContext<'_>,
) -> Vec<SmellInstance> {
    let mut smells = Vec::new();
    let mut first_seen: BTreeMap<&str, usize> = BTreeMap::new();
    for assertion in &scope.assertions {
        match first_seen.get(assertion.text) {
            Some(first_line) => smells.push(SmellInstance {
                smell_type: SmellType::DuplicateAssert,
                file: ctx.file.to_string(),
                line: assertion.line,
                message: format!(
                    "Assertion '{}' duplicates line {first_line}",
                    assertion.text
                ),
            }),
            None => {
                first_seen.insert(assertion.text, assertion.line);
            }
        }
    }
    smells
}

/// MNT: an unexplained numeric literal used as an assertion comparator.
/// One report per assertion, not per literal.
fn check_magic_number(scope: &FunctionScope<'_>, ctx: &CheckContext<'_>) -> Vec<SmellInstance> {
    let mut smells = Vec::new();
    for assertion in &scope.assertions {
        let magic = comparator_nodes(assertion)
            .into_iter()
            .find_map(|n| magic_literal(n, ctx.source));
        if let Some(value) = magic {
            smells.push(SmellInstance {
                smell_type: SmellType::MagicNumberTest,
                file: ctx.file.to_string(),
                line: assertion.line,
                message: format!("Magic number {value} in assertion - use a named constant"),
            });
        }
    }
    smells
}

/// Nodes that act as comparators for an assert-like statement: the right
/// sides of a bare assert's comparison, or the positional arguments of an
/// `assert*` call.
fn comparator_nodes<'t>(assertion: &AssertLike<'t>) -> Vec<Node<'t>> {
    if let Some(condition) = assertion.condition {
        if condition.kind() == "comparison_operator" {
            return (1..condition.named_child_count())
                .filter_map(|i| condition.named_child(i as u32))
                .collect();
        }
        return Vec::new();
    }
    assertion.call_args.clone()
}

/// The literal's text when a node is a numeric literal outside the allowed
/// set; handles a leading unary minus.
fn magic_literal<'a>(node: Node<'_>, source: &'a str) -> Option<&'a str> {
    let text = match node.kind() {
        "integer" | "float" => node_text(node, source),
        "unary_operator" => {
            let argument = node.child_by_field_name("argument")?;
            if !matches!(argument.kind(), "integer" | "float") {
                return None;
            }
            node_text(node, source)
        }
        _ => return None,
    };
    let value: f64 = text.parse().ok()?;
    if ALLOWED_ASSERTION_LITERALS.contains(&value) {
        None
    } else {
        Some(text)
    }
}

/// OS: significant setup happening inline before the first assertion.
fn check_obscure_inline_setup(
    scope: &FunctionScope<'_>,
    ctx: &CheckContext<'_>,
) -> Vec<SmellInstance> {
    let before_first_assert = |node: &Node<'_>| match scope.first_assert_line {
        Some(first) => node_line(*node) < first,
        None => true,
    };

    let assignments = scope
        .nodes
        .iter()
        .filter(|n| n.kind() == "assignment" && before_first_assert(n))
        .count();
    let constructor_calls = scope
        .nodes
        .iter()
        .filter(|n| n.kind() == "call" && before_first_assert(n))
        .filter(|n| {
            n.child_by_field_name("function")
                .filter(|f| f.kind() == "identifier")
                .map(|f| node_text(f, ctx.source))
                .and_then(|name| name.chars().next())
                .is_some_and(|c| c.is_uppercase())
        })
        .count();

    if assignments >= ctx.thresholds.inline_setup_max_assignments
        || constructor_calls >= ctx.thresholds.inline_setup_max_constructor_calls
    {
        return vec![SmellInstance {
            smell_type: SmellType::ObscureInlineSetup,
            file: ctx.file.to_string(),
            line: node_line(scope.node),
            message: format!(
                "{assignments} assignments and {constructor_calls} constructor calls \
                 before the first assertion - move setup to a fixture"
            ),
        }];
    }
    Vec::new()
}

/// CTL: a conditional or loop construct anywhere in the body. One report per
/// construct kind, first occurrence only.
fn check_conditional_test_logic(
    scope: &FunctionScope<'_>,
    ctx: &CheckContext<'_>,
) -> Vec<SmellInstance> {
    let mut smells = Vec::new();
    if let Some(node) = scope.nodes.iter().find(|n| n.kind() == "if_statement") {
        smells.push(SmellInstance {
            smell_type: SmellType::ConditionalTestLogic,
            file: ctx.file.to_string(),
            line: node_line(*node),
            message: "Test contains an if/else branch".to_string(),
        });
    }
    if let Some(node) = scope
        .nodes
        .iter()
        .find(|n| matches!(n.kind(), "for_statement" | "while_statement"))
    {
        smells.push(SmellInstance {
            smell_type: SmellType::ConditionalTestLogic,
            file: ctx.file.to_string(),
            line: node_line(*node),
            message: "Test contains a loop".to_string(),
        });
    }
    smells
}

/// EH: a try/except whose handler is bare or catches a fully generic
/// exception type. One report per try block.
fn check_exception_handling(
    scope: &FunctionScope<'_>,
    ctx: &CheckContext<'_>,
) -> Vec<SmellInstance> {
    let mut smells = Vec::new();
    for try_node in scope.nodes.iter().filter(|n| n.kind() == "try_statement") {
        let mut cursor = try_node.walk();
        let generic = try_node
            .children(&mut cursor)
            .filter(|c| c.kind() == "except_clause")
            .any(|clause| is_generic_handler(clause, ctx.source));
        if generic {
            smells.push(SmellInstance {
                smell_type: SmellType::ExceptionHandling,
                file: ctx.file.to_string(),
                line: node_line(*try_node),
                message: "Generic try/except in test - use pytest.raises or assertRaises"
                    .to_string(),
            });
        }
    }
    smells
}

fn is_generic_handler(clause: Node<'_>, source: &str) -> bool {
    // except_clause children: "except" [expression ["as" identifier]] ":" block.
    // The caught type is the first named child that is not the handler block.
    let mut cursor = clause.walk();
    let caught = clause
        .named_children(&mut cursor)
        .find(|c| c.kind() != "block" && c.kind() != "comment");
    match caught {
        None => true, // bare except:
        Some(node) => {
            let type_node = if node.kind() == "as_pattern" {
                node.named_child(0).unwrap_or(node)
            } else {
                node
            };
            type_node.kind() == "identifier"
                && matches!(node_text(type_node, source), "Exception" | "BaseException")
        }
    }
}

/// ST: a call whose callee name ends in a sleep-like attribute. First
/// occurrence only.
fn check_sleepy_test(scope: &FunctionScope<'_>, ctx: &CheckContext<'_>) -> Vec<SmellInstance> {
    let sleepy = scope.nodes.iter().find(|n| {
        n.kind() == "call"
            && n.child_by_field_name("function")
                .filter(|f| f.kind() == "attribute")
                .and_then(|f| f.child_by_field_name("attribute"))
                .is_some_and(|attr| node_text(attr, ctx.source).ends_with("sleep"))
    });
    match sleepy {
        Some(node) => vec![SmellInstance {
            smell_type: SmellType::SleepyTest,
            file: ctx.file.to_string(),
            line: node_line(*node),
            message: "Test sleeps - slow and non-deterministic across machines".to_string(),
        }],
        None => Vec::new(),
    }
}

/// RP: print calls in the test body. Reports the count at the first line.
fn check_redundant_print(scope: &FunctionScope<'_>, ctx: &CheckContext<'_>) -> Vec<SmellInstance> {
    let print_lines: Vec<usize> = scope
        .nodes
        .iter()
        .filter(|n| {
            n.kind() == "call"
                && n.child_by_field_name("function")
                    .filter(|f| f.kind() == "identifier")
                    .is_some_and(|f| node_text(f, ctx.source) == "print")
        })
        .map(|n| node_line(*n))
        .collect();

    match print_lines.first() {
        Some(first) => vec![SmellInstance {
            smell_type: SmellType::RedundantPrint,
            file: ctx.file.to_string(),
            line: *first,
            message: format!(
                "Test contains {} print call(s) - remove or replace with logging",
                print_lines.len()
            ),
        }],
        None => Vec::new(),
    }
}
