// Helpers for reading type syntax

use tree_sitter::Node;

pub const PRIMITIVES: [&str; 9] = [
    "boolean", "byte", "char", "short", "int", "long", "float", "double", "void",
];

/// Node kinds that denote a type
pub const TYPE_KINDS: [&str; 9] = [
    "integral_type",
    "floating_point_type",
    "boolean_type",
    "void_type",
    "type_identifier",
    "scoped_type_identifier",
    "generic_type",
    "array_type",
    "annotated_type",
];

pub fn is_type_kind(kind: &str) -> bool {
    TYPE_KINDS.contains(&kind)
}

pub fn is_primitive(name: &str) -> bool {
    PRIMITIVES.contains(&name)
}

pub fn text<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    source.get(node.byte_range()).unwrap_or("")
}

pub fn named_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

pub fn children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).collect()
}

/// Source text of a type with annotations and comments dropped and
/// whitespace normalised: `@NonNull Map<String, ? extends Foo>` becomes
/// `Map<String,? extends Foo>`.
pub fn type_text(node: Node<'_>, source: &str) -> String {
    let mut tokens = Vec::new();
    collect_tokens(node, source, &mut tokens);

    let mut out = String::new();
    for token in tokens {
        let joins_words = match (out.chars().last(), token.chars().next()) {
            (Some(prev), Some(next)) => (is_word(prev) || prev == '?') && is_word(next),
            _ => false,
        };
        if joins_words {
            out.push(' ');
        }
        out.push_str(token);
    }
    out
}

fn collect_tokens<'s>(node: Node<'_>, source: &'s str, tokens: &mut Vec<&'s str>) {
    match node.kind() {
        "annotation" | "marker_annotation" | "line_comment" | "block_comment" => {}
        _ if node.child_count() == 0 => tokens.push(text(node, source)),
        _ => {
            for child in children(node) {
                collect_tokens(child, source, tokens);
            }
        }
    }
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Drop type arguments: `Map<K,List<V>>[]` becomes `Map[]`
pub fn erase_generics(type_text: &str) -> String {
    let mut depth = 0usize;
    let mut out = String::with_capacity(type_text.len());
    for c in type_text.chars() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out
}

/// Number of `[]` pairs in an optional `dimensions` node
pub fn dimension_count(node: Option<Node<'_>>, source: &str) -> usize {
    node.map_or(0, |dims| text(dims, source).matches('[').count())
}

pub fn with_dimensions(base: &str, dims: usize) -> String {
    let mut out = String::with_capacity(base.len() + dims * 2);
    out.push_str(base);
    for _ in 0..dims {
        out.push_str("[]");
    }
    out
}

/// Whether a `modifiers` child of `node` contains `modifier`
pub fn has_modifier(node: Node<'_>, modifier: &str) -> bool {
    children(node)
        .into_iter()
        .filter(|child| child.kind() == "modifiers")
        .any(|modifiers| children(modifiers).iter().any(|m| m.kind() == modifier))
}
