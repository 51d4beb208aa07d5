// Java source parsing

use thiserror::Error;
use tree_sitter::{Node, Parser as TreeParser, Tree};

/// Why decompiled text could not be turned into a usable syntax tree
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to load the Java grammar: {0}")]
    Language(#[from] tree_sitter::LanguageError),
    #[error("parser produced no syntax tree")]
    NoTree,
    #[error("syntax error at {line}:{column} near `{snippet}`")]
    Syntax {
        line: usize,
        column: usize,
        snippet: String,
    },
    #[error("syntax nests deeper than {limit} levels at {line}:{column}")]
    NestingTooDeep {
        line: usize,
        column: usize,
        limit: usize,
    },
}

const SNIPPET_LEN: usize = 40;

/// tree-sitter parser configured for Java
pub struct SourceParser {
    parser: TreeParser,
}

impl SourceParser {
    pub fn new() -> Result<Self, ParseError> {
        let mut parser = TreeParser::new();
        parser.set_language(&tree_sitter_java::LANGUAGE.into())?;
        Ok(Self { parser })
    }

    /// Parse `content`, rejecting trees with ERROR or MISSING nodes
    pub fn parse(&mut self, content: &str) -> Result<Tree, ParseError> {
        let tree = self.parser.parse(content, None).ok_or(ParseError::NoTree)?;

        if let Some(node) = first_error(tree.root_node()) {
            let position = node.start_position();
            return Err(ParseError::Syntax {
                line: position.row + 1,
                column: position.column + 1,
                snippet: snippet(node, content),
            });
        }

        Ok(tree)
    }
}

/// First ERROR or MISSING node in document order
fn first_error(root: Node<'_>) -> Option<Node<'_>> {
    let mut cursor = root.walk();
    loop {
        let node = cursor.node();
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        if node.has_error() && cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return None;
            }
        }
    }
}

fn snippet(node: Node<'_>, content: &str) -> String {
    if node.is_missing() {
        return format!("missing {}", node.kind());
    }
    let text = content.get(node.byte_range()).unwrap_or("");
    let line = text.lines().next().unwrap_or("").trim();
    line.chars().take(SNIPPET_LEN).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_class() {
        let mut parser = SourceParser::new().unwrap();
        let tree = parser
            .parse("class A { int x; void m(int y) { int z = y; } }")
            .unwrap();
        assert_eq!(tree.root_node().kind(), "program");
    }

    #[test]
    fn test_decompiler_artifacts_parse() {
        let source = r#"
public final class Foo$Bar {
    private static final /* synthetic */ int $SWITCH_TABLE$x = 0;

    void loop(int[] values) {
        block0: for (int i = 0; i < values.length; ++i) {
            if (values[i] < 0) break block0;
            Object o = (Object)((Integer)values[i]);
        }
    }
}
"#;
        let mut parser = SourceParser::new().unwrap();
        assert!(parser.parse(source).is_ok());
    }

    #[test]
    fn test_unbalanced_braces_is_syntax_error() {
        let mut parser = SourceParser::new().unwrap();
        let err = parser.parse("class A { void m() { int x = 1; ").unwrap_err();
        match err {
            ParseError::Syntax { line, .. } => assert_eq!(line, 1),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_error_position_is_one_based() {
        let mut parser = SourceParser::new().unwrap();
        let err = parser.parse("class A {\n  int x = ;\n}\n").unwrap_err();
        match err {
            ParseError::Syntax { line, column, .. } => {
                assert_eq!(line, 2);
                assert!(column >= 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
