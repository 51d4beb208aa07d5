// Package and import declarations of a compilation unit

use std::collections::HashMap;

use tree_sitter::Node;

use super::types::{children, named_children, text};

/// Names brought into scope by the package and import declarations.
/// Names are kept in source (dotted) form; mapping them onto internal
/// paths needs the type solver.
#[derive(Debug, Clone, Default)]
pub struct ImportScope {
    package: String,
    single: HashMap<String, String>,
    on_demand: Vec<String>,
    static_single: HashMap<String, String>,
    static_on_demand: Vec<String>,
}

impl ImportScope {
    pub fn collect(root: Node<'_>, source: &str) -> Self {
        let mut scope = Self::default();

        for node in named_children(root) {
            match node.kind() {
                "package_declaration" => {
                    if let Some(name) = qualified_name(node) {
                        scope.package = text(name, source).replace('.', "/");
                    }
                }
                "import_declaration" => scope.add_import(node, source),
                _ => {}
            }
        }

        scope
    }

    fn add_import(&mut self, node: Node<'_>, source: &str) {
        let Some(name) = qualified_name(node) else {
            return;
        };
        let dotted: String = text(name, source).split_whitespace().collect();
        let tokens = children(node);
        let is_static = tokens.iter().any(|child| child.kind() == "static");
        let on_demand = tokens.iter().any(|child| child.kind() == "asterisk");

        match (is_static, on_demand) {
            (false, false) => {
                let simple = dotted.rsplit('.').next().unwrap_or(&dotted).to_string();
                self.single.insert(simple, dotted);
            }
            (false, true) => self.on_demand.push(dotted),
            (true, false) => {
                if let Some((owner, member)) = dotted.rsplit_once('.') {
                    self.static_single.insert(member.to_string(), owner.to_string());
                }
            }
            (true, true) => self.static_on_demand.push(dotted),
        }
    }

    /// Qualify a type path relative to the current package
    pub fn in_package(&self, name: &str) -> String {
        if self.package.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", self.package, name)
        }
    }

    pub fn single_type(&self, simple_name: &str) -> Option<&str> {
        self.single.get(simple_name).map(String::as_str)
    }

    pub fn on_demand(&self) -> &[String] {
        &self.on_demand
    }

    /// Type a statically imported member was imported from
    pub fn static_owner(&self, member: &str) -> Option<&str> {
        self.static_single.get(member).map(String::as_str)
    }

    pub fn static_on_demand(&self) -> &[String] {
        &self.static_on_demand
    }
}

fn qualified_name(node: Node<'_>) -> Option<Node<'_>> {
    named_children(node)
        .into_iter()
        .find(|child| matches!(child.kind(), "scoped_identifier" | "identifier"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tree_sitter::Parser;

    fn collect(source: &str) -> ImportScope {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_java::LANGUAGE.into())
            .unwrap();
        let tree = parser.parse(source, None).unwrap();
        ImportScope::collect(tree.root_node(), source)
    }

    #[test]
    fn test_collects_all_import_forms() {
        let scope = collect(
            r#"
package com.acme.app;

import java.util.List;
import java.util.concurrent.*;
import static java.lang.Math.max;
import static java.util.Collections.*;

class A {}
"#,
        );

        assert_eq!(scope.in_package("A"), "com/acme/app/A");
        assert_eq!(scope.single_type("List"), Some("java.util.List"));
        assert_eq!(scope.single_type("Map"), None);
        assert_eq!(scope.on_demand(), ["java.util.concurrent".to_string()]);
        assert_eq!(scope.static_owner("max"), Some("java.lang.Math"));
        assert_eq!(scope.static_on_demand(), ["java.util.Collections".to_string()]);
    }

    #[test]
    fn test_default_package() {
        let scope = collect("class A {}");
        assert_eq!(scope.in_package("A"), "A");
    }
}
