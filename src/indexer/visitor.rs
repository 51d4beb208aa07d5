// Single-pass walk classifying declarations and member references

use std::collections::HashMap;

use tracing::debug;
use tree_sitter::{Node, Point};

use super::imports::ImportScope;
use super::parser::ParseError;
use super::scope::{LocalType, Scope, Variable};
use super::types::{
    children, dimension_count, erase_generics, has_modifier, is_primitive, is_type_kind,
    named_children, text, type_text, with_dimensions,
};
use crate::index::{Location, LocationTable, Span};
use crate::resolve::{CombinedTypeSolver, JavaType, MemberKind, MemberMatch, ResolveError, TypeSolver};

const TYPE_DECLARATIONS: [&str; 5] = [
    "class_declaration",
    "interface_declaration",
    "enum_declaration",
    "record_declaration",
    "annotation_type_declaration",
];

const STATIC_INIT: &str = "<clinit>";
const INSTANCE_INIT: &str = "<init>";
const MAX_HIERARCHY_DEPTH: usize = 32;

/// Deepest syntax nesting a walk descends into before giving up on the file
pub const MAX_NESTING_DEPTH: usize = 16_384;
const RED_ZONE: usize = 128 * 1024;
const STACK_GROWTH: usize = 1024 * 1024;

/// Parents whose `identifier` children are labels, annotation names or
/// pattern types rather than expressions
const NON_EXPRESSION_PARENTS: [&str; 8] = [
    "labeled_statement",
    "break_statement",
    "continue_statement",
    "marker_annotation",
    "annotation",
    "annotation_type_element_declaration",
    "scoped_identifier",
    "record_pattern",
];

/// Counters gathered during a walk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkStats {
    pub unresolved: usize,
}

/// What an expression evaluates to, as far as member lookup is concerned
#[derive(Debug, Clone, PartialEq)]
enum Receiver {
    /// A value of a known type
    Value(JavaType),
    /// A type name used as a qualifier (`Math.PI`)
    Static(String),
    /// A dotted name that is neither a variable nor a known type; usually a
    /// package prefix
    Name(String),
    /// A member was found but its type is not known
    Opaque,
}

struct Parameter<'a> {
    name_node: Node<'a>,
    type_name: String,
    erased: String,
    ty: Option<JavaType>,
}

pub struct LocationVisitor<'a> {
    source: &'a str,
    root: Node<'a>,
    solver: &'a CombinedTypeSolver,
    imports: ImportScope,
    file_types: HashMap<String, String>,
    scope: Scope,
    table: LocationTable,
    stats: WalkStats,
    depth: usize,
    too_deep: Option<Point>,
}

impl<'a> LocationVisitor<'a> {
    pub fn new(source: &'a str, root: Node<'a>, solver: &'a CombinedTypeSolver) -> Self {
        let imports = ImportScope::collect(root, source);
        let file_types = named_children(root)
            .into_iter()
            .filter(|node| TYPE_DECLARATIONS.contains(&node.kind()))
            .filter_map(|node| node.child_by_field_name("name"))
            .map(|name| {
                let name = text(name, source).to_string();
                let path = imports.in_package(&name);
                (name, path)
            })
            .collect();

        Self {
            source,
            root,
            solver,
            imports,
            file_types,
            scope: Scope::new(),
            table: LocationTable::new(),
            stats: WalkStats::default(),
            depth: 0,
            too_deep: None,
        }
    }

    /// Visit every node once, in source order. Fails when the syntax nests
    /// deeper than [`MAX_NESTING_DEPTH`].
    pub fn walk(mut self) -> Result<(LocationTable, WalkStats), ParseError> {
        self.visit(self.root);
        match self.too_deep {
            Some(position) => Err(ParseError::NestingTooDeep {
                line: position.row + 1,
                column: position.column + 1,
                limit: MAX_NESTING_DEPTH,
            }),
            None => Ok((self.table, self.stats)),
        }
    }

    fn text(&self, node: Node<'_>) -> &'a str {
        text(node, self.source)
    }

    fn owner(&self) -> String {
        self.scope
            .frame()
            .map(|frame| frame.name().to_string())
            .unwrap_or_default()
    }

    fn current_method(&self) -> String {
        self.scope.method().unwrap_or(INSTANCE_INIT).to_string()
    }

    fn unresolved(&mut self, node: Node<'_>, error: ResolveError) {
        self.stats.unresolved += 1;
        let position = node.start_position();
        debug!(
            "Unresolved `{}` at {}:{}: {}",
            self.text(node),
            position.row + 1,
            position.column + 1,
            error
        );
    }

    /// Enter one nesting level, or note the first node past the limit
    fn descend(&mut self, node: Node<'_>) -> bool {
        if self.too_deep.is_some() {
            return false;
        }
        if self.depth >= MAX_NESTING_DEPTH {
            self.too_deep = Some(node.start_position());
            return false;
        }
        self.depth += 1;
        true
    }

    // ---- traversal ----

    fn visit(&mut self, node: Node<'a>) {
        if !self.descend(node) {
            return;
        }
        stacker::maybe_grow(RED_ZONE, STACK_GROWTH, || self.visit_node(node));
        self.depth -= 1;
    }

    fn visit_node(&mut self, node: Node<'a>) {
        match node.kind() {
            "package_declaration" | "import_declaration" | "module_declaration" | "line_comment"
            | "block_comment" => {}
            kind if TYPE_DECLARATIONS.contains(&kind) => self.visit_type_declaration(node),
            "field_declaration" | "constant_declaration" => self.visit_field_declaration(node),
            "method_declaration" | "constructor_declaration" => self.visit_method(node),
            "compact_constructor_declaration" => self.visit_compact_constructor(node),
            "enum_constant" => self.visit_enum_constant(node),
            "static_initializer" => {
                let previous = self.scope.set_method(Some(STATIC_INIT.to_string()));
                self.visit_children(node);
                self.scope.set_method(previous);
            }
            "block" => {
                let initializer = node.parent().is_some_and(|p| p.kind() == "class_body");
                let previous = initializer.then(|| self.scope.set_method(Some(INSTANCE_INIT.to_string())));
                self.visit_scoped(node);
                if let Some(previous) = previous {
                    self.scope.set_method(previous);
                }
            }
            "for_statement" | "switch_block_statement_group" | "switch_rule" => self.visit_scoped(node),
            "local_variable_declaration" => self.visit_local_declaration(node),
            "enhanced_for_statement" => self.visit_enhanced_for(node),
            "catch_clause" => self.visit_catch(node),
            "try_with_resources_statement" => self.visit_try_with_resources(node),
            "instanceof_expression" => self.visit_instanceof(node),
            "type_pattern" | "record_pattern_component" => self.visit_pattern_binding(node),
            "lambda_expression" => self.visit_lambda(node),
            "object_creation_expression" => self.visit_object_creation(node),
            "field_access" | "method_invocation" | "method_reference" => self.visit_access(node),
            "identifier" => self.visit_identifier(node),
            _ => self.visit_children(node),
        }
    }

    fn visit_children(&mut self, node: Node<'a>) {
        for child in named_children(node) {
            self.visit(child);
        }
    }

    fn visit_scoped(&mut self, node: Node<'a>) {
        self.scope.push_block();
        self.visit_children(node);
        self.scope.pop_block();
    }

    fn visit_type_declaration(&mut self, node: Node<'a>) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let name = self.text(name_node);

        let path = match self.scope.frame() {
            Some(frame) if self.scope.method().is_some() => format!("{}$1{}", frame.path, name),
            Some(frame) => format!("{}${}", frame.path, name),
            None => self.imports.in_package(name),
        };
        if let Some(frame) = self.scope.frame_mut() {
            frame.nested.insert(name.to_string(), path.clone());
        }

        self.enter_type(Some(node), path, node.child_by_field_name("body"), None);
    }

    /// Push a frame for a class body, record its header and walk its members
    fn enter_type(
        &mut self,
        declaration: Option<Node<'a>>,
        path: String,
        body: Option<Node<'a>>,
        super_hint: Option<String>,
    ) {
        self.scope.push_frame(path);

        let members = body.map(|body| self.body_members(body)).unwrap_or_default();
        for member in &members {
            if TYPE_DECLARATIONS.contains(&member.kind()) {
                if let Some(name) = member.child_by_field_name("name") {
                    let name = self.text(name);
                    if let Some(frame) = self.scope.frame_mut() {
                        let nested = format!("{}${}", frame.path, name);
                        frame.nested.insert(name.to_string(), nested);
                    }
                }
            }
        }

        let local = self.local_type(declaration, &members, super_hint);
        if let Some(frame) = self.scope.frame_mut() {
            frame.members = local;
        }

        if let Some(record) = declaration.filter(|d| d.kind() == "record_declaration") {
            let owner = self.owner();
            for component in self.parameters(record.child_by_field_name("parameters")) {
                self.table.insert(
                    self.text(component.name_node),
                    Location::Field {
                        name: self.text(component.name_node).to_string(),
                        type_name: component.type_name,
                        owner: owner.clone(),
                        span: Span::of(component.name_node),
                    },
                );
            }
        }

        if let Some(body) = body {
            self.visit_children(body);
        }
        self.scope.pop_frame();
    }

    /// Direct members of a class body, with enum body declarations flattened
    fn body_members(&self, body: Node<'a>) -> Vec<Node<'a>> {
        let mut members = Vec::new();
        for child in named_children(body) {
            if child.kind() == "enum_body_declarations" {
                members.extend(named_children(child));
            } else {
                members.push(child);
            }
        }
        members
    }

    /// Supertypes and member types of the class whose frame is on top
    fn local_type(
        &self,
        declaration: Option<Node<'a>>,
        members: &[Node<'a>],
        super_hint: Option<String>,
    ) -> LocalType {
        let mut local = LocalType {
            super_class: super_hint,
            ..LocalType::default()
        };
        let Some(frame_path) = self.scope.frame().map(|frame| frame.path.clone()) else {
            return local;
        };

        if let Some(declaration) = declaration {
            match declaration.kind() {
                "enum_declaration" => local.super_class = Some("java/lang/Enum".to_string()),
                "record_declaration" => local.super_class = Some("java/lang/Record".to_string()),
                _ => {}
            }
            for child in children(declaration) {
                match child.kind() {
                    "superclass" => {
                        local.super_class = named_children(child)
                            .into_iter()
                            .find(|n| is_type_kind(n.kind()))
                            .and_then(|ty| self.resolve_type_node(ty))
                            .and_then(|ty| ty.class_path().map(str::to_string));
                    }
                    "super_interfaces" | "extends_interfaces" => {
                        for list in named_children(child) {
                            for ty in named_children(list) {
                                if let Some(path) = self
                                    .resolve_type_node(ty)
                                    .and_then(|ty| ty.class_path().map(str::to_string))
                                {
                                    local.interfaces.push(path);
                                }
                            }
                        }
                    }
                    _ => {}
                }
            }

            if declaration.kind() == "record_declaration" {
                for component in self.parameters(declaration.child_by_field_name("parameters")) {
                    let name = self.text(component.name_node).to_string();
                    local.fields.insert(name.clone(), component.ty.clone());
                    local.methods.insert(name, component.ty);
                }
            }
        }

        for member in members {
            match member.kind() {
                "field_declaration" | "constant_declaration" => {
                    let base = member
                        .child_by_field_name("type")
                        .and_then(|ty| self.resolve_type_node(ty));
                    for declarator in self.declarators(*member) {
                        if let Some(name) = declarator.child_by_field_name("name") {
                            let dims = dimension_count(declarator.child_by_field_name("dimensions"), self.source);
                            local.fields.insert(
                                self.text(name).to_string(),
                                base.clone().map(|ty| ty.array_of(dims)),
                            );
                        }
                    }
                }
                "enum_constant" => {
                    if let Some(name) = member.child_by_field_name("name") {
                        local
                            .fields
                            .insert(self.text(name).to_string(), Some(JavaType::Class(frame_path.clone())));
                    }
                }
                "method_declaration" => {
                    if let Some(name) = member.child_by_field_name("name") {
                        let ret = member
                            .child_by_field_name("type")
                            .and_then(|ty| self.resolve_type_node(ty));
                        local.methods.entry(self.text(name).to_string()).or_insert(ret);
                    }
                }
                _ => {}
            }
        }

        local
    }

    fn declarators(&self, node: Node<'a>) -> Vec<Node<'a>> {
        let mut cursor = node.walk();
        node.children_by_field_name("declarator", &mut cursor).collect()
    }

    fn visit_field_declaration(&mut self, node: Node<'a>) {
        let base_text = node
            .child_by_field_name("type")
            .map(|ty| type_text(ty, self.source))
            .unwrap_or_default();
        let is_static = node.kind() == "constant_declaration" || has_modifier(node, "static");
        let initializer = if is_static { STATIC_INIT } else { INSTANCE_INIT };
        let owner = self.owner();

        for declarator in self.declarators(node) {
            let Some(name_node) = declarator.child_by_field_name("name") else {
                continue;
            };
            let name = self.text(name_node);
            let dims = dimension_count(declarator.child_by_field_name("dimensions"), self.source);
            self.table.insert(
                name,
                Location::Field {
                    name: name.to_string(),
                    type_name: with_dimensions(&base_text, dims),
                    owner: owner.clone(),
                    span: Span::of(name_node),
                },
            );

            if let Some(value) = declarator.child_by_field_name("value") {
                let previous = self.scope.set_method(Some(initializer.to_string()));
                self.visit(value);
                self.scope.set_method(previous);
            }
        }
    }

    fn visit_enum_constant(&mut self, node: Node<'a>) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let enum_path = self.scope.frame().map(|frame| frame.path.clone()).unwrap_or_default();
        let enum_name = enum_path.rsplit(|c| c == '/' || c == '$').next().unwrap_or("").to_string();
        let name = self.text(name_node);
        self.table.insert(
            name,
            Location::Field {
                name: name.to_string(),
                type_name: enum_name,
                owner: self.owner(),
                span: Span::of(name_node),
            },
        );

        if let Some(arguments) = node.child_by_field_name("arguments") {
            let previous = self.scope.set_method(Some(STATIC_INIT.to_string()));
            self.visit(arguments);
            self.scope.set_method(previous);
        }
        if let Some(body) = node.child_by_field_name("body") {
            let path = self.scope.next_anonymous_path();
            self.enter_type(None, path, Some(body), Some(enum_path));
        }
    }

    fn visit_method(&mut self, node: Node<'a>) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let name = self.text(name_node);
        let parameters = self.parameters(node.child_by_field_name("parameters"));
        let signature = signature(name, &parameters);
        let return_type = if node.kind() == "constructor_declaration" {
            None
        } else {
            node.child_by_field_name("type")
                .map(|ty| type_text(ty, self.source))
        };

        let owner = self.owner();
        self.table.insert(
            name,
            Location::Method {
                name: name.to_string(),
                signature: signature.clone(),
                parameter_types: parameters.iter().map(|p| p.erased.clone()).collect(),
                return_type,
                owner: owner.clone(),
                span: Span::of(name_node),
            },
        );

        let previous = self.scope.set_method(Some(signature.clone()));
        self.scope.push_block();
        for parameter in parameters {
            let param_name = self.text(parameter.name_node);
            self.table.insert(
                param_name,
                Location::Parameter {
                    name: param_name.to_string(),
                    type_name: parameter.type_name,
                    method: signature.clone(),
                    owner: owner.clone(),
                    span: Span::of(parameter.name_node),
                },
            );
            self.scope.declare(param_name, parameter.ty);
        }
        if let Some(body) = node.child_by_field_name("body") {
            self.visit(body);
        }
        self.scope.pop_block();
        self.scope.set_method(previous);
    }

    /// Record constructors in compact form take the record components implicitly
    fn visit_compact_constructor(&mut self, node: Node<'a>) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let name = self.text(name_node);
        let components = node
            .parent()
            .and_then(|body| body.parent())
            .filter(|record| record.kind() == "record_declaration")
            .map(|record| self.parameters(record.child_by_field_name("parameters")))
            .unwrap_or_default();
        let signature = signature(name, &components);

        self.table.insert(
            name,
            Location::Method {
                name: name.to_string(),
                signature: signature.clone(),
                parameter_types: components.iter().map(|p| p.erased.clone()).collect(),
                return_type: None,
                owner: self.owner(),
                span: Span::of(name_node),
            },
        );

        let previous = self.scope.set_method(Some(signature));
        self.scope.push_block();
        for component in components {
            self.scope.declare(self.text(component.name_node), component.ty);
        }
        if let Some(body) = node.child_by_field_name("body") {
            self.visit(body);
        }
        self.scope.pop_block();
        self.scope.set_method(previous);
    }

    fn parameters(&self, node: Option<Node<'a>>) -> Vec<Parameter<'a>> {
        let Some(node) = node else {
            return Vec::new();
        };

        let mut parameters = Vec::new();
        for child in named_children(node) {
            match child.kind() {
                "formal_parameter" => {
                    let (Some(ty), Some(name_node)) =
                        (child.child_by_field_name("type"), child.child_by_field_name("name"))
                    else {
                        continue;
                    };
                    let dims = dimension_count(child.child_by_field_name("dimensions"), self.source);
                    let type_name = with_dimensions(&type_text(ty, self.source), dims);
                    parameters.push(Parameter {
                        name_node,
                        erased: erase_generics(&type_name),
                        type_name,
                        ty: self.resolve_type_node(ty).map(|ty| ty.array_of(dims)),
                    });
                }
                "spread_parameter" => {
                    let parts = named_children(child);
                    let ty = parts.iter().copied().find(|n| is_type_kind(n.kind()));
                    let declarator = parts.iter().copied().find(|n| n.kind() == "variable_declarator");
                    let (Some(ty), Some(name_node)) =
                        (ty, declarator.and_then(|d| d.child_by_field_name("name")))
                    else {
                        continue;
                    };
                    let type_name = format!("{}...", type_text(ty, self.source));
                    parameters.push(Parameter {
                        name_node,
                        erased: erase_generics(&type_name),
                        type_name,
                        ty: self.resolve_type_node(ty).map(|ty| ty.array_of(1)),
                    });
                }
                _ => {}
            }
        }
        parameters
    }

    fn record_local(&mut self, name_node: Node<'a>, type_name: Option<String>) {
        let name = self.text(name_node);
        self.table.insert(
            name,
            Location::LocalVariable {
                name: name.to_string(),
                type_name,
                method: self.current_method(),
                owner: self.owner(),
                span: Span::of(name_node),
            },
        );
    }

    fn visit_local_declaration(&mut self, node: Node<'a>) {
        let type_node = node.child_by_field_name("type");
        let is_var = type_node.is_some_and(|ty| self.text(ty) == "var");
        let base_text = type_node.map(|ty| type_text(ty, self.source)).unwrap_or_default();
        let declared = if is_var {
            None
        } else {
            type_node.and_then(|ty| self.resolve_type_node(ty))
        };

        for declarator in self.declarators(node) {
            let Some(name_node) = declarator.child_by_field_name("name") else {
                continue;
            };
            let dims = dimension_count(declarator.child_by_field_name("dimensions"), self.source);
            self.record_local(name_node, (!is_var).then(|| with_dimensions(&base_text, dims)));

            let value = declarator.child_by_field_name("value");
            if let Some(value) = value {
                self.visit(value);
            }
            let ty = if is_var {
                value.and_then(|value| self.value_type(value))
            } else {
                declared.clone().map(|ty| ty.array_of(dims))
            };
            self.scope.declare(self.text(name_node), ty);
        }
    }

    fn visit_enhanced_for(&mut self, node: Node<'a>) {
        self.scope.push_block();

        let type_node = node.child_by_field_name("type");
        let is_var = type_node.is_some_and(|ty| self.text(ty) == "var");
        let value = node.child_by_field_name("value");
        if let Some(name_node) = node.child_by_field_name("name") {
            let dims = dimension_count(node.child_by_field_name("dimensions"), self.source);
            let type_name = type_node
                .filter(|_| !is_var)
                .map(|ty| with_dimensions(&type_text(ty, self.source), dims));
            self.record_local(name_node, type_name);

            if let Some(value) = value {
                self.visit(value);
            }
            let ty = if is_var {
                value
                    .and_then(|value| self.value_type(value))
                    .and_then(|ty| ty.element_type().cloned())
            } else {
                type_node
                    .and_then(|ty| self.resolve_type_node(ty))
                    .map(|ty| ty.array_of(dims))
            };
            self.scope.declare(self.text(name_node), ty);
        }

        if let Some(body) = node.child_by_field_name("body") {
            self.visit(body);
        }
        self.scope.pop_block();
    }

    fn visit_catch(&mut self, node: Node<'a>) {
        self.scope.push_block();
        for child in named_children(node) {
            if child.kind() != "catch_formal_parameter" {
                self.visit(child);
                continue;
            }
            let Some(name_node) = child.child_by_field_name("name") else {
                continue;
            };
            let catch_type = named_children(child)
                .into_iter()
                .find(|n| n.kind() == "catch_type");
            let alternatives = catch_type.map(named_children).unwrap_or_default();
            let ty = match alternatives.as_slice() {
                [single] => self.resolve_type_node(*single),
                _ => None,
            };
            self.record_local(name_node, catch_type.map(|ty| type_text(ty, self.source)));
            self.scope.declare(self.text(name_node), ty);
        }
        self.scope.pop_block();
    }

    fn visit_try_with_resources(&mut self, node: Node<'a>) {
        self.scope.push_block();
        for child in named_children(node) {
            if child.kind() != "resource_specification" {
                self.visit(child);
                continue;
            }
            for resource in named_children(child) {
                let Some(name_node) = resource.child_by_field_name("name") else {
                    self.visit_children(resource);
                    continue;
                };
                let type_node = resource.child_by_field_name("type");
                let is_var = type_node.is_some_and(|ty| self.text(ty) == "var");
                self.record_local(
                    name_node,
                    type_node
                        .filter(|_| !is_var)
                        .map(|ty| type_text(ty, self.source)),
                );

                let value = resource.child_by_field_name("value");
                if let Some(value) = value {
                    self.visit(value);
                }
                let ty = if is_var {
                    value.and_then(|value| self.value_type(value))
                } else {
                    type_node.and_then(|ty| self.resolve_type_node(ty))
                };
                self.scope.declare(self.text(name_node), ty);
            }
        }
        self.scope.pop_block();
    }

    fn visit_instanceof(&mut self, node: Node<'a>) {
        let Some(name_node) = node.child_by_field_name("name") else {
            self.visit_children(node);
            return;
        };
        if let Some(left) = node.child_by_field_name("left") {
            self.visit(left);
        }
        let right = node.child_by_field_name("right");
        self.record_local(name_node, right.map(|ty| type_text(ty, self.source)));
        let ty = right.and_then(|ty| self.resolve_type_node(ty));
        self.scope.declare(self.text(name_node), ty);
    }

    /// `String s` in a switch label, `int px` inside a record pattern
    fn visit_pattern_binding(&mut self, node: Node<'a>) {
        let parts = named_children(node);
        let Some(name_node) = parts.last().copied().filter(|n| n.kind() == "identifier") else {
            return;
        };
        let type_node = parts.iter().copied().find(|n| is_type_kind(n.kind()));
        let is_var = type_node.is_some_and(|ty| self.text(ty) == "var");
        self.record_local(
            name_node,
            type_node
                .filter(|_| !is_var)
                .map(|ty| type_text(ty, self.source)),
        );
        let ty = type_node
            .filter(|_| !is_var)
            .and_then(|ty| self.resolve_type_node(ty));
        self.scope.declare(self.text(name_node), ty);
    }

    fn visit_lambda(&mut self, node: Node<'a>) {
        self.scope.push_block();
        if let Some(params) = node.child_by_field_name("parameters") {
            match params.kind() {
                "identifier" => {
                    self.record_local(params, None);
                    self.scope.declare(self.text(params), None);
                }
                "inferred_parameters" => {
                    for ident in named_children(params) {
                        self.record_local(ident, None);
                        self.scope.declare(self.text(ident), None);
                    }
                }
                _ => {
                    for parameter in self.parameters(Some(params)) {
                        self.record_local(parameter.name_node, Some(parameter.type_name));
                        self.scope.declare(self.text(parameter.name_node), parameter.ty);
                    }
                }
            }
        }
        if let Some(body) = node.child_by_field_name("body") {
            self.visit(body);
        }
        self.scope.pop_block();
    }

    fn visit_object_creation(&mut self, node: Node<'a>) {
        let type_node = node.child_by_field_name("type");
        let mut body = None;
        for child in named_children(node) {
            match child.kind() {
                "class_body" => body = Some(child),
                _ if Some(child) == type_node => {}
                "type_arguments" => {}
                _ => self.visit(child),
            }
        }

        if let Some(body) = body {
            let super_hint = type_node
                .and_then(|ty| self.resolve_type_node(ty))
                .and_then(|ty| ty.class_path().map(str::to_string));
            let path = self.scope.next_anonymous_path();
            self.enter_type(None, path, Some(body), super_hint);
        }
    }

    /// A member access outside any enclosing access chain
    fn visit_access(&mut self, node: Node<'a>) {
        match self.expr(node, true) {
            Ok(Receiver::Name(name)) if node.kind() == "field_access" => {
                self.unresolved(node, ResolveError::UnsolvedType(name))
            }
            Ok(_) => {}
            Err(ResolveError::NestingTooDeep(_)) => {}
            Err(e) => self.unresolved(node, e),
        }
    }

    /// A bare name in expression position. Names that resolve to nothing are
    /// usually labels or enum constants of a switch and are not counted.
    fn visit_identifier(&mut self, node: Node<'a>) {
        let Some(parent) = node.parent() else {
            return;
        };
        if NON_EXPRESSION_PARENTS.contains(&parent.kind()) {
            return;
        }
        if parent.kind() == "element_value_pair" && parent.child_by_field_name("key") == Some(node) {
            return;
        }
        let _ = self.expr(node, true);
    }

    // ---- expression typing ----

    fn value_type(&mut self, node: Node<'a>) -> Option<JavaType> {
        match self.expr(node, false) {
            Ok(Receiver::Value(ty)) => Some(ty),
            _ => None,
        }
    }

    /// Type an expression. With `record` set, member references inside it
    /// are recorded and nested expressions are visited.
    fn expr(&mut self, node: Node<'a>, record: bool) -> Result<Receiver, ResolveError> {
        if !self.descend(node) {
            return Err(ResolveError::NestingTooDeep(MAX_NESTING_DEPTH));
        }
        let result = stacker::maybe_grow(RED_ZONE, STACK_GROWTH, || self.expr_node(node, record));
        self.depth -= 1;
        result
    }

    fn expr_node(&mut self, node: Node<'a>, record: bool) -> Result<Receiver, ResolveError> {
        match node.kind() {
            "identifier" => self.identifier(node, record),
            "this" => self
                .scope
                .frame()
                .map(|frame| Receiver::Value(JavaType::Class(frame.path.clone())))
                .ok_or_else(|| ResolveError::UnsupportedExpression("this".to_string())),
            "super" => Ok(Receiver::Value(JavaType::Class(self.super_of_frame()))),
            "field_access" => self.field_access(node, record),
            "method_invocation" => self.method_invocation(node, record),
            "method_reference" => self.method_reference(node, record),
            "parenthesized_expression" => match named_children(node).into_iter().next() {
                Some(inner) => self.expr(inner, record),
                None => Err(ResolveError::UnsupportedExpression(self.text(node).to_string())),
            },
            "array_access" => {
                let array = node
                    .child_by_field_name("array")
                    .ok_or_else(|| ResolveError::UnsupportedExpression(self.text(node).to_string()))?;
                let receiver = self.expr(array, record);
                if record {
                    if let Some(index) = node.child_by_field_name("index") {
                        self.visit(index);
                    }
                }
                match receiver? {
                    Receiver::Value(JavaType::Array(element)) => Ok(Receiver::Value(*element)),
                    _ => Err(ResolveError::NotAClassType(self.text(array).to_string())),
                }
            }
            "cast_expression" => {
                if record {
                    if let Some(value) = node.child_by_field_name("value") {
                        self.visit(value);
                    }
                }
                self.typed(node.child_by_field_name("type"))
            }
            "object_creation_expression" => {
                if record {
                    self.visit_object_creation(node);
                }
                self.typed(node.child_by_field_name("type"))
            }
            "array_creation_expression" => {
                if record {
                    self.visit_children(node);
                }
                let dims: usize = named_children(node)
                    .iter()
                    .filter(|n| matches!(n.kind(), "dimensions_expr" | "dimensions"))
                    .map(|n| self.text(*n).matches('[').count())
                    .sum();
                let element = self.typed(node.child_by_field_name("type"))?;
                match element {
                    Receiver::Value(ty) => Ok(Receiver::Value(ty.array_of(dims))),
                    other => Ok(other),
                }
            }
            "string_literal" => Ok(Receiver::Value(JavaType::Class("java/lang/String".to_string()))),
            "class_literal" => Ok(Receiver::Value(JavaType::Class("java/lang/Class".to_string()))),
            _ => {
                if record {
                    self.visit(node);
                }
                Err(ResolveError::UnsupportedExpression(self.text(node).to_string()))
            }
        }
    }

    fn typed(&self, type_node: Option<Node<'a>>) -> Result<Receiver, ResolveError> {
        let type_node =
            type_node.ok_or_else(|| ResolveError::UnsupportedExpression(String::new()))?;
        self.resolve_type_node(type_node)
            .map(Receiver::Value)
            .ok_or_else(|| ResolveError::UnsolvedType(type_text(type_node, self.source)))
    }

    /// A simple name: local, field of this or an enclosing class, inherited
    /// field, statically imported field, then type name
    fn identifier(&mut self, node: Node<'a>, record: bool) -> Result<Receiver, ResolveError> {
        let name = self.text(node);
        let variable = self
            .scope
            .lookup_variable(name, |frame, field| self.inherited_field(&frame.path, &frame.members, field));
        match variable {
            Some(Variable::Local(ty)) => {
                return ty
                    .map(Receiver::Value)
                    .ok_or_else(|| ResolveError::UnsupportedExpression(name.to_string()))
            }
            Some(Variable::Field { declaring_type, ty }) => {
                if record {
                    self.record_reference(node, MemberKind::Field, &declaring_type);
                }
                return ty
                    .map(Receiver::Value)
                    .ok_or_else(|| ResolveError::UnsupportedExpression(name.to_string()));
            }
            None => {}
        }

        if let Some(found) = self.static_import(name, MemberKind::Field) {
            if record {
                self.record_reference(node, MemberKind::Field, &found.declaring_type);
            }
            return Ok(found.ty.map_or(Receiver::Opaque, Receiver::Value));
        }
        match self.resolve_simple_type(name) {
            Some(path) => Ok(Receiver::Static(path)),
            None => Ok(Receiver::Name(name.to_string())),
        }
    }

    /// A field inherited by the class at `path`, when its type is known
    fn inherited_field(
        &self,
        path: &str,
        members: &LocalType,
        name: &str,
    ) -> Option<(String, Option<JavaType>)> {
        let found = if self.solver.has_type(path) {
            self.solver.find_member(path, name, MemberKind::Field).ok()
        } else {
            self.supertypes(members)
                .iter()
                .find_map(|sup| self.member_owner(sup, name, MemberKind::Field, 0).ok().filter(|m| m.ty.is_some()))
        };
        found
            .filter(|m| m.ty.is_some())
            .map(|m| (m.declaring_type, m.ty))
    }

    fn supertypes(&self, local: &LocalType) -> Vec<String> {
        let mut supers: Vec<String> = local
            .super_class
            .iter()
            .chain(local.interfaces.iter())
            .cloned()
            .collect();
        if local.super_class.is_none() {
            supers.push("java/lang/Object".to_string());
        }
        supers
    }

    /// A statically imported member. A single-member import names the
    /// member outright; on-demand imports only count when it is found.
    fn static_import(&self, name: &str, kind: MemberKind) -> Option<MemberMatch> {
        let single = self
            .imports
            .static_owner(name)
            .and_then(|owner| self.resolve_absolute(owner))
            .and_then(|owner| self.member_owner(&owner, name, kind, 0).ok());
        if single.is_some() {
            return single;
        }

        self.imports
            .static_on_demand()
            .iter()
            .filter_map(|owner| self.resolve_absolute(owner))
            .find_map(|owner| {
                self.member_owner(&owner, name, kind, 0)
                    .ok()
                    .filter(|m| m.ty.is_some())
            })
    }

    fn super_of_frame(&self) -> String {
        self.scope
            .frame()
            .and_then(|frame| frame.members.super_class.clone())
            .unwrap_or_else(|| "java/lang/Object".to_string())
    }

    fn field_access(&mut self, node: Node<'a>, record: bool) -> Result<Receiver, ResolveError> {
        let (Some(object), Some(field)) =
            (node.child_by_field_name("object"), node.child_by_field_name("field"))
        else {
            return Err(ResolveError::UnsupportedExpression(self.text(node).to_string()));
        };

        // Outer.this
        if field.kind() == "this" {
            return match self.expr(object, false)? {
                Receiver::Static(path) => Ok(Receiver::Value(JavaType::Class(path))),
                _ => Err(ResolveError::UnsupportedExpression(self.text(node).to_string())),
            };
        }

        let receiver = self.expr(object, record)?;
        let name = self.text(field);
        match receiver {
            Receiver::Name(prefix) => {
                let dotted = format!("{}.{}", prefix, name);
                Ok(match self.resolve_absolute(&dotted) {
                    Some(path) => Receiver::Static(path),
                    None => Receiver::Name(dotted),
                })
            }
            Receiver::Static(path) => {
                let nested = format!("{}${}", path, name);
                if self.type_known(&nested) {
                    return Ok(Receiver::Static(nested));
                }
                self.member_access(&path, field, MemberKind::Field, record)
            }
            Receiver::Value(JavaType::Array(_)) if name == "length" => {
                Ok(Receiver::Value(JavaType::Primitive("int".to_string())))
            }
            Receiver::Value(ty) => {
                let path = ty
                    .class_path()
                    .ok_or_else(|| ResolveError::NotAClassType(ty.to_string()))?
                    .to_string();
                self.member_access(&path, field, MemberKind::Field, record)
            }
            Receiver::Opaque => Err(ResolveError::UnsupportedExpression(self.text(object).to_string())),
        }
    }

    fn method_invocation(&mut self, node: Node<'a>, record: bool) -> Result<Receiver, ResolveError> {
        let Some(name_node) = node.child_by_field_name("name") else {
            return Err(ResolveError::UnsupportedExpression(self.text(node).to_string()));
        };

        let result = match node.child_by_field_name("object") {
            Some(object) => self
                .expr(object, record)
                .and_then(|receiver| self.method_on(receiver, object, name_node, record)),
            None => self.implicit_method(self.text(name_node)).map(|found| {
                if record {
                    self.record_reference(name_node, MemberKind::Method, &found.declaring_type);
                }
                found.ty.map_or(Receiver::Opaque, Receiver::Value)
            }),
        };

        if record {
            if let Some(arguments) = node.child_by_field_name("arguments") {
                self.visit(arguments);
            }
        }
        result
    }

    fn method_on(
        &mut self,
        receiver: Receiver,
        object: Node<'a>,
        name_node: Node<'a>,
        record: bool,
    ) -> Result<Receiver, ResolveError> {
        match receiver {
            Receiver::Static(path) => self.member_access(&path, name_node, MemberKind::Method, record),
            Receiver::Value(JavaType::Class(path)) => {
                self.member_access(&path, name_node, MemberKind::Method, record)
            }
            // clone() and the Object methods of arrays are not class references
            Receiver::Value(JavaType::Array(_)) => Ok(Receiver::Opaque),
            Receiver::Value(ty) => Err(ResolveError::NotAClassType(ty.to_string())),
            Receiver::Name(name) => Err(ResolveError::UnsolvedType(name)),
            Receiver::Opaque => Err(ResolveError::UnsupportedExpression(self.text(object).to_string())),
        }
    }

    fn method_reference(&mut self, node: Node<'a>, record: bool) -> Result<Receiver, ResolveError> {
        let parts = named_children(node);
        let (Some(qualifier), Some(last)) = (parts.first().copied(), parts.last().copied()) else {
            return Err(ResolveError::UnsupportedExpression(self.text(node).to_string()));
        };

        let receiver = if is_type_kind(qualifier.kind()) {
            match self.resolve_type_node(qualifier) {
                Some(JavaType::Class(path)) => Receiver::Static(path),
                Some(ty) => Receiver::Value(ty),
                None => return Err(ResolveError::UnsolvedType(type_text(qualifier, self.source))),
            }
        } else {
            self.expr(qualifier, record)?
        };

        // Constructor references (`Foo::new`) name no member
        let is_constructor = children(node).last().is_some_and(|n| n.kind() == "new");
        if is_constructor || last == qualifier {
            return Ok(Receiver::Opaque);
        }

        let receiver = match receiver {
            Receiver::Static(path) => Receiver::Static(path),
            Receiver::Name(name) => match self.resolve_type_name(&name) {
                Some(path) => Receiver::Static(path),
                None => return Err(ResolveError::UnsolvedType(name)),
            },
            other => other,
        };
        self.method_on(receiver, qualifier, last, record)?;
        Ok(Receiver::Opaque)
    }

    /// Method call without a receiver: this class, its outer classes, then
    /// static imports. A hierarchy that leaves the known types claims the
    /// name for the class that inherits it when nothing else does.
    fn implicit_method(&self, name: &str) -> Result<MemberMatch, ResolveError> {
        let mut open = None;
        for frame in self.scope.frames() {
            if let Some(ty) = frame.members.methods.get(name) {
                return Ok(MemberMatch {
                    declaring_type: frame.path.clone(),
                    ty: ty.clone(),
                });
            }
            let inherited = if self.solver.has_type(&frame.path) {
                self.solver.find_member(&frame.path, name, MemberKind::Method).ok()
            } else {
                self.supertypes(&frame.members)
                    .iter()
                    .find_map(|sup| self.member_owner(sup, name, MemberKind::Method, 0).ok())
            };
            match inherited {
                Some(found) if found.ty.is_some() => return Ok(found),
                Some(_) if open.is_none() => {
                    open = Some(MemberMatch {
                        declaring_type: frame.path.clone(),
                        ty: None,
                    })
                }
                _ => {}
            }
        }

        self.static_import(name, MemberKind::Method)
            .or(open)
            .ok_or_else(|| ResolveError::UnsolvedMember {
                owner: self.scope.frame().map(|f| f.path.clone()).unwrap_or_default(),
                member: name.to_string(),
            })
    }

    /// Resolve `name` on `path`, recording a class reference when the member
    /// belongs to a type other than the innermost enclosing class
    fn member_access(
        &mut self,
        path: &str,
        name_node: Node<'a>,
        kind: MemberKind,
        record: bool,
    ) -> Result<Receiver, ResolveError> {
        let found = self.member_owner(path, self.text(name_node), kind, 0)?;
        if record {
            self.record_reference(name_node, kind, &found.declaring_type);
        }
        Ok(found.ty.map_or(Receiver::Opaque, Receiver::Value))
    }

    fn record_reference(&mut self, name_node: Node<'a>, kind: MemberKind, declaring_type: &str) {
        let enclosing = self.scope.frame().map(|frame| frame.path.as_str());
        if enclosing == Some(declaring_type) {
            return;
        }
        let name = self.text(name_node);
        self.table.insert(
            name,
            Location::ClassReference {
                member: name.to_string(),
                member_kind: kind,
                owner_type: declaring_type.to_string(),
                owner: self.owner(),
                span: Span::of(name_node),
            },
        );
    }

    /// Find the type declaring `name`, preferring declarations in this source
    fn member_owner(
        &self,
        path: &str,
        name: &str,
        kind: MemberKind,
        depth: usize,
    ) -> Result<MemberMatch, ResolveError> {
        if depth > MAX_HIERARCHY_DEPTH {
            return Err(ResolveError::UnsolvedType(path.to_string()));
        }

        if let Some(local) = self.scope.local_type(path) {
            let members = match kind {
                MemberKind::Field => &local.fields,
                MemberKind::Method => &local.methods,
            };
            if let Some(ty) = members.get(name) {
                return Ok(MemberMatch {
                    declaring_type: path.to_string(),
                    ty: ty.clone(),
                });
            }

            if !self.solver.has_type(path) {
                let mut open = false;
                for sup in self.supertypes(local) {
                    match self.member_owner(&sup, name, kind, depth + 1) {
                        Ok(found) => return Ok(found),
                        Err(ResolveError::UnsolvedMember { .. }) => {}
                        Err(_) => open = true,
                    }
                }
                return if open {
                    Ok(MemberMatch {
                        declaring_type: path.to_string(),
                        ty: None,
                    })
                } else {
                    Err(ResolveError::UnsolvedMember {
                        owner: path.to_string(),
                        member: name.to_string(),
                    })
                };
            }
        }

        self.solver.find_member(path, name, kind)
    }

    // ---- type names ----

    fn type_known(&self, path: &str) -> bool {
        self.solver.has_type(path) || self.scope.local_type(path).is_some()
    }

    fn resolve_type_node(&self, node: Node<'_>) -> Option<JavaType> {
        match node.kind() {
            "integral_type" | "floating_point_type" | "boolean_type" | "void_type" => {
                Some(JavaType::Primitive(self.text(node).to_string()))
            }
            "type_identifier" => {
                let name = self.text(node);
                if is_primitive(name) {
                    return Some(JavaType::Primitive(name.to_string()));
                }
                self.resolve_simple_type(name).map(JavaType::Class)
            }
            "scoped_type_identifier" => self
                .resolve_type_name(&erase_generics(&type_text(node, self.source)))
                .map(JavaType::Class),
            "generic_type" => named_children(node)
                .into_iter()
                .find(|n| matches!(n.kind(), "type_identifier" | "scoped_type_identifier"))
                .and_then(|base| self.resolve_type_node(base)),
            "array_type" => {
                let element = node.child_by_field_name("element")?;
                let dims = dimension_count(node.child_by_field_name("dimensions"), self.source);
                self.resolve_type_node(element).map(|ty| ty.array_of(dims))
            }
            "annotated_type" => named_children(node)
                .into_iter()
                .filter(|n| is_type_kind(n.kind()))
                .last()
                .and_then(|ty| self.resolve_type_node(ty)),
            _ => None,
        }
    }

    /// Resolve a simple type name: enclosing and nested types, types declared
    /// in this file, single-type imports, the current package, on-demand
    /// imports and finally `java.lang`
    fn resolve_simple_type(&self, name: &str) -> Option<String> {
        for frame in self.scope.frames() {
            if frame.name().rsplit('$').next() == Some(name) {
                return Some(frame.path.clone());
            }
            if let Some(path) = frame.nested.get(name) {
                return Some(path.clone());
            }
        }
        if let Some(path) = self.file_types.get(name) {
            return Some(path.clone());
        }
        if let Some(dotted) = self.imports.single_type(name) {
            return Some(
                self.resolve_absolute(dotted)
                    .unwrap_or_else(|| dotted.replace('.', "/")),
            );
        }

        let same_package = self.imports.in_package(name);
        if self.type_known(&same_package) {
            return Some(same_package);
        }
        if let Some(path) = self
            .imports
            .on_demand()
            .iter()
            .find_map(|prefix| self.resolve_absolute(&format!("{}.{}", prefix, name)))
        {
            return Some(path);
        }

        let lang = format!("java/lang/{}", name);
        self.type_known(&lang).then_some(lang)
    }

    /// Resolve a dotted name as written in source, where the first segment
    /// may itself be a type in scope (`Map.Entry`)
    fn resolve_type_name(&self, dotted: &str) -> Option<String> {
        let Some((first, rest)) = dotted.split_once('.') else {
            return self.resolve_simple_type(dotted);
        };
        if let Some(base) = self.resolve_simple_type(first) {
            return Some(format!("{}${}", base, rest.replace('.', "$")));
        }
        self.resolve_absolute(dotted)
    }

    /// Map a fully qualified dotted name onto a known internal path, trying
    /// every split between package and nested type segments
    fn resolve_absolute(&self, dotted: &str) -> Option<String> {
        let parts: Vec<&str> = dotted.split('.').collect();
        (0..parts.len()).rev().find_map(|split| {
            let nested = parts[split..].join("$");
            let path = if split == 0 {
                nested
            } else {
                format!("{}/{}", parts[..split].join("/"), nested)
            };
            self.type_known(&path).then_some(path)
        })
    }
}

fn signature(name: &str, parameters: &[Parameter<'_>]) -> String {
    let types: Vec<&str> = parameters.iter().map(|p| p.erased.as_str()).collect();
    format!("{}({})", name, types.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::LocationKind;
    use crate::resolve::classfile::fixture::ClassFileBuilder;
    use crate::resolve::classfile::parse_class;
    use crate::resolve::{RuntimeTypeSolver, TypeDeclaration};
    use std::sync::Arc;

    struct FixtureSolver(HashMap<String, TypeDeclaration>);

    impl TypeSolver for FixtureSolver {
        fn name(&self) -> &str {
            "fixture"
        }

        fn solve_type(&self, path: &str) -> Option<&TypeDeclaration> {
            self.0.get(path)
        }
    }

    fn solver(classes: &[Vec<u8>]) -> CombinedTypeSolver {
        let types = classes
            .iter()
            .map(|bytes| parse_class(bytes).unwrap())
            .map(|decl| (decl.path.clone(), decl))
            .collect();
        CombinedTypeSolver::new()
            .with_source(Arc::new(RuntimeTypeSolver::new()))
            .with_source(Arc::new(FixtureSolver(types)))
    }

    fn other_class() -> Vec<u8> {
        ClassFileBuilder::new("pkg/Other")
            .field("field", "I")
            .field("next", "Lpkg/Other;")
            .method("self", "()Lpkg/Other;")
            .method("compute", "(I)I")
            .build()
    }

    fn walk(source: &str, solver: &CombinedTypeSolver) -> (LocationTable, WalkStats) {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&tree_sitter_java::LANGUAGE.into())
            .unwrap();
        let tree = parser.parse(source, None).unwrap();
        assert!(!tree.root_node().has_error(), "fixture must parse cleanly");
        LocationVisitor::new(source, tree.root_node(), solver).walk().unwrap()
    }

    fn references(table: &LocationTable, member: &str) -> Vec<(String, MemberKind)> {
        table
            .locations_for(LocationKind::ClassReference, member)
            .iter()
            .filter_map(|location| match location {
                Location::ClassReference { owner_type, member_kind, .. } => {
                    Some((owner_type.clone(), *member_kind))
                }
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_declarations_are_classified() {
        let source = r#"
class A {
    int x;
    static String name = "a";

    A(int seed) { this.x = seed; }

    void m(int y, String... rest) {
        int z = y;
        for (String s : rest) { }
        try { } catch (RuntimeException e) { }
        Runnable r = () -> { int inner = 1; };
    }

    static { int boot = 0; }
}
"#;
        let (table, stats) = walk(source, &solver(&[]));

        assert_eq!(table.len(LocationKind::Field), 2);
        let methods: Vec<_> = table
            .iter(LocationKind::Method)
            .map(|l| match l {
                Location::Method { signature, return_type, .. } => (signature.clone(), return_type.clone()),
                _ => unreachable!(),
            })
            .collect();
        assert!(methods.contains(&("A(int)".to_string(), None)));
        assert!(methods.contains(&("m(int,String...)".to_string(), Some("void".to_string()))));

        match &table.locations_for(LocationKind::Parameter, "rest")[0] {
            Location::Parameter { type_name, method, .. } => {
                assert_eq!(type_name, "String...");
                assert_eq!(method, "m(int,String...)");
            }
            other => panic!("unexpected {other:?}"),
        }

        for local in ["z", "s", "e", "r", "inner"] {
            let found = table.locations_for(LocationKind::LocalVariable, local);
            assert_eq!(found.len(), 1, "local {local}");
            match &found[0] {
                Location::LocalVariable { method, owner, .. } => {
                    assert_eq!(method, "m(int,String...)");
                    assert_eq!(owner, "A");
                }
                other => panic!("unexpected {other:?}"),
            }
        }
        match &table.locations_for(LocationKind::LocalVariable, "boot")[0] {
            Location::LocalVariable { method, .. } => assert_eq!(method, "<clinit>"),
            other => panic!("unexpected {other:?}"),
        }

        assert_eq!(table.len(LocationKind::ClassReference), 0);
        assert_eq!(stats.unresolved, 0);
    }

    #[test]
    fn test_member_access_through_archive_types() {
        let source = r#"
package app;

import pkg.Other;

class A {
    private Other held;

    int read(Other other) {
        int a = other.field;
        int b = held.next.field;
        return other.self().compute(a + b);
    }
}
"#;
        let (table, stats) = walk(source, &solver(&[other_class()]));

        assert_eq!(references(&table, "field").len(), 2);
        assert_eq!(references(&table, "next"), vec![("pkg/Other".to_string(), MemberKind::Field)]);
        assert_eq!(references(&table, "self"), vec![("pkg/Other".to_string(), MemberKind::Method)]);
        assert_eq!(references(&table, "compute"), vec![("pkg/Other".to_string(), MemberKind::Method)]);
        assert_eq!(table.declaring_type_of_reference("field"), Some("pkg/Other"));
        // own field accessed implicitly is not a reference
        assert!(references(&table, "held").is_empty());
        assert_eq!(stats.unresolved, 0);
    }

    #[test]
    fn test_runtime_static_members() {
        let source = r#"
class A {
    void m() {
        System.out.println(Math.PI);
        java.lang.System.err.println("x");
    }
}
"#;
        let (table, stats) = walk(source, &solver(&[]));

        assert_eq!(references(&table, "out"), vec![("java/lang/System".to_string(), MemberKind::Field)]);
        assert_eq!(references(&table, "err"), vec![("java/lang/System".to_string(), MemberKind::Field)]);
        assert_eq!(references(&table, "println").len(), 2);
        assert!(references(&table, "println")
            .iter()
            .all(|(owner, _)| owner == "java/io/PrintStream"));
        assert_eq!(references(&table, "PI"), vec![("java/lang/Math".to_string(), MemberKind::Field)]);
        assert_eq!(stats.unresolved, 0);
    }

    #[test]
    fn test_unresolvable_receiver_is_skipped_and_counted() {
        let source = r#"
class A {
    int kept;

    void m(Mystery thing) {
        int v = thing.field;
        nowhere.call();
    }
}
"#;
        let (table, stats) = walk(source, &solver(&[]));

        assert_eq!(table.len(LocationKind::ClassReference), 0);
        assert_eq!(stats.unresolved, 2);
        assert_eq!(table.locations_for(LocationKind::Field, "kept").len(), 1);
        assert_eq!(table.locations_for(LocationKind::LocalVariable, "v").len(), 1);
    }

    #[test]
    fn test_inherited_member_is_attributed_to_declaring_type() {
        let base = ClassFileBuilder::new("pkg/Base").field("shared", "I").build();
        let child = ClassFileBuilder::new("pkg/Child").super_class("pkg/Base").build();
        let source = r#"
package app;

import pkg.Child;

class A extends Child {
    void m(Child other) {
        int x = other.shared;
        int y = this.shared;
        int z = super.shared;
        String s = other.toString();
    }
}
"#;
        let (table, stats) = walk(source, &solver(&[base, child]));

        let shared = references(&table, "shared");
        assert_eq!(shared.len(), 3);
        assert!(shared.iter().all(|(owner, _)| owner == "pkg/Base"));
        assert_eq!(
            references(&table, "toString"),
            vec![("java/lang/Object".to_string(), MemberKind::Method)]
        );
        assert_eq!(stats.unresolved, 0);
    }

    #[test]
    fn test_nested_and_anonymous_classes() {
        let source = r#"
class Outer {
    int count;

    static class Inner {
        int value;
        void touch(Outer outer) { outer.count++; }
    }

    void run() {
        Runnable r = new Runnable() {
            int ticks;
            public void run() { int local = ticks; }
        };
        Inner inner = new Inner();
        inner.value = 2;
    }
}
"#;
        let (table, stats) = walk(source, &solver(&[]));

        match &table.locations_for(LocationKind::Field, "ticks")[0] {
            Location::Field { owner, .. } => assert_eq!(owner, "Outer$1"),
            other => panic!("unexpected {other:?}"),
        }
        match &table.locations_for(LocationKind::LocalVariable, "local")[0] {
            Location::LocalVariable { owner, method, .. } => {
                assert_eq!(owner, "Outer$1");
                assert_eq!(method, "run()");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(references(&table, "count"), vec![("Outer".to_string(), MemberKind::Field)]);
        assert_eq!(references(&table, "value"), vec![("Outer$Inner".to_string(), MemberKind::Field)]);
        assert_eq!(table.locations_for(LocationKind::Method, "run").len(), 2);
        assert_eq!(stats.unresolved, 0);
    }

    #[test]
    fn test_enum_record_and_pattern_bindings() {
        let source = r#"
enum Color { RED, GREEN; int rgb; }

record Point(int x, int y) {
    Point {
        int sum = x + y;
    }

    boolean same(Object o) {
        if (o instanceof Point p) { return p.x() == x; }
        try (var in = new java.io.FileInputStream("f")) { }
        return false;
    }
}
"#;
        let (table, _) = walk(source, &solver(&[]));

        match &table.locations_for(LocationKind::Field, "RED")[0] {
            Location::Field { type_name, owner, .. } => {
                assert_eq!(type_name, "Color");
                assert_eq!(owner, "Color");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(table.locations_for(LocationKind::Field, "x").len(), 1);
        assert_eq!(table.locations_for(LocationKind::Field, "y").len(), 1);

        match &table.locations_for(LocationKind::Method, "Point")[0] {
            Location::Method { signature, return_type, .. } => {
                assert_eq!(signature, "Point(int,int)");
                assert_eq!(return_type, &None);
            }
            other => panic!("unexpected {other:?}"),
        }
        match &table.locations_for(LocationKind::LocalVariable, "sum")[0] {
            Location::LocalVariable { method, .. } => assert_eq!(method, "Point(int,int)"),
            other => panic!("unexpected {other:?}"),
        }
        match &table.locations_for(LocationKind::LocalVariable, "p")[0] {
            Location::LocalVariable { type_name, .. } => assert_eq!(type_name.as_deref(), Some("Point")),
            other => panic!("unexpected {other:?}"),
        }
        match &table.locations_for(LocationKind::LocalVariable, "in")[0] {
            Location::LocalVariable { type_name, .. } => assert_eq!(type_name, &None),
            other => panic!("unexpected {other:?}"),
        }
        // p.x() is the enclosing record's own accessor
        assert!(references(&table, "x").is_empty());
    }

    #[test]
    fn test_bare_names_resolving_to_other_types_are_references() {
        let other = ClassFileBuilder::new("pkg/Other")
            .field("field", "I")
            .method("helper", "()I")
            .build();
        let source = r#"
package app;

import pkg.Other;
import static java.lang.Math.PI;

class A extends Other {
    int own;

    int m() {
        int a = field;
        double p = PI;
        own = a;
        return helper() + local();
    }

    int local() { return own; }
}
"#;
        let (table, stats) = walk(source, &solver(&[other]));

        assert_eq!(references(&table, "field"), vec![("pkg/Other".to_string(), MemberKind::Field)]);
        assert_eq!(references(&table, "PI"), vec![("java/lang/Math".to_string(), MemberKind::Field)]);
        assert_eq!(references(&table, "helper"), vec![("pkg/Other".to_string(), MemberKind::Method)]);
        assert!(references(&table, "own").is_empty());
        assert!(references(&table, "local").is_empty());
        assert!(references(&table, "a").is_empty());

        let field = table.locations_for(LocationKind::ClassReference, "field")[0].span();
        assert_eq!(&source[field.start_byte..field.end_byte], "field");
        assert_eq!(stats.unresolved, 0);
    }

    #[test]
    fn test_outer_members_used_from_inner_class() {
        let source = r#"
class Outer {
    int count;
    void bump() { }

    class Inner {
        void touch() {
            count++;
            bump();
        }
    }
}
"#;
        let (table, _) = walk(source, &solver(&[]));

        assert_eq!(references(&table, "count"), vec![("Outer".to_string(), MemberKind::Field)]);
        assert_eq!(references(&table, "bump"), vec![("Outer".to_string(), MemberKind::Method)]);
        match &table.locations_for(LocationKind::ClassReference, "count")[0] {
            Location::ClassReference { owner, .. } => assert_eq!(owner, "Outer$Inner"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_labels_and_annotation_keys_are_not_names() {
        let source = r#"
class A {
    int value;

    void m(int[] xs) {
        outer:
        for (int x : xs) {
            if (x < 0) continue outer;
            break outer;
        }
    }

    @SuppressWarnings(value = "unchecked")
    void n() { }
}
"#;
        let (table, stats) = walk(source, &solver(&[]));

        assert_eq!(table.len(LocationKind::ClassReference), 0);
        assert_eq!(stats.unresolved, 0);
    }

    #[test]
    fn test_unknown_receiverless_call_is_counted() {
        let source = "class A { void m() { missing(); } }";
        let (table, stats) = walk(source, &solver(&[]));

        assert_eq!(table.len(LocationKind::ClassReference), 0);
        assert_eq!(stats.unresolved, 1);
    }

    #[test]
    fn test_long_builder_chain_is_walked() {
        let calls = 10_000;
        let mut source = String::from("class A {\n    String m() {\n        return new StringBuilder()");
        for _ in 0..calls {
            source.push_str(".append(0)");
        }
        source.push_str(".toString();\n    }\n}\n");

        let (table, stats) = walk(&source, &solver(&[]));

        let appends = references(&table, "append");
        assert_eq!(appends.len(), calls);
        assert!(appends.iter().all(|(owner, _)| owner == "java/lang/StringBuilder"));
        assert_eq!(stats.unresolved, 0);
    }

    #[test]
    fn test_nesting_past_the_limit_fails_the_walk() {
        let mut source = String::from("class A { Object m() { return new StringBuilder()");
        for _ in 0..MAX_NESTING_DEPTH + 100 {
            source.push_str(".append(0)");
        }
        source.push_str("; } }");

        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&tree_sitter_java::LANGUAGE.into())
            .unwrap();
        let tree = parser.parse(&source, None).unwrap();
        let result = LocationVisitor::new(&source, tree.root_node(), &solver(&[])).walk();

        match result {
            Err(ParseError::NestingTooDeep { line, limit, .. }) => {
                assert_eq!(line, 1);
                assert_eq!(limit, MAX_NESTING_DEPTH);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_pattern_bindings_are_locals() {
        let source = r#"
record P(int x, int y) { }

class A {
    int m(Object o) {
        if (o instanceof P(int px, var py)) {
            return px + py;
        }
        return switch (o) {
            case String s -> s.length();
            case Integer i when i > 0 -> i;
            default -> 0;
        };
    }
}
"#;
        let (table, stats) = walk(source, &solver(&[]));

        for (name, type_name) in [
            ("px", Some("int")),
            ("py", None),
            ("s", Some("String")),
            ("i", Some("Integer")),
        ] {
            let found = table.locations_for(LocationKind::LocalVariable, name);
            assert_eq!(found.len(), 1, "local {name}");
            match &found[0] {
                Location::LocalVariable { type_name: recorded, method, owner, .. } => {
                    assert_eq!(recorded.as_deref(), type_name, "local {name}");
                    assert_eq!(method, "m(Object)");
                    assert_eq!(owner, "A");
                }
                other => panic!("unexpected {other:?}"),
            }
        }
        // the binding types the receiver of s.length()
        assert_eq!(
            references(&table, "length"),
            vec![("java/lang/String".to_string(), MemberKind::Method)]
        );
        assert_eq!(stats.unresolved, 0);
    }

    #[test]
    fn test_spans_point_at_name_tokens() {
        let source = "class A {\n    int x;\n    void m(int y) { int z = y; }\n}\n";
        let (table, _) = walk(source, &solver(&[]));

        let x = table.locations_for(LocationKind::Field, "x")[0].span();
        assert_eq!((x.line, x.column, x.end_column), (2, 9, 10));
        assert_eq!(&source[x.start_byte..x.end_byte], "x");

        let z = table.locations_for(LocationKind::LocalVariable, "z")[0].span();
        assert_eq!(z.line, 3);
        assert_eq!(&source[z.start_byte..z.end_byte], "z");
    }
}
