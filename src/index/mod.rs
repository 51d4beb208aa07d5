// Per-class location index

pub mod container;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::resolve::MemberKind;

pub use container::{ClassFileContainer, IndexError, ParseStatus};

/// The five kinds of recorded occurrences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationKind {
    Field,
    Parameter,
    LocalVariable,
    Method,
    ClassReference,
}

impl LocationKind {
    pub const ALL: [LocationKind; 5] = [
        LocationKind::Field,
        LocationKind::Parameter,
        LocationKind::LocalVariable,
        LocationKind::Method,
        LocationKind::ClassReference,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LocationKind::Field => "field",
            LocationKind::Parameter => "parameter",
            LocationKind::LocalVariable => "local_variable",
            LocationKind::Method => "method",
            LocationKind::ClassReference => "class_reference",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for LocationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LocationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "field" | "fields" => Ok(LocationKind::Field),
            "parameter" | "param" | "parameters" => Ok(LocationKind::Parameter),
            "local_variable" | "local" | "locals" => Ok(LocationKind::LocalVariable),
            "method" | "methods" => Ok(LocationKind::Method),
            "class_reference" | "reference" | "ref" => Ok(LocationKind::ClassReference),
            other => Err(format!("unknown location kind: {}", other)),
        }
    }
}

/// Position of a name token. Lines and columns are 1-based; columns count bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start_byte: usize,
    pub end_byte: usize,
    pub line: u32,
    pub column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

impl Span {
    pub fn of(node: tree_sitter::Node<'_>) -> Self {
        let start = node.start_position();
        let end = node.end_position();
        Self {
            start_byte: node.start_byte(),
            end_byte: node.end_byte(),
            line: start.row as u32 + 1,
            column: start.column as u32 + 1,
            end_line: end.row as u32 + 1,
            end_column: end.column as u32 + 1,
        }
    }

    /// Whether the caret at `line`:`column` falls on this span (end exclusive)
    pub fn contains(&self, line: u32, column: u32) -> bool {
        (self.line, self.column) <= (line, column) && (line, column) < (self.end_line, self.end_column)
    }
}

/// One recorded occurrence. `owner` is the simple binary name of the
/// innermost enclosing class (`Foo`, `Foo$Inner`, `Foo$1`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Location {
    Field {
        name: String,
        type_name: String,
        owner: String,
        span: Span,
    },
    Method {
        name: String,
        signature: String,
        parameter_types: Vec<String>,
        return_type: Option<String>,
        owner: String,
        span: Span,
    },
    Parameter {
        name: String,
        type_name: String,
        method: String,
        owner: String,
        span: Span,
    },
    LocalVariable {
        name: String,
        type_name: Option<String>,
        method: String,
        owner: String,
        span: Span,
    },
    ClassReference {
        member: String,
        member_kind: MemberKind,
        owner_type: String,
        owner: String,
        span: Span,
    },
}

impl Location {
    pub fn kind(&self) -> LocationKind {
        match self {
            Location::Field { .. } => LocationKind::Field,
            Location::Method { .. } => LocationKind::Method,
            Location::Parameter { .. } => LocationKind::Parameter,
            Location::LocalVariable { .. } => LocationKind::LocalVariable,
            Location::ClassReference { .. } => LocationKind::ClassReference,
        }
    }

    /// Simple name the record is filed under
    pub fn key(&self) -> &str {
        match self {
            Location::Field { name, .. }
            | Location::Method { name, .. }
            | Location::Parameter { name, .. }
            | Location::LocalVariable { name, .. } => name,
            Location::ClassReference { member, .. } => member,
        }
    }

    pub fn span(&self) -> &Span {
        match self {
            Location::Field { span, .. }
            | Location::Method { span, .. }
            | Location::Parameter { span, .. }
            | Location::LocalVariable { span, .. }
            | Location::ClassReference { span, .. } => span,
        }
    }

    pub fn owner(&self) -> &str {
        match self {
            Location::Field { owner, .. }
            | Location::Method { owner, .. }
            | Location::Parameter { owner, .. }
            | Location::LocalVariable { owner, .. }
            | Location::ClassReference { owner, .. } => owner,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let span = self.span();
        write!(f, "{}:{} ", span.line, span.column)?;
        match self {
            Location::Field { name, type_name, owner, .. } => {
                write!(f, "field {} {}.{}", type_name, owner, name)
            }
            Location::Method { signature, return_type, owner, .. } => match return_type {
                Some(ret) => write!(f, "method {} {}.{}", ret, owner, signature),
                None => write!(f, "constructor {}.{}", owner, signature),
            },
            Location::Parameter { name, type_name, method, .. } => {
                write!(f, "parameter {} {} in {}", type_name, name, method)
            }
            Location::LocalVariable { name, type_name, method, .. } => write!(
                f,
                "local {} {} in {}",
                type_name.as_deref().unwrap_or("var"),
                name,
                method
            ),
            Location::ClassReference { member, member_kind, owner_type, .. } => {
                write!(f, "reference {} {}.{}", member_kind.as_str(), owner_type, member)
            }
        }
    }
}

/// Record counts per kind, plus member accesses that could not be attributed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSummary {
    pub fields: usize,
    pub parameters: usize,
    pub local_variables: usize,
    pub methods: usize,
    pub class_references: usize,
    pub unresolved: usize,
}

impl IndexSummary {
    pub fn total(&self) -> usize {
        self.fields + self.parameters + self.local_variables + self.methods + self.class_references
    }
}

impl fmt::Display for IndexSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} fields, {} methods, {} parameters, {} locals, {} references ({} unresolved)",
            self.fields,
            self.methods,
            self.parameters,
            self.local_variables,
            self.class_references,
            self.unresolved
        )
    }
}

/// Location records keyed by simple name, one ordered map per kind
#[derive(Debug, Clone, Default)]
pub struct LocationTable {
    maps: [BTreeMap<String, Vec<Location>>; 5],
}

impl LocationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `location` under `key` in the map for its kind
    pub fn insert(&mut self, key: impl Into<String>, location: Location) {
        self.maps[location.kind().index()]
            .entry(key.into())
            .or_default()
            .push(location);
    }

    pub fn locations_for(&self, kind: LocationKind, key: &str) -> &[Location] {
        self.maps[kind.index()]
            .get(key)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn keys(&self, kind: LocationKind) -> impl Iterator<Item = &str> + '_ {
        self.maps[kind.index()].keys().map(String::as_str)
    }

    /// All records of one kind, by key then insertion order
    pub fn iter(&self, kind: LocationKind) -> impl Iterator<Item = &Location> + '_ {
        self.maps[kind.index()].values().flatten()
    }

    /// Number of records of one kind
    pub fn len(&self, kind: LocationKind) -> usize {
        self.maps[kind.index()].values().map(Vec::len).sum()
    }

    pub fn total(&self) -> usize {
        LocationKind::ALL.iter().map(|kind| self.len(*kind)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.iter().all(BTreeMap::is_empty)
    }

    /// Owner type path of the first recorded reference to `member`
    pub fn declaring_type_of_reference(&self, member: &str) -> Option<&str> {
        self.locations_for(LocationKind::ClassReference, member)
            .iter()
            .find_map(|location| match location {
                Location::ClassReference { owner_type, .. } => Some(owner_type.as_str()),
                _ => None,
            })
    }

    /// Records whose name token covers the given caret position
    pub fn locations_at(&self, line: u32, column: u32) -> Vec<&Location> {
        LocationKind::ALL
            .iter()
            .flat_map(|kind| self.iter(*kind))
            .filter(|location| location.span().contains(line, column))
            .collect()
    }

    pub fn summary(&self, unresolved: usize) -> IndexSummary {
        IndexSummary {
            fields: self.len(LocationKind::Field),
            parameters: self.len(LocationKind::Parameter),
            local_variables: self.len(LocationKind::LocalVariable),
            methods: self.len(LocationKind::Method),
            class_references: self.len(LocationKind::ClassReference),
            unresolved,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn span(line: u32, column: u32, len: u32) -> Span {
        Span {
            start_byte: 0,
            end_byte: len as usize,
            line,
            column,
            end_line: line,
            end_column: column + len,
        }
    }

    fn local(name: &str, line: u32) -> Location {
        Location::LocalVariable {
            name: name.to_string(),
            type_name: Some("int".to_string()),
            method: "m()".to_string(),
            owner: "A".to_string(),
            span: span(line, 5, name.len() as u32),
        }
    }

    fn reference(member: &str, owner_type: &str, line: u32) -> Location {
        Location::ClassReference {
            member: member.to_string(),
            member_kind: MemberKind::Field,
            owner_type: owner_type.to_string(),
            owner: "A".to_string(),
            span: span(line, 10, member.len() as u32),
        }
    }

    #[test]
    fn test_absent_keys_are_empty_for_every_kind() {
        let mut table = LocationTable::new();
        table.insert("z", local("z", 1));

        for kind in LocationKind::ALL {
            assert!(table.locations_for(kind, "missing").is_empty());
        }
        assert_eq!(table.declaring_type_of_reference("missing"), None);
        assert!(!table.is_empty());
    }

    #[test]
    fn test_declaring_type_uses_first_reference() {
        let mut table = LocationTable::new();
        table.insert("field", reference("field", "pkg/Other", 3));
        table.insert("field", reference("field", "pkg/Third", 4));

        assert_eq!(table.declaring_type_of_reference("field"), Some("pkg/Other"));
        assert_eq!(table.len(LocationKind::ClassReference), 2);
        assert_eq!(table.len(LocationKind::Field), 0);
    }

    #[test]
    fn test_locations_at_caret() {
        let mut table = LocationTable::new();
        table.insert("count", local("count", 2));
        table.insert("field", reference("field", "pkg/Other", 2));

        let hits = table.locations_at(2, 7);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].key(), "count");

        // end column is exclusive
        assert!(table.locations_at(2, 10).iter().all(|l| l.key() == "field"));
        assert!(table.locations_at(2, 15).is_empty());
        assert!(table.locations_at(3, 5).is_empty());
    }

    #[test]
    fn test_kind_names_round_trip() {
        for kind in LocationKind::ALL {
            assert_eq!(kind.as_str().parse::<LocationKind>().unwrap(), kind);
        }
        assert_eq!("local".parse::<LocationKind>().unwrap(), LocationKind::LocalVariable);
        assert!("class".parse::<LocationKind>().is_err());
    }

    #[test]
    fn test_summary_counts() {
        let mut table = LocationTable::new();
        table.insert("a", local("a", 1));
        table.insert("b", local("b", 2));
        table.insert("f", reference("f", "pkg/Other", 3));

        let summary = table.summary(2);
        assert_eq!(summary.local_variables, 2);
        assert_eq!(summary.class_references, 1);
        assert_eq!(summary.total(), 3);
        assert_eq!(summary.unresolved, 2);
    }

    proptest! {
        #[test]
        fn prop_insertion_order_is_preserved(keys in proptest::collection::vec("[a-d]", 0..40)) {
            let mut table = LocationTable::new();
            for (line, key) in keys.iter().enumerate() {
                table.insert(key.clone(), local(key, line as u32 + 1));
            }

            for key in ["a", "b", "c", "d"] {
                let expected: Vec<u32> = keys
                    .iter()
                    .enumerate()
                    .filter(|(_, k)| k.as_str() == key)
                    .map(|(line, _)| line as u32 + 1)
                    .collect();
                let actual: Vec<u32> = table
                    .locations_for(LocationKind::LocalVariable, key)
                    .iter()
                    .map(|l| l.span().line)
                    .collect();
                prop_assert_eq!(actual, expected);
            }
            prop_assert_eq!(table.len(LocationKind::LocalVariable), keys.len());
        }
    }
}
