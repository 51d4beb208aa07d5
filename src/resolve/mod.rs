// Type resolution for member accesses found in decompiled sources.
//
// Sources are consulted in a fixed order: the runtime library first, then the
// classes of the archive the source was decompiled from. The runtime library
// is read from an installed JDK when one is found, else from a built-in table.

pub mod archive;
pub mod classfile;
pub mod jdk;
pub mod runtime;

use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::ResolutionConfig;

pub use archive::{ArchiveError, ArchiveTypeSolver};
pub use jdk::JdkTypeSolver;
pub use runtime::RuntimeTypeSolver;

/// A resolved Java type. Class types use internal paths (`java/lang/String`,
/// `pkg/Outer$Inner`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JavaType {
    Primitive(String),
    Class(String),
    Array(Box<JavaType>),
}

impl JavaType {
    pub fn class_path(&self) -> Option<&str> {
        match self {
            JavaType::Class(path) => Some(path),
            _ => None,
        }
    }

    pub fn element_type(&self) -> Option<&JavaType> {
        match self {
            JavaType::Array(element) => Some(element),
            _ => None,
        }
    }

    pub fn array_of(self, dimensions: usize) -> JavaType {
        (0..dimensions).fold(self, |ty, _| JavaType::Array(Box::new(ty)))
    }
}

impl fmt::Display for JavaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JavaType::Primitive(name) => write!(f, "{}", name),
            JavaType::Class(path) => write!(f, "{}", path),
            JavaType::Array(element) => write!(f, "{}[]", element),
        }
    }
}

/// Member kinds a reference can point at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberKind {
    Field,
    Method,
}

impl MemberKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberKind::Field => "field",
            MemberKind::Method => "method",
        }
    }
}

/// A field (with its type) or a method (with its return type)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberDeclaration {
    pub name: String,
    pub ty: JavaType,
}

impl MemberDeclaration {
    pub fn new(name: impl Into<String>, ty: JavaType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// What a symbol source knows about one type.
///
/// `complete` is false when the member lists only cover part of the real
/// surface, in which case a missing member is not proof that it doesn't exist.
#[derive(Debug, Clone)]
pub struct TypeDeclaration {
    pub path: String,
    pub super_class: Option<String>,
    pub interfaces: Vec<String>,
    pub fields: Vec<MemberDeclaration>,
    pub methods: Vec<MemberDeclaration>,
    pub complete: bool,
}

impl TypeDeclaration {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            super_class: None,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            complete: true,
        }
    }

    pub fn member(&self, name: &str, kind: MemberKind) -> Option<&MemberDeclaration> {
        let members = match kind {
            MemberKind::Field => &self.fields,
            MemberKind::Method => &self.methods,
        };
        members.iter().find(|member| member.name == name)
    }
}

/// Why a single node could not be attributed to an owner type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("unsolved type `{0}`")]
    UnsolvedType(String),
    #[error("unsolved member `{member}` in {owner}")]
    UnsolvedMember { owner: String, member: String },
    #[error("`{0}` is not a class type")]
    NotAClassType(String),
    #[error("cannot determine the type of `{0}`")]
    UnsupportedExpression(String),
    #[error("expression nests deeper than {0} levels")]
    NestingTooDeep(usize),
}

/// A source of type declarations
pub trait TypeSolver: Send + Sync {
    fn name(&self) -> &str;

    fn solve_type(&self, path: &str) -> Option<&TypeDeclaration>;

    fn has_type(&self, path: &str) -> bool {
        self.solve_type(path).is_some()
    }
}

/// Result of a member lookup. `ty` is `None` when the member was attributed
/// to the qualifying type without finding its declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberMatch {
    pub declaring_type: String,
    pub ty: Option<JavaType>,
}

/// Ordered composition of type solvers; the first source that knows a path wins.
#[derive(Default, Clone)]
pub struct CombinedTypeSolver {
    sources: Vec<Arc<dyn TypeSolver>>,
}

impl CombinedTypeSolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, source: Arc<dyn TypeSolver>) -> Self {
        self.sources.push(source);
        self
    }

    /// Runtime library first (when enabled), then the archive at `path`
    pub fn for_archive(path: &Path, config: &ResolutionConfig) -> Result<Self, ArchiveError> {
        let mut solver = Self::new();
        if config.runtime_types {
            solver = match JdkTypeSolver::shared(config) {
                Some(jdk) => solver.with_source(jdk),
                None => {
                    debug!("No JDK found, using the built-in runtime table");
                    solver.with_source(Arc::new(RuntimeTypeSolver::new()))
                }
            };
        }
        let archive = ArchiveTypeSolver::open(path, config)?;
        Ok(solver.with_source(Arc::new(archive)))
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|source| source.name()).collect()
    }

    /// Find the type declaring `name`, searching super classes before interfaces.
    pub fn find_member(
        &self,
        owner: &str,
        name: &str,
        kind: MemberKind,
    ) -> Result<MemberMatch, ResolveError> {
        if !self.has_type(owner) {
            return Err(ResolveError::UnsolvedType(owner.to_string()));
        }

        let mut pending = VecDeque::from([owner.to_string()]);
        let mut seen = HashSet::new();
        let mut open_hierarchy = false;

        while let Some(path) = pending.pop_front() {
            if !seen.insert(path.clone()) {
                continue;
            }

            let Some(declaration) = self.solve_type(&path) else {
                // Hierarchy leaves every known source
                open_hierarchy = true;
                continue;
            };

            if let Some(member) = declaration.member(name, kind) {
                return Ok(MemberMatch {
                    declaring_type: declaration.path.clone(),
                    ty: Some(member.ty.clone()),
                });
            }

            if !declaration.complete {
                open_hierarchy = true;
            }
            if let Some(super_class) = &declaration.super_class {
                pending.push_back(super_class.clone());
            }
            pending.extend(declaration.interfaces.iter().cloned());
        }

        if open_hierarchy {
            Ok(MemberMatch {
                declaring_type: owner.to_string(),
                ty: None,
            })
        } else {
            Err(ResolveError::UnsolvedMember {
                owner: owner.to_string(),
                member: name.to_string(),
            })
        }
    }
}

impl TypeSolver for CombinedTypeSolver {
    fn name(&self) -> &str {
        "combined"
    }

    fn solve_type(&self, path: &str) -> Option<&TypeDeclaration> {
        self.sources.iter().find_map(|source| source.solve_type(path))
    }
}

impl fmt::Debug for CombinedTypeSolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CombinedTypeSolver")
            .field("sources", &self.source_names())
            .finish()
    }
}
