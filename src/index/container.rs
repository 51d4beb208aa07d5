// Symbol index for one decompiled class

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use super::{IndexSummary, Location, LocationKind, LocationTable};
use crate::config::ResolutionConfig;
use crate::indexer::{self, ParseError};
use crate::resolve::{ArchiveError, CombinedTypeSolver};
use crate::resource::ResourceContainer;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("class `{0}` has already been parsed")]
    AlreadyParsed(String),
    #[error(transparent)]
    Archive(#[from] ArchiveError),
    #[error("indexing worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Outcome of a parse that reached the source text
#[derive(Debug)]
pub enum ParseStatus {
    Indexed(IndexSummary),
    /// The text was not valid Java; nothing was recorded
    Failed(ParseError),
}

impl ParseStatus {
    pub fn is_indexed(&self) -> bool {
        matches!(self, ParseStatus::Indexed(_))
    }
}

/// Decompiled source of one class together with the locations found in it.
///
/// `class_name` carries the decompiler as a suffix: `com/acme/Foo.class-CFR`.
#[derive(Debug)]
pub struct ClassFileContainer {
    class_name: String,
    content: String,
    parent_container: String,
    path: PathBuf,
    has_been_parsed: bool,
    parse_attempted: bool,
    table: LocationTable,
    unresolved: usize,
}

impl ClassFileContainer {
    pub fn new(
        class_name: impl Into<String>,
        content: impl Into<String>,
        parent: &ResourceContainer,
    ) -> Self {
        Self::with_archive(class_name, content, parent.name(), parent.file())
    }

    pub fn with_archive(
        class_name: impl Into<String>,
        content: impl Into<String>,
        parent_container: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            class_name: class_name.into(),
            content: content.into(),
            parent_container: parent_container.into(),
            path: path.into(),
            has_been_parsed: false,
            parse_attempted: false,
            table: LocationTable::new(),
            unresolved: 0,
        }
    }

    /// Index the content, resolving types against the runtime library and
    /// the owning archive. Only archive failures are returned as errors.
    pub fn parse(&mut self, config: &ResolutionConfig) -> Result<ParseStatus, IndexError> {
        self.begin_parse()?;
        let solver = CombinedTypeSolver::for_archive(&self.path, config)?;
        Ok(self.index_with(&solver))
    }

    /// Index the content against an already built solver
    pub fn parse_with(&mut self, solver: &CombinedTypeSolver) -> Result<ParseStatus, IndexError> {
        self.begin_parse()?;
        Ok(self.index_with(solver))
    }

    fn begin_parse(&mut self) -> Result<(), IndexError> {
        if self.parse_attempted {
            return Err(IndexError::AlreadyParsed(self.class_name.clone()));
        }
        self.parse_attempted = true;
        Ok(())
    }

    fn index_with(&mut self, solver: &CombinedTypeSolver) -> ParseStatus {
        match indexer::index_source(&self.content, solver) {
            Ok((table, stats)) => {
                self.table = table;
                self.unresolved = stats.unresolved;
                self.has_been_parsed = true;

                let summary = self.summary();
                info!("Indexed {}: {}", self.class_name, summary);
                ParseStatus::Indexed(summary)
            }
            Err(e) => {
                warn!("Failed to parse {}: {}", self.class_name, e);
                ParseStatus::Failed(e)
            }
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// `Foo` for `com/acme/Foo.class-CFR`
    pub fn simple_name(&self) -> &str {
        let (base, _) = self.split_decompiler();
        let file = base.rsplit('/').next().unwrap_or(base);
        file.rsplit_once('.').map_or(file, |(name, _)| name)
    }

    /// `CFR` for `com/acme/Foo.class-CFR`, empty without a marker
    pub fn decompiler(&self) -> &str {
        self.split_decompiler().1
    }

    /// A `-` only marks the decompiler in the last path segment
    fn split_decompiler(&self) -> (&str, &str) {
        let file_start = self.class_name.rfind('/').map_or(0, |slash| slash + 1);
        match self.class_name[file_start..].rfind('-') {
            Some(dash) => {
                let dash = file_start + dash;
                (&self.class_name[..dash], &self.class_name[dash + 1..])
            }
            None => (self.class_name.as_str(), ""),
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn parent_container(&self) -> &str {
        &self.parent_container
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn has_been_parsed(&self) -> bool {
        self.has_been_parsed
    }

    pub fn locations_for(&self, kind: LocationKind, key: &str) -> &[Location] {
        self.table.locations_for(kind, key)
    }

    pub fn keys(&self, kind: LocationKind) -> impl Iterator<Item = &str> + '_ {
        self.table.keys(kind)
    }

    pub fn locations_at(&self, line: u32, column: u32) -> Vec<&Location> {
        self.table.locations_at(line, column)
    }

    pub fn declaring_type_of_reference(&self, member: &str) -> Option<&str> {
        self.table.declaring_type_of_reference(member)
    }

    pub fn summary(&self) -> IndexSummary {
        self.table.summary(self.unresolved)
    }
}
