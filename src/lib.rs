//! Symbol navigation index for decompiled Java sources.
//!
//! Each decompiled class gets a [`ClassFileContainer`] that records where
//! fields, methods, parameters and locals are declared and which members of
//! other types the class references. Member owners are resolved against a
//! built-in runtime library and the classes of the archive the source was
//! decompiled from.

pub mod config;
pub mod index;
pub mod indexer;
pub mod resolve;
pub mod resource;

pub use config::Config;
pub use index::{ClassFileContainer, IndexError, IndexSummary, Location, LocationKind, ParseStatus, Span};
pub use indexer::ParseError;
pub use resolve::{CombinedTypeSolver, ResolveError, TypeSolver};
pub use resource::ResourceContainer;
