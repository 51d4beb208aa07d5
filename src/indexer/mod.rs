// Source parsing and the location walk

pub mod imports;
pub mod parser;
pub mod scope;
pub mod types;
pub mod visitor;

pub use parser::{ParseError, SourceParser};
pub use visitor::{LocationVisitor, WalkStats, MAX_NESTING_DEPTH};

use crate::index::LocationTable;
use crate::resolve::CombinedTypeSolver;

/// Parse `content` and collect every location it declares or references
pub fn index_source(
    content: &str,
    solver: &CombinedTypeSolver,
) -> Result<(LocationTable, WalkStats), ParseError> {
    let mut parser = SourceParser::new()?;
    let tree = parser.parse(content)?;
    LocationVisitor::new(content, tree.root_node(), solver).walk()
}
