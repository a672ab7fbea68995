//! Source locations attached to every declared entity and every diagnostic.

use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// A line/column span plus the file it was read from.
///
/// Lines and columns are both inclusive, 1-based, matching the convention
/// generated parsers use for token ranges.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StmtInfo {
    pub line_range: (u32, u32),
    pub column_range: (u32, u32),
    pub source_path: Rc<PathBuf>,
}

impl StmtInfo {
    pub fn new(
        line_range: (u32, u32),
        column_range: (u32, u32),
        source_path: Rc<PathBuf>,
    ) -> Self {
        StmtInfo {
            line_range,
            column_range,
            source_path,
        }
    }

    /// A single-point location, as produced for a single token such as an identifier.
    pub fn at_point(line: u32, column: u32, source_path: Rc<PathBuf>) -> Self {
        StmtInfo::new((line, line), (column, column), source_path)
    }

    pub fn source(&self) -> &Path {
        &self.source_path
    }
}

impl fmt::Display for StmtInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.source_path.display(),
            self.line_range.0,
            self.column_range.0
        )
    }
}
