//! Source location types
//!
//! These types represent positions in source code. Every graph node may
//! carry a [`PhysicalLocation`], i.e. the artifact (file) it came from plus
//! the line/column region inside it.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Single location in source code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

impl Location {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// Span in source code, bounded by two [`Location`]s
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: Location,
    pub end: Location,
}

impl Span {
    pub fn new(start_line: u32, start_col: u32, end_line: u32, end_col: u32) -> Self {
        Self {
            start: Location::new(start_line, start_col),
            end: Location::new(end_line, end_col),
        }
    }

    /// Create a zero span (0:0-0:0)
    pub fn zero() -> Self {
        Self::new(0, 0, 0, 0)
    }

    pub fn contains_line(&self, line: u32) -> bool {
        self.start.line <= line && line <= self.end.line
    }

    pub fn contains(&self, other: &Span) -> bool {
        self.start.line <= other.start.line && other.end.line <= self.end.line
    }
}

impl Default for Span {
    fn default() -> Self {
        Self::zero()
    }
}

/// A span inside a concrete source artifact
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PhysicalLocation {
    pub artifact: PathBuf,
    pub region: Span,
}

impl PhysicalLocation {
    pub fn new(artifact: impl Into<PathBuf>, region: Span) -> Self {
        Self {
            artifact: artifact.into(),
            region,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_contains_line() {
        let span = Span::new(10, 0, 20, 0);
        assert!(span.contains_line(10));
        assert!(span.contains_line(15));
        assert!(span.contains_line(20));
        assert!(!span.contains_line(9));
        assert!(!span.contains_line(21));
    }

    #[test]
    fn test_span_endpoints_are_locations() {
        let span = Span::new(3, 4, 5, 6);
        assert_eq!(span.start, Location::new(3, 4));
        assert_eq!(span.end, Location::new(5, 6));
    }

    #[test]
    fn test_span_contains() {
        let outer = Span::new(1, 0, 100, 0);
        let inner = Span::new(10, 4, 12, 8);
        assert!(outer.contains(&inner));
        assert!(!inner.contains(&outer));
    }
}
