// crates/woodshop-schema/src/issue.rs
// ============================================================================
// Module: Validation Issues
// Description: Path-addressed validation failures.
// Purpose: Report every value mismatch with a stable location string.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! An [`Issue`] pairs a dot-joined location with a message. Locations are
//! built incrementally with [`IssuePath`] while the validator descends; object
//! keys and array indices are both rendered as plain segments, so the third
//! element of `parts` is reported as `parts.2`. The root location is the
//! empty string.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Issue
// ============================================================================

/// A single validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Dot-joined location of the failing value (empty for the root).
    pub path: String,
    /// Human-readable failure description.
    pub message: String,
}

impl Issue {
    /// Creates an issue at the given location.
    #[must_use]
    pub fn new(path: &IssuePath, message: impl Into<String>) -> Self {
        Self {
            path: path.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

// ============================================================================
// SECTION: Issue Path
// ============================================================================

/// One step into a JSON value.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    /// Object member name.
    Key(String),
    /// Array position.
    Index(usize),
}

/// Location builder used while descending into a value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssuePath {
    /// Segments from the root to the current value.
    segments: Vec<Segment>,
}

impl IssuePath {
    /// Returns the root location.
    #[must_use]
    pub const fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Returns a child location for an object member.
    #[must_use]
    pub fn key(&self, key: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Key(key.to_string()));
        Self {
            segments,
        }
    }

    /// Returns a child location for an array element.
    #[must_use]
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Index(index));
        Self {
            segments,
        }
    }

    /// Returns true for the root location.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for IssuePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, segment) in self.segments.iter().enumerate() {
            if position > 0 {
                f.write_str(".")?;
            }
            match segment {
                Segment::Key(key) => f.write_str(key)?,
                Segment::Index(index) => write!(f, "{index}")?,
            }
        }
        Ok(())
    }
}
