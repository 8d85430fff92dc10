//! Result Projection
//!
//! Flattens the engine's nested result set (documents, each with text lines)
//! into the caller-facing list of [`LineResult`]s.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Integer pixel coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Four corner points of a detected region, in engine order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Quadrilateral {
    pub points: [Point; 4],
}

impl Quadrilateral {
    pub fn new(points: [Point; 4]) -> Self {
        Self { points }
    }

    /// Corners flattened as `[x1, y1, x2, y2, x3, y3, x4, y4]`
    pub fn to_array(&self) -> [i32; 8] {
        let p = &self.points;
        [p[0].x, p[0].y, p[1].x, p[1].y, p[2].x, p[2].y, p[3].x, p[3].y]
    }
}

/// One text line as reported by the engine
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub text: String,
    pub confidence: i32,
    pub location: Quadrilateral,
}

/// One detected document and its text lines
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentResult {
    pub lines: Vec<TextLine>,
}

/// Native result set produced by a single recognition call.
///
/// Owned by whoever took it from the engine; dropping it releases it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    pub documents: Vec<DocumentResult>,
}

/// A recognized MRZ text line with its location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineResult {
    /// Recognized text
    pub text: String,
    /// Recognition confidence (0 - 100)
    pub confidence: u8,
    /// Corner points of the line
    pub location: Quadrilateral,
}

impl LineResult {
    fn from_line(line: TextLine) -> Self {
        Self {
            text: line.text,
            confidence: line.confidence.clamp(0, 100) as u8,
            location: line.location,
        }
    }

    /// Corners flattened as `[x1, y1, x2, y2, x3, y3, x4, y4]`
    pub fn corners(&self) -> [i32; 8] {
        self.location.to_array()
    }
}

impl fmt::Display for LineResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [x1, y1, x2, y2, x3, y3, x4, y4] = self.corners();
        write!(
            f,
            "{} (confidence {}) [({}, {}), ({}, {}), ({}, {}), ({}, {})]",
            self.text, self.confidence, x1, y1, x2, y2, x3, y3, x4, y4
        )
    }
}

/// Flatten a result set: documents in engine order, then lines in engine order.
///
/// A missing result set yields an empty list. The set is consumed, so it is
/// released before this returns.
pub fn project(results: Option<ResultSet>) -> Vec<LineResult> {
    let Some(results) = results else {
        return Vec::new();
    };

    results
        .documents
        .into_iter()
        .flat_map(|doc| doc.lines)
        .map(LineResult::from_line)
        .collect()
}
