use serde::{Deserialize, Serialize};

/// A point on the curve in function-space units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplePoint {
    pub x: f64,
    pub y: f64,
}

/// A run of consecutive samples that is drawn as one connected line.
/// Never empty: a segment is only ever opened with its first point.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Segment {
    points: Vec<SamplePoint>,
}

impl Segment {
    pub(crate) fn start(first: SamplePoint) -> Self {
        Self {
            points: vec![first],
        }
    }

    pub(crate) fn push(&mut self, point: SamplePoint) {
        self.points.push(point);
    }

    pub fn points(&self) -> &[SamplePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> SamplePoint {
        self.points[0]
    }

    pub fn last(&self) -> SamplePoint {
        self.points[self.points.len() - 1]
    }
}

/// The sampled curve of one expression.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurveData {
    expression: String,
    segments: Vec<Segment>,
    sample_count: usize,
    defined_count: usize,
}

impl CurveData {
    pub(crate) fn new(expression: &str, segments: Vec<Segment>, sample_count: usize) -> Self {
        let defined_count = segments.iter().map(Segment::len).sum();
        Self {
            expression: expression.to_string(),
            segments,
            sample_count,
            defined_count,
        }
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Samples taken across the domain, defined or not.
    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    /// Samples that produced a value and appear in some segment.
    pub fn defined_count(&self) -> usize {
        self.defined_count
    }

    /// All points in x order, ignoring segment breaks.
    pub fn points(&self) -> impl Iterator<Item = &SamplePoint> {
        self.segments.iter().flat_map(|segment| segment.points.iter())
    }
}
