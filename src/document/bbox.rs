use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Page region in fractional LTRB coordinates (top-left origin, values in 0..=1)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// 1-based page number
    pub page: u32,
    #[serde(rename = "l")]
    pub left: f64,
    #[serde(rename = "t")]
    pub top: f64,
    #[serde(rename = "r")]
    pub right: f64,
    #[serde(rename = "b")]
    pub bottom: f64,
    /// Line-level sub-boxes in reading order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub spans: Vec<BoundingBox>,
    /// Fields this crate does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BoundingBox {
    pub fn new(page: u32, left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            page,
            left,
            top,
            right,
            bottom,
            spans: Vec::new(),
            extra: Map::new(),
        }
    }

    pub fn with_spans(mut self, spans: Vec<BoundingBox>) -> Self {
        self.spans = spans;
        self
    }

    /// Copy of this box with line spans and passthrough fields removed
    pub fn outline(&self) -> Self {
        Self::new(self.page, self.left, self.top, self.right, self.bottom)
    }

    /// Coordinates are finite, inside the unit square and correctly ordered
    pub fn is_well_formed(&self) -> bool {
        let coords = [self.left, self.top, self.right, self.bottom];
        self.page >= 1
            && coords.iter().all(|v| v.is_finite() && (0.0..=1.0).contains(v))
            && self.left <= self.right
            && self.top <= self.bottom
    }
}
