use serde::{Deserialize, Serialize};

/// GeoJSON-style point geometry. An empty coordinate array stands for a
/// missing geometry, matching what the client application expects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointGeometry {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: Vec<f64>,
}

impl PointGeometry {
    pub fn point(x: f64, y: f64) -> Self {
        PointGeometry {
            kind: "Point".to_string(),
            coordinates: vec![x, y],
        }
    }

    pub fn empty() -> Self {
        PointGeometry {
            kind: "Point".to_string(),
            coordinates: Vec::new(),
        }
    }
}

impl Default for PointGeometry {
    fn default() -> Self {
        PointGeometry::empty()
    }
}
