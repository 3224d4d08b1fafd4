//! SubscriptionRequest - Connection Manager input
//!
//! Sent once, as the first outbound message, on every successful handshake.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Geographic bounding box given by two `[lat, lon]` corners
///
/// Serializes as `[[lat, lon], [lat, lon]]`. Corner order is not significant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox(pub [[f64; 2]; 2]);

impl BoundingBox {
    /// Box spanning the full coordinate range
    pub const WORLD: BoundingBox = BoundingBox([[-90.0, -180.0], [90.0, 180.0]]);

    pub fn new(corner_a: (f64, f64), corner_b: (f64, f64)) -> Self {
        Self([[corner_a.0, corner_a.1], [corner_b.0, corner_b.1]])
    }

    /// Corners as `(lat, lon)` pairs
    pub fn corners(&self) -> [(f64, f64); 2] {
        let [[lat_a, lon_a], [lat_b, lon_b]] = self.0;
        [(lat_a, lon_a), (lat_b, lon_b)]
    }

    /// Whether the point lies inside the box (edges inclusive)
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        let [(lat_a, lon_a), (lat_b, lon_b)] = self.corners();
        let lat_ok = latitude >= lat_a.min(lat_b) && latitude <= lat_a.max(lat_b);
        let lon_ok = longitude >= lon_a.min(lon_b) && longitude <= lon_a.max(lon_b);
        lat_ok && lon_ok
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::WORLD
    }
}

/// Feed subscription
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionRequest {
    /// Feed API key
    #[serde(rename = "APIKey")]
    pub api_key: String,

    /// Areas of interest
    #[serde(rename = "BoundingBoxes")]
    pub bounding_boxes: Vec<BoundingBox>,

    /// Optional vessel (MMSI) filter; empty means all vessels
    #[serde(
        rename = "FiltersShipMMSI",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub filter_mmsi: Vec<String>,
}

impl SubscriptionRequest {
    /// Build a request; an empty box list falls back to the whole world
    pub fn new(
        api_key: impl Into<String>,
        bounding_boxes: Vec<BoundingBox>,
        filter_mmsi: Vec<String>,
    ) -> Self {
        let bounding_boxes = if bounding_boxes.is_empty() {
            vec![BoundingBox::WORLD]
        } else {
            bounding_boxes
        };

        Self {
            api_key: api_key.into(),
            bounding_boxes,
            filter_mmsi,
        }
    }

    /// Apply the subscription filter to a single vessel sample
    pub fn matches(&self, mmsi: u32, latitude: f64, longitude: f64) -> bool {
        let mmsi_ok = self.filter_mmsi.is_empty()
            || self
                .filter_mmsi
                .iter()
                .any(|filter| filter.trim().parse::<u32>().ok() == Some(mmsi));

        let area_ok = self.bounding_boxes.is_empty()
            || self
                .bounding_boxes
                .iter()
                .any(|bbox| bbox.contains(latitude, longitude));

        mmsi_ok && area_ok
    }
}

impl fmt::Debug for SubscriptionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionRequest")
            .field("api_key", &"<redacted>")
            .field("bounding_boxes", &self.bounding_boxes)
            .field("filter_mmsi", &self.filter_mmsi)
            .finish()
    }
}
