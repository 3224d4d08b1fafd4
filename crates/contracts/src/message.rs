//! Envelope - Decoder output
//!
//! Typed view of one inbound feed frame. Field names follow the feed's
//! PascalCase wire model; every secondary field is optional so that
//! extraction stays best-effort.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Message kind discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    PositionReport,
    ShipStaticData,
    /// Any discriminator without a typed payload
    Other,
}

impl MessageKind {
    /// Wire discriminator for a position report
    pub const POSITION_REPORT: &'static str = "PositionReport";
    /// Wire discriminator for static ship data
    pub const SHIP_STATIC_DATA: &'static str = "ShipStaticData";

    /// Map a wire `MessageType` string onto a kind
    pub fn from_message_type(message_type: &str) -> Self {
        match message_type {
            Self::POSITION_REPORT => Self::PositionReport,
            Self::SHIP_STATIC_DATA => Self::ShipStaticData,
            _ => Self::Other,
        }
    }

    /// Persistable record kind, `None` for `Other`
    pub fn record_kind(self) -> Option<RecordKind> {
        match self {
            Self::PositionReport => Some(RecordKind::PositionReport),
            Self::ShipStaticData => Some(RecordKind::ShipStaticData),
            Self::Other => None,
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PositionReport => f.write_str(Self::POSITION_REPORT),
            Self::ShipStaticData => f.write_str(Self::SHIP_STATIC_DATA),
            Self::Other => f.write_str("Other"),
        }
    }
}

/// Kind of record handed to a sink
///
/// Each kind maps onto exactly one logical table / collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    PositionReport,
    ShipStaticData,
}

impl RecordKind {
    /// Destination table name
    pub fn table_name(self) -> &'static str {
        match self {
            Self::PositionReport => "position_report",
            Self::ShipStaticData => "ship_static_data",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

/// Decoded frame
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    /// Raw `MessageType` discriminator as received
    pub message_type: String,

    /// Kind-specific payload
    pub payload: Payload,

    /// Feed-provided metadata block, when present
    pub metadata: Option<FrameMetadata>,
}

impl Envelope {
    /// Message kind (derived from the payload)
    pub fn kind(&self) -> MessageKind {
        match self.payload {
            Payload::PositionReport(_) => MessageKind::PositionReport,
            Payload::ShipStaticData(_) => MessageKind::ShipStaticData,
            Payload::Other => MessageKind::Other,
        }
    }

    /// Vessel MMSI, from the payload or the metadata block
    pub fn user_id(&self) -> Option<u32> {
        match &self.payload {
            Payload::PositionReport(report) => Some(report.user_id),
            Payload::ShipStaticData(data) => Some(data.user_id),
            Payload::Other => self.metadata.as_ref().and_then(|meta| meta.mmsi),
        }
    }
}

/// Kind-specific payload
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    PositionReport(PositionReport),
    ShipStaticData(ShipStaticData),
    /// Payload not modelled; only the discriminator is kept
    Other,
}

/// One instantaneous vessel state sample (AIS messages 1/2/3)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PositionReport {
    /// MMSI
    #[serde(rename = "UserID")]
    pub user_id: u32,

    /// Latitude in degrees
    pub latitude: f64,

    /// Longitude in degrees
    pub longitude: f64,

    /// Course over ground (degrees)
    pub cog: Option<f64>,

    /// Speed over ground (knots)
    pub sog: Option<f64>,

    /// True heading (degrees, 511 = not available)
    pub true_heading: Option<i32>,

    pub navigational_status: Option<i32>,
    pub rate_of_turn: Option<i32>,
    pub position_accuracy: Option<bool>,
    pub raim: Option<bool>,

    /// UTC second when the report was generated
    pub timestamp: Option<i32>,

    pub special_manoeuvre_indicator: Option<i32>,
    pub spare: Option<i32>,

    #[serde(rename = "MessageID")]
    pub message_id: Option<i32>,

    pub repeat_indicator: Option<i32>,
    pub valid: Option<bool>,
    pub communication_state: Option<i64>,
}

impl PositionReport {
    /// Minimal report with only the required fields set
    pub fn new(user_id: u32, latitude: f64, longitude: f64) -> Self {
        Self {
            user_id,
            latitude,
            longitude,
            cog: None,
            sog: None,
            true_heading: None,
            navigational_status: None,
            rate_of_turn: None,
            position_accuracy: None,
            raim: None,
            timestamp: None,
            special_manoeuvre_indicator: None,
            spare: None,
            message_id: None,
            repeat_indicator: None,
            valid: None,
            communication_state: None,
        }
    }
}

/// Slowly-changing vessel metadata (AIS message 5)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ShipStaticData {
    /// MMSI
    #[serde(rename = "UserID")]
    pub user_id: u32,

    pub name: Option<String>,
    pub call_sign: Option<String>,
    pub destination: Option<String>,
    pub imo_number: Option<i64>,

    /// Ship and cargo type code
    #[serde(rename = "Type")]
    pub ship_type: Option<i32>,

    pub dimension: Option<Dimension>,
    pub eta: Option<Eta>,

    /// Maximum present static draught (metres)
    pub maximum_static_draught: Option<f64>,

    pub fix_type: Option<i32>,
    pub ais_version: Option<i32>,
    pub dte: Option<bool>,
    pub spare: Option<bool>,

    #[serde(rename = "MessageID")]
    pub message_id: Option<i32>,

    pub repeat_indicator: Option<i32>,
    pub valid: Option<bool>,

    /// UN/LOCODE of the destination port (vessel-list feeds only)
    pub locode: Option<String>,

    /// Provider-computed ETA, `YYYY-MM-DD HH:MM:SS` (vessel-list feeds only)
    pub eta_utc: Option<String>,

    /// Predicted ETA; `None` when the provider has no prediction
    pub eta_predicted: Option<String>,

    /// Nautical miles left to the destination
    pub distance_remaining: Option<f64>,
}

impl ShipStaticData {
    /// Minimal record with only the vessel id set
    pub fn new(user_id: u32) -> Self {
        Self {
            user_id,
            name: None,
            call_sign: None,
            destination: None,
            imo_number: None,
            ship_type: None,
            dimension: None,
            eta: None,
            maximum_static_draught: None,
            fix_type: None,
            ais_version: None,
            dte: None,
            spare: None,
            message_id: None,
            repeat_indicator: None,
            valid: None,
            locode: None,
            eta_utc: None,
            eta_predicted: None,
            distance_remaining: None,
        }
    }
}

/// Antenna reference point distances (metres)
///
/// A: to bow, B: to stern, C: to port, D: to starboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Dimension {
    #[serde(default)]
    pub a: i32,
    #[serde(default)]
    pub b: i32,
    #[serde(default)]
    pub c: i32,
    #[serde(default)]
    pub d: i32,
}

/// Estimated time of arrival as broadcast
///
/// AIS encodes "not available" with sentinels: month 0, day 0, hour 24,
/// minute 60. The accessors turn those into `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Eta {
    #[serde(default)]
    pub month: u8,
    #[serde(default)]
    pub day: u8,
    #[serde(default)]
    pub hour: u8,
    #[serde(default)]
    pub minute: u8,
}

impl Eta {
    pub fn month(&self) -> Option<u8> {
        (1..=12).contains(&self.month).then_some(self.month)
    }

    pub fn day(&self) -> Option<u8> {
        (1..=31).contains(&self.day).then_some(self.day)
    }

    pub fn hour(&self) -> Option<u8> {
        (self.hour < 24).then_some(self.hour)
    }

    pub fn minute(&self) -> Option<u8> {
        (self.minute < 60).then_some(self.minute)
    }

    /// True when at least the date part is present
    pub fn is_available(&self) -> bool {
        self.month().is_some() && self.day().is_some()
    }
}

/// Feed `MetaData` block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameMetadata {
    #[serde(rename = "MMSI", default)]
    pub mmsi: Option<u32>,

    #[serde(rename = "ShipName", default)]
    pub ship_name: Option<String>,

    #[serde(default)]
    pub latitude: Option<f64>,

    #[serde(default)]
    pub longitude: Option<f64>,

    /// Receive time as formatted by the feed
    #[serde(default)]
    pub time_utc: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_message_type() {
        assert_eq!(
            MessageKind::from_message_type("PositionReport"),
            MessageKind::PositionReport
        );
        assert_eq!(
            MessageKind::from_message_type("ShipStaticData"),
            MessageKind::ShipStaticData
        );
        assert_eq!(
            MessageKind::from_message_type("StandardClassBPositionReport"),
            MessageKind::Other
        );
        assert_eq!(MessageKind::Other.record_kind(), None);
    }

    #[test]
    fn test_table_names() {
        assert_eq!(RecordKind::PositionReport.table_name(), "position_report");
        assert_eq!(RecordKind::ShipStaticData.table_name(), "ship_static_data");
    }

    #[test]
    fn test_eta_sentinels() {
        let unknown = Eta {
            month: 0,
            day: 0,
            hour: 24,
            minute: 60,
        };
        assert!(!unknown.is_available());
        assert_eq!(unknown.hour(), None);
        assert_eq!(unknown.minute(), None);

        let eta = Eta {
            month: 5,
            day: 17,
            hour: 6,
            minute: 30,
        };
        assert!(eta.is_available());
        assert_eq!(eta.month(), Some(5));
        assert_eq!(eta.minute(), Some(30));
    }

    #[test]
    fn test_position_report_wire_names() {
        let json = r#"{"UserID":266064000,"Latitude":57.1,"Longitude":11.9,"Cog":45.0,"Sog":12.3,"MessageID":1}"#;
        let report: PositionReport = serde_json::from_str(json).unwrap();
        assert_eq!(report.user_id, 266064000);
        assert_eq!(report.cog, Some(45.0));
        assert_eq!(report.message_id, Some(1));
        assert_eq!(report.true_heading, None);
    }
}
