//! Field extraction
//!
//! Maps typed payloads onto the flat, lower-snake-case field maps handed to
//! sinks. Every field is always present; missing values become `Null`.

use contracts::{FieldMap, FieldValue, FrameMetadata, PositionReport, ShipStaticData};

/// Field subset persisted for a position report
pub fn position_report_fields(
    report: &PositionReport,
    metadata: Option<&FrameMetadata>,
) -> FieldMap {
    let mut fields = FieldMap::new();
    let mut put = |name: &str, value: FieldValue| {
        fields.insert(name.to_string(), value);
    };

    put("userid", report.user_id.into());
    put("latitude", report.latitude.into());
    put("longitude", report.longitude.into());
    put("cog", report.cog.into());
    put("sog", report.sog.into());
    put("true_heading", report.true_heading.into());
    put("navigational_status", report.navigational_status.into());
    put("rate_of_turn", report.rate_of_turn.into());
    put("position_accuracy", report.position_accuracy.into());
    put("raim", report.raim.into());
    put("timestamp", report.timestamp.into());
    put(
        "special_manoeuvre_indicator",
        report.special_manoeuvre_indicator.into(),
    );
    put("spare", report.spare.into());
    put("message_id", report.message_id.into());
    put("repeat_indicator", report.repeat_indicator.into());
    put("valid", report.valid.into());
    put("communication_state", report.communication_state.into());
    put("time_utc", time_utc(metadata));

    fields
}

/// Field subset persisted for static ship data
pub fn ship_static_fields(data: &ShipStaticData, metadata: Option<&FrameMetadata>) -> FieldMap {
    let mut fields = FieldMap::new();
    let mut put = |name: &str, value: FieldValue| {
        fields.insert(name.to_string(), value);
    };

    put("userid", data.user_id.into());
    put("name", text(data.name.as_deref()));
    put("call_sign", text(data.call_sign.as_deref()));
    put("destination", text(data.destination.as_deref()));
    put("imo_number", data.imo_number.into());
    put("type", data.ship_type.into());

    let dimension = data.dimension;
    put("dimension_a", dimension.map(|d| d.a).into());
    put("dimension_b", dimension.map(|d| d.b).into());
    put("dimension_c", dimension.map(|d| d.c).into());
    put("dimension_d", dimension.map(|d| d.d).into());

    let eta = data.eta;
    put("eta_month", eta.and_then(|e| e.month()).into());
    put("eta_day", eta.and_then(|e| e.day()).into());
    put("eta_hour", eta.and_then(|e| e.hour()).into());
    put("eta_minute", eta.and_then(|e| e.minute()).into());

    put("maximum_static_draught", data.maximum_static_draught.into());
    put("fix_type", data.fix_type.into());
    put("ais_version", data.ais_version.into());
    put("dte", data.dte.into());
    put("message_id", data.message_id.into());
    put("repeat_indicator", data.repeat_indicator.into());
    put("valid", data.valid.into());
    put("locode", text(data.locode.as_deref()));
    put("eta", data.eta_utc.as_deref().into());
    put("eta_predicted", data.eta_predicted.as_deref().into());
    put("distance_remaining", data.distance_remaining.into());
    put("time_utc", time_utc(metadata));

    fields
}

/// AIS pads six-bit text with `@`; strip it along with trailing blanks
pub fn normalize_text(raw: &str) -> Option<&str> {
    let trimmed = raw.trim_end_matches(|c: char| c == '@' || c.is_whitespace());
    (!trimmed.is_empty()).then_some(trimmed)
}

fn text(raw: Option<&str>) -> FieldValue {
    raw.and_then(normalize_text).into()
}

fn time_utc(metadata: Option<&FrameMetadata>) -> FieldValue {
    metadata.and_then(|m| m.time_utc.as_deref()).into()
}
