//! Frame decoder
//!
//! Turns one raw feed frame into a typed [`Envelope`]. Frames look like
//!
//! ```json
//! {"MessageType": "PositionReport",
//!  "MetaData": {"MMSI": 266064000, "time_utc": "..."},
//!  "Message": {"PositionReport": {"UserID": 266064000, "Latitude": 57.1, ...}}}
//! ```
//!
//! Decoding is pure: no I/O and no logging. Callers decide what to do with
//! the error.

use contracts::{ContractError, Envelope, FrameMetadata, MessageKind, Payload};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

const MESSAGE_TYPE: &str = "MessageType";
const MESSAGE: &str = "Message";
const METADATA: &str = "MetaData";

/// Decode a raw frame
///
/// # Errors
/// - `MalformedFrame` when the bytes are not well-formed JSON
/// - `UnknownShape` when the discriminator, the `Message` object, the nested
///   payload object or a required payload field is missing
pub fn decode(raw: &[u8]) -> Result<Envelope, ContractError> {
    let frame: Value =
        serde_json::from_slice(raw).map_err(|e| ContractError::malformed_frame(e.to_string()))?;

    let object = frame
        .as_object()
        .ok_or_else(|| ContractError::unknown_shape("frame is not an object"))?;

    let message_type = object
        .get(MESSAGE_TYPE)
        .and_then(Value::as_str)
        .ok_or_else(|| ContractError::unknown_shape("missing string field 'MessageType'"))?;

    let message = object
        .get(MESSAGE)
        .and_then(Value::as_object)
        .ok_or_else(|| ContractError::unknown_shape("missing object field 'Message'"))?;

    let payload = match MessageKind::from_message_type(message_type) {
        MessageKind::PositionReport => {
            Payload::PositionReport(decode_payload(message, message_type)?)
        }
        MessageKind::ShipStaticData => {
            Payload::ShipStaticData(decode_payload(message, message_type)?)
        }
        MessageKind::Other => Payload::Other,
    };

    Ok(Envelope {
        message_type: message_type.to_string(),
        payload,
        metadata: decode_metadata(object.get(METADATA)),
    })
}

fn decode_payload<T: DeserializeOwned>(
    message: &Map<String, Value>,
    message_type: &str,
) -> Result<T, ContractError> {
    let body = message
        .get(message_type)
        .filter(|body| body.is_object())
        .ok_or_else(|| {
            ContractError::unknown_shape(format!("missing object 'Message.{message_type}'"))
        })?;

    T::deserialize(body)
        .map_err(|e| ContractError::unknown_shape(format!("{message_type}: {e}")))
}

/// Metadata is best-effort; an unreadable block is treated as absent.
fn decode_metadata(value: Option<&Value>) -> Option<FrameMetadata> {
    value
        .filter(|v| v.is_object())
        .and_then(|v| FrameMetadata::deserialize(v).ok())
}
