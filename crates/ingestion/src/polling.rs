//! HTTP polling connector
//!
//! Periodically fetches a vessel list and turns every record into the same
//! frame shape the real-time stream produces, so decoding and dispatch do
//! not care which transport is in use.

use std::time::Duration;

use async_channel::{Receiver, Sender};
use bytes::Bytes;
use contracts::{
    ConnectionManager, ContractError, FeedConfig, FeedSession, MessageKind, SubscriptionRequest,
};
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, instrument, warn};

use crate::error::{require_scheme, Result};

/// Frames buffered between the poll task and the reader
const FRAME_CHANNEL_CAPACITY: usize = 1024;

/// Vessel-list connection manager
#[derive(Debug, Clone)]
pub struct PollingConnector {
    url: String,
    interval: Duration,
    client: reqwest::Client,
}

impl PollingConnector {
    /// Create a connector for an `http://` or `https://` vessel-list endpoint
    pub fn new(url: impl Into<String>, interval: Duration, timeout: Duration) -> Result<Self> {
        let url = url.into();
        require_scheme(&url, &["http", "https"])?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            url,
            interval,
            client,
        })
    }

    pub fn from_config(feed: &FeedConfig) -> Result<Self> {
        Self::new(feed.url.clone(), feed.poll_interval(), feed.connect_timeout())
    }
}

impl ConnectionManager for PollingConnector {
    type Session = PollSession;

    fn endpoint(&self) -> &str {
        &self.url
    }

    /// The initial fetch doubles as the dial: an unreachable endpoint fails here.
    #[instrument(name = "poll_acquire", skip(self, request), fields(endpoint = %self.url))]
    async fn acquire(
        &self,
        request: &SubscriptionRequest,
    ) -> std::result::Result<PollSession, ContractError> {
        let initial = fetch(&self.client, &self.url).await?;
        info!(vessels = initial.len(), "initial vessel list fetched");

        let (tx, rx) = async_channel::bounded(FRAME_CHANNEL_CAPACITY);
        let poller = Poller {
            client: self.client.clone(),
            url: self.url.clone(),
            interval: self.interval,
            request: request.clone(),
            tx,
        };
        let task = tokio::spawn(poller.run(initial));

        Ok(PollSession {
            rx,
            task: Some(task),
        })
    }
}

struct Poller {
    client: reqwest::Client,
    url: String,
    interval: Duration,
    request: SubscriptionRequest,
    tx: Sender<Bytes>,
}

impl Poller {
    async fn run(self, initial: Vec<VesselRecord>) {
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut pending = Some(initial);

        loop {
            let records = match pending.take() {
                Some(records) => records,
                None => {
                    ticker.tick().await;
                    match fetch(&self.client, &self.url).await {
                        Ok(records) => records,
                        Err(e) => {
                            warn!(error = %e, "vessel list fetch failed");
                            metrics::counter!("ais_poll_fetch_failures_total").increment(1);
                            continue;
                        }
                    }
                }
            };

            let mut emitted = 0usize;
            for record in &records {
                for frame in translate(record, &self.request) {
                    if self.tx.send(frame).await.is_err() {
                        debug!("frame receiver dropped, poller exiting");
                        return;
                    }
                    emitted += 1;
                }
            }
            debug!(vessels = records.len(), frames = emitted, "vessel list translated");
        }
    }
}

/// Polled session; frames arrive from the background poll task
pub struct PollSession {
    rx: Receiver<Bytes>,
    task: Option<JoinHandle<()>>,
}

impl FeedSession for PollSession {
    async fn read_frame(&mut self) -> std::result::Result<Bytes, ContractError> {
        if self.task.is_none() {
            return Err(ContractError::stream_closed("session already closed"));
        }
        self.rx
            .recv()
            .await
            .map_err(|_| ContractError::stream_closed("poll task stopped"))
    }

    async fn close(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            self.rx.close();
            debug!("poll session closed");
        }
    }
}

impl Drop for PollSession {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Fetch and parse the vessel list
///
/// Transport failures and non-2xx statuses are `DialFailed`; a body that is
/// not a JSON array is `HandshakeFailed`. Individual unusable records are
/// skipped.
async fn fetch(
    client: &reqwest::Client,
    url: &str,
) -> std::result::Result<Vec<VesselRecord>, ContractError> {
    let response = client
        .get(url)
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(|e| ContractError::dial_failed(url, e))?;

    let body = response
        .bytes()
        .await
        .map_err(|e| ContractError::dial_failed(url, e))?;

    let entries: Vec<Value> =
        serde_json::from_slice(&body).map_err(|e| ContractError::handshake_failed(url, e))?;

    Ok(parse_entries(entries))
}

/// Keep the records that carry an MMSI and a position; log the rest
pub fn parse_entries(entries: Vec<Value>) -> Vec<VesselRecord> {
    let total = entries.len();
    let records: Vec<VesselRecord> = entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            let mmsi = entry.pointer("/AIS/MMSI").cloned();
            match VesselEntry::deserialize(entry) {
                Ok(VesselEntry { ais }) => Some(ais),
                Err(e) => {
                    warn!(index, mmsi = ?mmsi, error = %e, "skipping vessel record");
                    metrics::counter!("ais_poll_records_skipped_total").increment(1);
                    None
                }
            }
        })
        .collect();

    if records.len() < total {
        debug!(kept = records.len(), total, "vessel list partially usable");
    }
    records
}

/// One element of the vessel-list response
#[derive(Debug, Clone, Deserialize)]
pub struct VesselEntry {
    #[serde(rename = "AIS")]
    pub ais: VesselRecord,
}

/// Vessel-list record; only the fields we forward are modelled
///
/// `MMSI`, `LATITUDE` and `LONGITUDE` are required; a record without them
/// fails to deserialize and is skipped.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct VesselRecord {
    pub mmsi: u32,
    pub timestamp: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub course: Option<f64>,
    pub speed: Option<f64>,
    pub heading: Option<i32>,
    pub navstat: Option<i32>,
    pub imo: Option<i64>,
    pub name: Option<String>,
    pub callsign: Option<String>,
    #[serde(rename = "TYPE")]
    pub ship_type: Option<i32>,
    pub a: Option<i32>,
    pub b: Option<i32>,
    pub c: Option<i32>,
    pub d: Option<i32>,
    pub draught: Option<f64>,
    pub destination: Option<String>,
    pub locode: Option<String>,
    pub eta_ais: Option<String>,
    pub eta: Option<String>,
    /// String, number or null depending on the provider
    #[serde(default, deserialize_with = "lenient_text")]
    pub eta_predicted: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub distance_remaining: Option<f64>,
}

fn lenient_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(text)) if !text.trim().is_empty() => Some(text),
        Some(Value::Number(number)) => Some(number.to_string()),
        _ => None,
    })
}

fn lenient_number<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => text.trim().parse().ok(),
        _ => None,
    })
}

/// Translate one vessel record into stream-shaped frames
///
/// Records outside the subscription produce nothing; the rest produce a
/// position report followed by a static data frame.
pub fn translate(record: &VesselRecord, request: &SubscriptionRequest) -> Vec<Bytes> {
    if !request.matches(record.mmsi, record.latitude, record.longitude) {
        return Vec::new();
    }

    let metadata = json!({
        "MMSI": record.mmsi,
        "ShipName": record.name,
        "latitude": record.latitude,
        "longitude": record.longitude,
        "time_utc": record.timestamp,
    });

    let position = json!({
        "UserID": record.mmsi,
        "Latitude": record.latitude,
        "Longitude": record.longitude,
        "Cog": record.course,
        "Sog": record.speed,
        "TrueHeading": record.heading,
        "NavigationalStatus": record.navstat,
    });

    let mut static_data = json!({
        "UserID": record.mmsi,
        "Name": record.name,
        "CallSign": record.callsign,
        "Destination": record.destination,
        "ImoNumber": record.imo,
        "Type": record.ship_type,
        "MaximumStaticDraught": record.draught,
        "Dimension": {
            "A": record.a.unwrap_or(0),
            "B": record.b.unwrap_or(0),
            "C": record.c.unwrap_or(0),
            "D": record.d.unwrap_or(0),
        },
        "Locode": record.locode,
        "EtaUtc": non_blank(record.eta.as_deref()),
        "EtaPredicted": record.eta_predicted,
        "DistanceRemaining": record.distance_remaining,
    });
    if let Some(eta) = record.eta_ais.as_deref().and_then(parse_eta) {
        static_data["Eta"] = eta;
    }

    vec![
        frame(MessageKind::POSITION_REPORT, &metadata, position),
        frame(MessageKind::SHIP_STATIC_DATA, &metadata, static_data),
    ]
}

fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.filter(|text| !text.trim().is_empty())
}

fn frame(message_type: &str, metadata: &Value, body: Value) -> Bytes {
    let frame = json!({
        "MessageType": message_type,
        "MetaData": metadata,
        "Message": { message_type: body },
    });
    Bytes::from(frame.to_string())
}

/// Parse `[YYYY-]MM-DD HH:MM[:SS]` into the feed's ETA object
fn parse_eta(raw: &str) -> Option<Value> {
    let (date, time) = raw.trim().split_once(' ')?;
    let date_parts: Vec<&str> = date.split('-').collect();
    let [.., month, day] = date_parts.as_slice() else {
        return None;
    };
    let month: u8 = month.parse().ok()?;
    let day: u8 = day.parse().ok()?;

    let mut time_parts = time.split(':');
    let hour: u8 = time_parts.next()?.parse().ok()?;
    let minute: u8 = time_parts.next()?.parse().ok()?;

    Some(json!({"Month": month, "Day": day, "Hour": hour, "Minute": minute}))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode;
    use contracts::{BoundingBox, Payload};

    fn record() -> VesselRecord {
        let raw = r#"{"AIS": {
            "MMSI": 266064000, "TIMESTAMP": "2024-05-17 06:30:00 UTC",
            "LATITUDE": 57.1, "LONGITUDE": 11.9, "COURSE": 45.0, "SPEED": 12.3,
            "HEADING": 44, "NAVSTAT": 0, "IMO": 9123456, "NAME": "ELSA",
            "CALLSIGN": "SFAB", "TYPE": 70, "A": 100, "B": 20, "C": 8, "D": 8,
            "DRAUGHT": 7.4, "DESTINATION": "GOTEBORG", "LOCODE": "SEGOT",
            "ETA_AIS": "05-18 14:00", "ETA": "2024-05-18 14:00:00", "SRC": "TER",
            "ZONE": "Baltic Sea", "ECA": true, "DISTANCE_REMAINING": "42.5",
            "ETA_PREDICTED": "2024-05-18 13:40:00"
        }}"#;
        serde_json::from_str::<VesselEntry>(raw).unwrap().ais
    }

    #[test]
    fn test_translate_produces_decodable_frames() {
        let request = SubscriptionRequest::new("", Vec::new(), Vec::new());
        let frames = translate(&record(), &request);
        assert_eq!(frames.len(), 2);

        let position = decode(&frames[0]).unwrap();
        let Payload::PositionReport(report) = position.payload else {
            panic!("expected position report");
        };
        assert_eq!(report.user_id, 266064000);
        assert_eq!(report.latitude, 57.1);
        assert_eq!(report.longitude, 11.9);
        assert_eq!(report.sog, Some(12.3));
        assert_eq!(
            position.metadata.unwrap().time_utc.as_deref(),
            Some("2024-05-17 06:30:00 UTC")
        );

        let static_data = decode(&frames[1]).unwrap();
        let Payload::ShipStaticData(data) = static_data.payload else {
            panic!("expected ship static data");
        };
        assert_eq!(data.name.as_deref(), Some("ELSA"));
        assert_eq!(data.imo_number, Some(9123456));
        assert_eq!(data.dimension.unwrap().b, 20);
        let eta = data.eta.unwrap();
        assert_eq!((eta.month(), eta.day(), eta.hour()), (Some(5), Some(18), Some(14)));
        assert_eq!(data.locode.as_deref(), Some("SEGOT"));
        assert_eq!(data.eta_utc.as_deref(), Some("2024-05-18 14:00:00"));
        assert_eq!(data.eta_predicted.as_deref(), Some("2024-05-18 13:40:00"));
        assert_eq!(data.distance_remaining, Some(42.5));
    }

    #[test]
    fn test_absent_voyage_estimates() {
        let entries = vec![
            json!({"AIS": {"MMSI": 1, "LATITUDE": 1.0, "LONGITUDE": 2.0,
                           "ETA": "", "ETA_PREDICTED": null, "DISTANCE_REMAINING": null}}),
            json!({"AIS": {"MMSI": 2, "LATITUDE": 1.0, "LONGITUDE": 2.0}}),
            json!({"AIS": {"MMSI": 3, "LATITUDE": 1.0, "LONGITUDE": 2.0,
                           "ETA_PREDICTED": {"unexpected": true}, "DISTANCE_REMAINING": "n/a"}}),
        ];
        let request = SubscriptionRequest::new("", Vec::new(), Vec::new());

        let records = parse_entries(entries);
        assert_eq!(records.len(), 3);
        for record in &records {
            let frames = translate(record, &request);
            let Payload::ShipStaticData(data) = decode(&frames[1]).unwrap().payload else {
                panic!("expected ship static data");
            };
            assert_eq!(data.eta_utc, None);
            assert_eq!(data.eta_predicted, None);
            assert_eq!(data.distance_remaining, None);
        }
    }

    #[test]
    fn test_numeric_eta_predicted_kept_as_text() {
        let records = parse_entries(vec![json!({"AIS": {
            "MMSI": 1, "LATITUDE": 1.0, "LONGITUDE": 2.0,
            "ETA_PREDICTED": 1716039600, "DISTANCE_REMAINING": 12
        }})]);
        assert_eq!(records[0].eta_predicted.as_deref(), Some("1716039600"));
        assert_eq!(records[0].distance_remaining, Some(12.0));
    }

    #[test]
    fn test_record_without_position_is_skipped() {
        let records = parse_entries(vec![
            json!({"AIS": {"MMSI": 266064000, "LATITUDE": 57.1, "LONGITUDE": 11.9}}),
            json!({"AIS": {"MMSI": 230000000, "LATITUDE": null, "LONGITUDE": null}}),
            json!({"AIS": {"MMSI": 230000001}}),
            json!("not a record"),
        ]);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].mmsi, 266064000);
    }

    #[test]
    fn test_translate_applies_subscription_filter() {
        let other_vessel = SubscriptionRequest::new("", Vec::new(), vec!["1".into()]);
        assert!(translate(&record(), &other_vessel).is_empty());

        let elsewhere = SubscriptionRequest::new(
            "",
            vec![BoundingBox::new((0.0, 0.0), (10.0, 10.0))],
            Vec::new(),
        );
        assert!(translate(&record(), &elsewhere).is_empty());
    }

    #[test]
    fn test_parse_eta() {
        let eta = parse_eta("2024-05-18 14:05:00").unwrap();
        assert_eq!(eta, json!({"Month": 5, "Day": 18, "Hour": 14, "Minute": 5}));
        assert!(parse_eta("unknown").is_none());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_fails_acquire() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let connector = PollingConnector::new(
            format!("http://{addr}/vessels"),
            Duration::from_secs(60),
            Duration::from_secs(2),
        )
        .unwrap();
        let request = SubscriptionRequest::new("", Vec::new(), Vec::new());

        let err = connector.acquire(&request).await.err().unwrap();
        assert!(matches!(err, ContractError::DialFailed { .. }), "{err}");
    }
}
