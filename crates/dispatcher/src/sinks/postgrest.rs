//! PostgrestSink - single-row inserts over the PostgREST (Supabase) HTTP API

use contracts::{ContractError, DataSink, FieldMap, FieldValue, RecordKind};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Default request timeout
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Configuration for PostgrestSink
#[derive(Clone)]
pub struct PostgrestSinkConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`
    pub url: String,
    /// Anon / service key, sent as `apikey` and bearer token
    pub api_key: String,
    /// Request timeout
    pub timeout: Duration,
}

impl PostgrestSinkConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, String> {
        let url = params
            .get("url")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| "missing 'url' parameter".to_string())?;

        let api_key = params
            .get("api_key")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| "missing 'api_key' parameter".to_string())?;

        let timeout_secs = match params.get("timeout_secs") {
            Some(raw) => raw
                .parse()
                .map_err(|e| format!("invalid timeout_secs '{raw}': {e}"))?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            api_key: api_key.clone(),
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

impl std::fmt::Debug for PostgrestSinkConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgrestSinkConfig")
            .field("url", &self.url)
            .field("api_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Sink that inserts one row per record into `{url}/rest/v1/{table}`
pub struct PostgrestSink {
    name: String,
    config: PostgrestSinkConfig,
    client: reqwest::Client,
}

impl PostgrestSink {
    /// Create a new PostgrestSink
    pub fn new(
        name: impl Into<String>,
        config: PostgrestSinkConfig,
    ) -> Result<Self, ContractError> {
        let name = name.into();
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ContractError::SinkConnection {
                sink_name: name.clone(),
                message: e.to_string(),
            })?;

        debug!(sink = %name, url = %config.url, "PostgrestSink ready");
        Ok(Self {
            name,
            config,
            client,
        })
    }

    /// Create from params (for factory)
    #[instrument(name = "postgrest_sink_from_params", skip(name, params))]
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> Result<Self, ContractError> {
        let name = name.into();
        let config = PostgrestSinkConfig::from_params(params).map_err(|e| {
            ContractError::SinkConnection {
                sink_name: name.clone(),
                message: e,
            }
        })?;
        Self::new(name, config)
    }

    /// Insert endpoint for a table
    pub fn endpoint(&self, kind: RecordKind) -> String {
        format!("{}/rest/v1/{}", self.config.url, kind.table_name())
    }
}

/// Encode a field map as the JSON row sent to the backend
///
/// Position reports replace `latitude`/`longitude` with a WKT point literal
/// in `location`; everything else is passed through.
pub fn encode_row(kind: RecordKind, fields: &FieldMap) -> Map<String, Value> {
    let mut row: Map<String, Value> = fields
        .iter()
        .map(|(name, value)| (name.clone(), field_to_json(value)))
        .collect();

    if kind == RecordKind::PositionReport {
        let latitude = fields.get("latitude").and_then(FieldValue::as_f64);
        let longitude = fields.get("longitude").and_then(FieldValue::as_f64);
        if let (Some(lat), Some(lon)) = (latitude, longitude) {
            row.remove("latitude");
            row.remove("longitude");
            row.insert("location".to_string(), Value::String(point_literal(lon, lat)));
        }
    }

    row
}

/// `POINT(lon lat)` with shortest round-trip float formatting
pub fn point_literal(longitude: f64, latitude: f64) -> String {
    format!("POINT({longitude} {latitude})")
}

fn field_to_json(value: &FieldValue) -> Value {
    match value {
        FieldValue::Null => Value::Null,
        FieldValue::Bool(v) => Value::Bool(*v),
        FieldValue::Int(v) => Value::from(*v),
        FieldValue::Float(v) => Value::from(*v),
        FieldValue::Text(v) => Value::String(v.clone()),
    }
}

impl DataSink for PostgrestSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "postgrest_sink_write",
        skip(self, fields),
        fields(sink = %self.name, table = kind.table_name())
    )]
    async fn write(&mut self, kind: RecordKind, fields: &FieldMap) -> Result<(), ContractError> {
        let row = encode_row(kind, fields);

        let response = self
            .client
            .post(self.endpoint(kind))
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
            .header("Prefer", "return=minimal")
            .json(&row)
            .send()
            .await
            .map_err(|e| ContractError::persistence_with_source(&self.name, e))?;

        let status = response.status();
        if status.is_success() {
            debug!(status = status.as_u16(), "Row inserted");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), body = %body, "Insert rejected");
        Err(ContractError::persistence(
            &self.name,
            format!("{} rejected insert with {status}: {body}", kind.table_name()),
        ))
    }

    #[instrument(name = "postgrest_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        // Every write is its own request
        Ok(())
    }

    #[instrument(name = "postgrest_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        debug!(sink = %self.name, "PostgrestSink closed");
        Ok(())
    }
}
