use crate::{Error, Result, gaze::GazeResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const SERVICE_NAME: &str = "gaze-tracking";
pub const WEBSOCKET_PATH: &str = "/ws/gaze";
pub const HEALTH_PATH: &str = "/health";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub gaze_tracking_available: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub message: String,
    pub version: String,
    pub endpoints: Endpoints,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoints {
    pub websocket: String,
    pub health: String,
}

/// A message received on the gaze WebSocket, dispatched on its `type` field.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    Frame(FramePayload),
    Ping,
    /// Any other `type`, or none at all. Carries the raw type for logging.
    Unknown(Option<String>),
}

/// The `data` field of a frame message.
#[derive(Debug, Clone, PartialEq)]
pub enum FramePayload {
    Image(String),
    /// `data` absent or blank: null, false, zero, or an empty string,
    /// array or object.
    Missing,
    /// `data` present but not a string; holds the JSON type name.
    Invalid(&'static str),
}

impl ClientMessage {
    /// Parses a text message. Anything that is not a JSON object is a
    /// protocol error.
    pub fn parse(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| Error::protocol(format!("message is not valid JSON: {}", e)))?;

        let Value::Object(mut fields) = value else {
            return Err(Error::protocol(format!(
                "message must be a JSON object, got {}",
                json_type(&value)
            )));
        };

        let data = fields.remove("data");
        let message = match fields.get("type").and_then(Value::as_str) {
            Some("frame") => Self::Frame(FramePayload::from_value(data)),
            Some("ping") => Self::Ping,
            other => Self::Unknown(other.map(str::to_string)),
        };

        Ok(message)
    }
}

impl FramePayload {
    fn from_value(data: Option<Value>) -> Self {
        match data {
            None => Self::Missing,
            Some(value) if is_blank(&value) => Self::Missing,
            Some(Value::String(s)) => Self::Image(s),
            Some(other) => Self::Invalid(json_type(&other)),
        }
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A message sent back to the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    GazeData { data: GazeResult },
    Pong,
}

impl ServerMessage {
    pub fn to_text(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
