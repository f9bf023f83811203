use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub estimator: EstimatorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub logs: LogsConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    /// Largest WebSocket message accepted from a client, in bytes.
    #[serde(default = "default_max_message_bytes")]
    pub max_message_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogsConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

/// Tuning for the built-in pupil tracker.
///
/// Eye regions are fractions of the frame size, so the same configuration
/// works for any camera resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimatorConfig {
    #[serde(default = "default_left_eye")]
    pub left_eye: EyeRegion,
    #[serde(default = "default_right_eye")]
    pub right_eye: EyeRegion,
    /// Minimum luma spread inside an eye region before a pupil is searched for.
    #[serde(default = "default_min_contrast")]
    pub min_contrast: u8,
    /// Share of an eye region expected to be covered by the iris.
    #[serde(default = "default_iris_fraction")]
    pub iris_fraction: f64,
    #[serde(default = "default_calibration_frames")]
    pub calibration_frames: usize,
    #[serde(default = "default_min_pupil_pixels")]
    pub min_pupil_pixels: usize,
    #[serde(default = "default_left_threshold")]
    pub left_threshold: f64,
    #[serde(default = "default_right_threshold")]
    pub right_threshold: f64,
    #[serde(default = "default_blink_ratio")]
    pub blink_ratio: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EyeRegion {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            logs: LogsConfig::default(),
            cors: CorsConfig::default(),
            max_message_bytes: default_max_message_bytes(),
        }
    }
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
        }
    }
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            left_eye: default_left_eye(),
            right_eye: default_right_eye(),
            min_contrast: default_min_contrast(),
            iris_fraction: default_iris_fraction(),
            calibration_frames: default_calibration_frames(),
            min_pupil_pixels: default_min_pupil_pixels(),
            left_threshold: default_left_threshold(),
            right_threshold: default_right_threshold(),
            blink_ratio: default_blink_ratio(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8001
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_allowed_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://127.0.0.1:3000".to_string(),
    ]
}

fn default_max_message_bytes() -> usize {
    16 * 1024 * 1024
}

fn default_left_eye() -> EyeRegion {
    EyeRegion {
        x: 0.30,
        y: 0.30,
        width: 0.15,
        height: 0.12,
    }
}

fn default_right_eye() -> EyeRegion {
    EyeRegion {
        x: 0.55,
        y: 0.30,
        width: 0.15,
        height: 0.12,
    }
}

fn default_min_contrast() -> u8 {
    40
}

fn default_iris_fraction() -> f64 {
    0.48
}

fn default_calibration_frames() -> usize {
    20
}

fn default_min_pupil_pixels() -> usize {
    4
}

fn default_left_threshold() -> f64 {
    0.65
}

fn default_right_threshold() -> f64 {
    0.35
}

fn default_blink_ratio() -> f64 {
    3.8
}
