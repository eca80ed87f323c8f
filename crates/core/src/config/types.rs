use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub lifecycle: LifecycleConfig,
    #[serde(default)]
    pub conversion: ConversionConfig,
    #[serde(default)]
    pub cors: CorsConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Upper bound on a single request body (all uploaded files together).
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    5000
}

fn default_max_upload_bytes() -> usize {
    50 * 1024 * 1024
}

/// Where input and output artifacts live on disk.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
            output_dir: default_output_dir(),
        }
    }
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("converted")
}

/// Expiry windows and reclamation cadence.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LifecycleConfig {
    /// How long an uploaded file is kept.
    #[serde(default = "default_input_ttl")]
    pub input_ttl_secs: u64,
    /// How long a converted file stays downloadable.
    #[serde(default = "default_output_ttl")]
    pub output_ttl_secs: u64,
    /// How often the reaper sweeps expired files.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

fn default_input_ttl() -> u64 {
    300 // 5 minutes
}

fn default_output_ttl() -> u64 {
    600 // 10 minutes
}

fn default_sweep_interval() -> u64 {
    60
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            input_ttl_secs: default_input_ttl(),
            output_ttl_secs: default_output_ttl(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

impl LifecycleConfig {
    pub fn input_ttl(&self) -> Duration {
        Duration::from_secs(self.input_ttl_secs)
    }

    pub fn output_ttl(&self) -> Duration {
        Duration::from_secs(self.output_ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

/// Conversion tuning.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConversionConfig {
    /// JPEG quality used when a request does not specify one (1-100).
    #[serde(default = "default_image_quality")]
    pub default_image_quality: u8,
    /// Maximum conversions running at the same time across all requests.
    #[serde(default = "default_max_parallel")]
    pub max_parallel_conversions: usize,
}

fn default_image_quality() -> u8 {
    90
}

fn default_max_parallel() -> usize {
    4
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            default_image_quality: default_image_quality(),
            max_parallel_conversions: default_max_parallel(),
        }
    }
}

/// Cross-origin access.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CorsConfig {
    /// Allowed origins; `"*"` allows any origin.
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

fn default_allowed_origins() -> Vec<String> {
    vec!["*".to_string()]
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
        }
    }
}

impl CorsConfig {
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|o| o == "*")
    }
}
