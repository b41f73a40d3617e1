use crate::error::{Error, Result};
use serde::Deserialize;
use serde::de::IgnoredAny;
use sndio_hdl::{SIO_DEVANY, SIO_MAXVOL};
use tracing::warn;

/// Log filter for the plugin, in `tracing_subscriber::EnvFilter` syntax.
pub const LOG_ENV: &str = "ALSA_SNDIO_LOG";

/// Fields of the plugin's PCM definition in the ALSA configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PluginConfig {
    #[serde(default)]
    pub device: Option<String>,
    #[serde(default)]
    pub volume: Option<i64>,
    #[serde(default, rename = "comment")]
    _comment: Option<IgnoredAny>,
    #[serde(default, rename = "type")]
    _kind: Option<IgnoredAny>,
    #[serde(default, rename = "hint")]
    _hint: Option<IgnoredAny>,
}

impl PluginConfig {
    pub fn new(device: Option<&str>, volume: Option<i64>) -> Self {
        Self {
            device: device.map(str::to_owned),
            volume,
            ..Self::default()
        }
    }

    pub fn from_deserializer<'de, D: serde::Deserializer<'de>>(de: D) -> Result<Self> {
        Self::deserialize(de).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn device_name(&self) -> &str {
        match self.device.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => SIO_DEVANY,
        }
    }

    /// Volume to apply after connecting. Out of range values are dropped
    /// with a warning.
    pub fn initial_volume(&self) -> Option<u32> {
        let volume = self.volume?;
        match u32::try_from(volume) {
            Ok(v) if v <= SIO_MAXVOL => Some(v),
            _ => {
                warn!("sndio: volume {volume} outside 0..={SIO_MAXVOL}, ignored");
                None
            }
        }
    }
}
