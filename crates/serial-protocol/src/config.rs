//! Framing configuration.

use serde::{Deserialize, Serialize};

use crate::constants::START_BYTE;
use crate::error::{ProtocolError, ProtocolResult};
use crate::message::MessageId;

/// Parameters both ends of a link must agree on.
///
/// Can be embedded in a larger YAML configuration:
///
/// ```yaml
/// start_byte: 0xA5
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    /// Start-of-frame marker.
    pub start_byte: u8,
}

impl Default for FrameConfig {
    fn default() -> Self {
        FrameConfig {
            start_byte: START_BYTE,
        }
    }
}

impl FrameConfig {
    /// Config with a custom start marker.
    pub fn with_start_byte(start_byte: u8) -> ProtocolResult<Self> {
        let config = FrameConfig { start_byte };
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a YAML document.
    pub fn from_yaml_str(yaml: &str) -> ProtocolResult<Self> {
        let config: FrameConfig = serde_yaml::from_str(yaml)
            .map_err(|e| ProtocolError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to YAML.
    pub fn to_yaml_string(&self) -> ProtocolResult<String> {
        serde_yaml::to_string(self).map_err(|e| ProtocolError::InvalidConfig(e.to_string()))
    }

    /// Reject a start marker that is also a message id; every header would
    /// then read as a fresh start marker.
    pub fn validate(&self) -> ProtocolResult<()> {
        if let Ok(id) = MessageId::try_from(self.start_byte) {
            return Err(ProtocolError::InvalidConfig(format!(
                "start byte 0x{:02X} collides with message id {}",
                self.start_byte, id
            )));
        }
        Ok(())
    }
}
