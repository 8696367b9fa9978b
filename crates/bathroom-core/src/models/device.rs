use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Anonymous per-install identifier used to attribute writes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    /// Generate a fresh random (v4) identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Accept a previously stored value if it has the UUID shape
    pub fn parse(value: &str) -> Option<Self> {
        Uuid::parse_str(value.trim()).ok().map(|uuid| Self(uuid.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_id_is_v4_uuid() {
        let id = DeviceId::generate();
        let uuid = Uuid::parse_str(id.as_str()).unwrap();
        assert_eq!(uuid.get_version_num(), 4);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(DeviceId::parse("not-a-device").is_none());
        assert!(DeviceId::parse("6f1c2a9e-3b4d-4f6a-8c2e-1a2b3c4d5e6f").is_some());
    }
}
