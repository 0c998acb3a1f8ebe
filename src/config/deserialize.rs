// ABOUTME: Custom serde deserializers for config types.
// ABOUTME: Handles app names and non-empty port lists.

use nonempty::NonEmpty;
use serde::Deserialize;

use crate::types::AppName;

pub fn deserialize_app_name<'de, D>(deserializer: D) -> Result<AppName, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    AppName::new(&s).map_err(serde::de::Error::custom)
}

pub fn deserialize_ports<'de, D>(deserializer: D) -> Result<NonEmpty<u16>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let ports: Vec<u16> = Vec::deserialize(deserializer)?;
    if ports.contains(&0) {
        return Err(serde::de::Error::custom("health check port cannot be 0"));
    }
    NonEmpty::from_vec(ports)
        .ok_or_else(|| serde::de::Error::custom("at least one health check port is required"))
}
