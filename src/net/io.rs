//! I/O 支持：JSON 与 RON 序列化接口。
use std::fs;
use std::path::Path;

use ron::ser::PrettyConfig;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;

use crate::net::core::Net;
use crate::net::structure::Marking;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("ron error: {0}")]
    Ron(#[from] ron::Error),
    #[error("ron parse error: {0}")]
    RonSpanned(#[from] ron::error::SpannedError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A net together with the markings a playout starts and may stop in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcceptingNet {
    pub net: Net,
    /// Falls back to the places' `tokens` fields when omitted.
    #[serde(default)]
    pub initial_marking: Option<Marking>,
    #[serde(default)]
    pub final_marking: Option<Marking>,
}

impl AcceptingNet {
    pub fn initial_marking(&self) -> Marking {
        self.initial_marking
            .clone()
            .unwrap_or_else(|| self.net.initial_marking())
    }
}

pub fn to_json_string<T>(value: &T) -> Result<String, IoError>
where
    T: Serialize,
{
    Ok(serde_json::to_string_pretty(value)?)
}

pub fn from_json_str<T>(s: &str) -> Result<T, IoError>
where
    T: DeserializeOwned,
{
    Ok(serde_json::from_str(s)?)
}

pub fn write_json<P: AsRef<Path>, T: Serialize>(path: P, value: &T) -> Result<(), IoError> {
    fs::write(path, to_json_string(value)?)?;
    Ok(())
}

pub fn read_json<P: AsRef<Path>, T: DeserializeOwned>(path: P) -> Result<T, IoError> {
    from_json_str(&fs::read_to_string(path)?)
}

pub fn to_ron_string<T>(value: &T) -> Result<String, IoError>
where
    T: Serialize,
{
    let mut pretty = PrettyConfig::default();
    pretty.new_line = "\n".into();
    Ok(ron::ser::to_string_pretty(value, pretty)?)
}

pub fn from_ron_str<T>(s: &str) -> Result<T, IoError>
where
    T: DeserializeOwned,
{
    Ok(ron::from_str(s)?)
}

pub fn read_ron<P: AsRef<Path>, T: DeserializeOwned>(path: P) -> Result<T, IoError> {
    from_ron_str(&fs::read_to_string(path)?)
}

/// Reads a document as RON when the extension says so, JSON otherwise.
pub fn read_by_extension<P: AsRef<Path>, T: DeserializeOwned>(path: P) -> Result<T, IoError> {
    let is_ron = path
        .as_ref()
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("ron"));
    if is_ron { read_ron(path) } else { read_json(path) }
}
