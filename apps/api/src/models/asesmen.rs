use serde::{Deserialize, Serialize};

use super::RecordId;

/// An assessment link. No relationships to other entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asesmen {
    pub id: RecordId,
    #[serde(default)]
    pub judul: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AsesmenPayload {
    pub judul: String,
    pub url: String,
}
