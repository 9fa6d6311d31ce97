pub mod asesmen;
pub mod okupasi;
pub mod sekolah;

use serde::{Deserialize, Serialize};

pub use asesmen::{Asesmen, AsesmenPayload};
pub use okupasi::{Okupasi, OkupasiPayload, UnitKompetensi, UnitKompetensiPayload};
pub use sekolah::{
    EnrichedSekolah, Konsentrasi, KonsentrasiPayload, MatchRecord, Sekolah, SekolahPayload,
};

/// Identifier as the remote API sends it: some tables use integer keys,
/// others string keys, and the same table is not always consistent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Text(String),
}

impl RecordId {
    /// Representation-independent key: `12` and `"12"` join to the same row.
    pub fn key(&self) -> String {
        match self {
            RecordId::Int(n) => n.to_string(),
            RecordId::Text(s) => s.trim().to_string(),
        }
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.key())
    }
}
