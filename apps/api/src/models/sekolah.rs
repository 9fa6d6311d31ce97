use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::RecordId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Konsentrasi {
    pub id: RecordId,
    #[serde(default)]
    pub nama: String,
}

/// A school as the roster endpoint returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sekolah {
    pub id: RecordId,
    #[serde(default)]
    pub nama: String,
    #[serde(default)]
    pub kota: String,
    #[serde(default)]
    pub jumlah_siswa: Option<u64>,
    #[serde(default)]
    pub jumlah_kelulusan: Option<u64>,
    #[serde(default)]
    pub konsentrasi: Vec<Konsentrasi>,
    /// Columns this service does not interpret (coordinates, address, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One row of `GET /sekolah/stat/okupasi/{kode}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: RecordId,
    #[serde(default)]
    pub nama: String,
    #[serde(default)]
    pub kota: String,
    /// Percentage as sent by the server: usually a string, sometimes a number.
    #[serde(default)]
    pub kecocokan: Value,
    #[serde(default)]
    pub jumlah_siswa: Option<u64>,
    #[serde(default)]
    pub jumlah_kelulusan: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A match record joined with the school's concentrations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedSekolah {
    pub id: RecordId,
    pub nama: String,
    pub kota: String,
    /// Two-decimal percentage, e.g. `"80.50"`.
    pub kecocokan: String,
    pub jumlah_siswa: Option<u64>,
    pub jumlah_kelulusan: Option<u64>,
    pub konsentrasi: Vec<Konsentrasi>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SekolahPayload {
    pub nama: String,
    pub kota: String,
    #[serde(default)]
    pub jumlah_siswa: u64,
    #[serde(default)]
    pub jumlah_kelulusan: u64,
    /// Ids of the concentrations this school offers.
    #[serde(default)]
    pub konsentrasi: Vec<RecordId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KonsentrasiPayload {
    pub nama: String,
}
