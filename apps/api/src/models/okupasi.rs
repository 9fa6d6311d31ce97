use serde::{Deserialize, Serialize};

use super::RecordId;

/// An occupational profile, identified by its unique `kode`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Okupasi {
    pub kode: String,
    #[serde(default)]
    pub nama: String,
    /// Ordered as the remote API returns them.
    #[serde(default)]
    pub unit_kompetensi: Vec<UnitKompetensi>,
}

/// A competency unit. Belongs to exactly one occupation (`kode_okupasi`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitKompetensi {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(default)]
    pub kode_unit: String,
    #[serde(default)]
    pub nama: String,
    #[serde(default)]
    pub standar_kompetensi: String,
    /// Absent when the unit is nested inside its parent occupation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kode_okupasi: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OkupasiPayload {
    pub kode: String,
    pub nama: String,
}

/// Create/update body for a competency unit. The parent code is always sent,
/// so moving a unit to another occupation is an explicit edit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitKompetensiPayload {
    pub kode_okupasi: String,
    pub kode_unit: String,
    pub nama: String,
    #[serde(default)]
    pub standar_kompetensi: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_okupasi_with_nested_units_decodes() {
        let raw = json!({
            "kode": "1234",
            "nama": "Teknisi Jaringan",
            "unit_kompetensi": [
                { "id": 1, "kode_unit": "J.61", "nama": "Instalasi", "standar_kompetensi": "SKKNI 2019" },
                { "id": "2", "kode_unit": "J.62", "nama": "Konfigurasi" }
            ]
        });
        let okupasi: Okupasi = serde_json::from_value(raw).unwrap();
        assert_eq!(okupasi.unit_kompetensi.len(), 2);
        assert_eq!(okupasi.unit_kompetensi[0].kode_unit, "J.61");
        assert_eq!(okupasi.unit_kompetensi[1].standar_kompetensi, "");
        assert!(okupasi.unit_kompetensi[1].kode_okupasi.is_none());
    }

    #[test]
    fn test_okupasi_without_units_defaults_empty() {
        let okupasi: Okupasi = serde_json::from_value(json!({ "kode": "9" })).unwrap();
        assert!(okupasi.unit_kompetensi.is_empty());
        assert_eq!(okupasi.nama, "");
    }
}
