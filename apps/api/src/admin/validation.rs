use serde::{Deserialize, Serialize};

use crate::models::{
    AsesmenPayload, KonsentrasiPayload, OkupasiPayload, SekolahPayload, UnitKompetensiPayload,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Form-level checks run before anything is sent to the remote API.
/// Returns every violation, not just the first.
pub trait Validate {
    fn validate(&self) -> Vec<FieldError>;
}

#[derive(Default)]
struct Violations(Vec<FieldError>);

impl Violations {
    fn push(&mut self, field: &str, message: impl Into<String>) {
        self.0.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    fn required(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.push(field, "must not be empty");
        }
    }
}

impl Validate for SekolahPayload {
    fn validate(&self) -> Vec<FieldError> {
        let mut v = Violations::default();
        v.required("nama", &self.nama);
        v.required("kota", &self.kota);
        if self.jumlah_kelulusan > self.jumlah_siswa {
            v.push(
                "jumlah_kelulusan",
                format!(
                    "cannot exceed jumlah_siswa ({} > {})",
                    self.jumlah_kelulusan, self.jumlah_siswa
                ),
            );
        }
        v.0
    }
}

impl Validate for OkupasiPayload {
    fn validate(&self) -> Vec<FieldError> {
        let mut v = Violations::default();
        v.required("kode", &self.kode);
        if self.kode.trim().chars().any(char::is_whitespace) {
            v.push("kode", "must not contain whitespace");
        }
        v.required("nama", &self.nama);
        v.0
    }
}

impl Validate for UnitKompetensiPayload {
    fn validate(&self) -> Vec<FieldError> {
        let mut v = Violations::default();
        v.required("kode_okupasi", &self.kode_okupasi);
        v.required("kode_unit", &self.kode_unit);
        v.required("nama", &self.nama);
        v.0
    }
}

impl Validate for KonsentrasiPayload {
    fn validate(&self) -> Vec<FieldError> {
        let mut v = Violations::default();
        v.required("nama", &self.nama);
        v.0
    }
}

impl Validate for AsesmenPayload {
    fn validate(&self) -> Vec<FieldError> {
        let mut v = Violations::default();
        v.required("judul", &self.judul);
        let url = self.url.trim();
        let has_host = url
            .strip_prefix("https://")
            .or_else(|| url.strip_prefix("http://"))
            .map(|rest| !rest.is_empty())
            .unwrap_or(false);
        if !has_host {
            v.push("url", "must be an http(s) URL");
        }
        v.0
    }
}
