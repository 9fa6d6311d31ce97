// Admin CRUD over the remote API. Each managed entity is a `Resource`; the
// handlers are generic over it, so adding an entity is one trait impl plus a
// line in the router.

pub mod handlers;
pub mod validation;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::api_client::encode_segment;
use crate::models::{
    Asesmen, AsesmenPayload, Konsentrasi, KonsentrasiPayload, Okupasi, OkupasiPayload, Sekolah,
    SekolahPayload, UnitKompetensi, UnitKompetensiPayload,
};
use validation::Validate;

pub trait Resource: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Collection name, shared by the remote path and our own route.
    const COLLECTION: &'static str;

    /// Create/update body.
    type Payload: Validate + Serialize + DeserializeOwned + Send + Sync + 'static;

    fn collection_path() -> String {
        format!("/{}", Self::COLLECTION)
    }

    /// Remote path of one item. Okupasi is keyed by `kode`, the rest by `id`.
    fn item_path(key: &str) -> String {
        format!("/{}/{}", Self::COLLECTION, encode_segment(key))
    }
}

impl Resource for Sekolah {
    const COLLECTION: &'static str = "sekolah";
    type Payload = SekolahPayload;
}

impl Resource for Okupasi {
    const COLLECTION: &'static str = "okupasi";
    type Payload = OkupasiPayload;
}

impl Resource for UnitKompetensi {
    const COLLECTION: &'static str = "unit-kompetensi";
    type Payload = UnitKompetensiPayload;
}

impl Resource for Konsentrasi {
    const COLLECTION: &'static str = "konsentrasi";
    type Payload = KonsentrasiPayload;
}

impl Resource for Asesmen {
    const COLLECTION: &'static str = "asesmen";
    type Payload = AsesmenPayload;
}
