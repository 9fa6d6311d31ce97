pub mod auth;
pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::admin::handlers::resource_routes;
use crate::matching::handlers::handle_match_schools;
use crate::models::{Asesmen, Konsentrasi, Okupasi, Sekolah, UnitKompetensi};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let router = Router::new()
        .route("/health", get(health::health_handler))
        // Session
        .route("/api/v1/auth/login", post(auth::handle_login))
        .route("/api/v1/auth/logout", post(auth::handle_logout))
        .route("/api/v1/auth/session", get(auth::handle_session))
        // Occupation → school search
        .route("/api/v1/okupasi/:key/sekolah", get(handle_match_schools));

    // Admin CRUD
    let router = resource_routes::<Sekolah>(router);
    let router = resource_routes::<Okupasi>(router);
    let router = resource_routes::<UnitKompetensi>(router);
    let router = resource_routes::<Konsentrasi>(router);
    let router = resource_routes::<Asesmen>(router);

    router.with_state(state)
}
