use async_trait::async_trait;

use crate::api_client::{encode_segment, ApiClient, ApiError};
use crate::models::{MatchRecord, Okupasi, Sekolah};

/// Read access to the three collections the matcher joins. Implement this to
/// feed the matcher from somewhere other than the live API.
///
/// Carried in `AppState` as `Arc<dyn SchoolDirectory>`.
#[async_trait]
pub trait SchoolDirectory: Send + Sync {
    /// Full occupation list (`GET /okupasi`).
    async fn okupasi_list(&self) -> Result<Vec<Okupasi>, ApiError>;

    /// One page of match statistics for an occupation code. Pages start at 1.
    async fn match_page(
        &self,
        kode: &str,
        search: Option<&str>,
        limit: usize,
        page: usize,
    ) -> Result<Vec<MatchRecord>, ApiError>;

    /// School roster with concentrations (`GET /sekolah`).
    async fn sekolah_roster(
        &self,
        search: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Sekolah>, ApiError>;
}

#[async_trait]
impl SchoolDirectory for ApiClient {
    async fn okupasi_list(&self) -> Result<Vec<Okupasi>, ApiError> {
        self.list("/okupasi", &[]).await
    }

    async fn match_page(
        &self,
        kode: &str,
        search: Option<&str>,
        limit: usize,
        page: usize,
    ) -> Result<Vec<MatchRecord>, ApiError> {
        let path = format!("/sekolah/stat/okupasi/{}", encode_segment(kode));
        let mut query = search_param(search);
        query.push(("limit", limit.to_string()));
        query.push(("page", page.to_string()));
        self.list(&path, &query).await
    }

    async fn sekolah_roster(
        &self,
        search: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Sekolah>, ApiError> {
        let mut query = search_param(search);
        query.push(("limit", limit.to_string()));
        self.list("/sekolah", &query).await
    }
}

fn search_param(search: Option<&str>) -> Vec<(&'static str, String)> {
    search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| vec![("search", s.to_string())])
        .unwrap_or_default()
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_client::{spawn_upstream, SessionContext};
    use axum::{
        extract::{Path, Query},
        routing::get,
        Json, Router,
    };
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::Arc;

    #[test]
    fn test_blank_search_is_not_sent() {
        assert!(search_param(Some("  ")).is_empty());
        assert!(search_param(None).is_empty());
        assert_eq!(search_param(Some(" smk ")), vec![("search", "smk".to_string())]);
    }

    #[tokio::test]
    async fn test_match_page_hits_stats_endpoint_with_paging() {
        let router = Router::new().route(
            "/sekolah/stat/okupasi/:kode",
            get(
                |Path(kode): Path<String>, Query(q): Query<HashMap<String, String>>| async move {
                    Json(json!({
                        "status": true,
                        "data": [{
                            "id": 1,
                            "nama": format!("{kode}|{}|{}|{}", q["search"], q["limit"], q["page"]),
                            "kecocokan": "50"
                        }]
                    }))
                },
            ),
        );
        let base = spawn_upstream(router).await;
        let client = ApiClient::new(base, Arc::new(SessionContext::new()));

        let page = client
            .match_page("TIK/01", Some("bandung"), 25, 3)
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].nama, "TIK/01|bandung|25|3");
    }

    #[tokio::test]
    async fn test_roster_passes_limit() {
        let router = Router::new().route(
            "/sekolah",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                assert!(!q.contains_key("search"));
                let value: Value = json!({
                    "status": true,
                    "data": [{ "id": q["limit"].clone(), "nama": "SMK", "konsentrasi": [] }]
                });
                Json(value)
            }),
        );
        let base = spawn_upstream(router).await;
        let client = ApiClient::new(base, Arc::new(SessionContext::new()));

        let roster = client.sekolah_roster(None, 500).await.unwrap();
        assert_eq!(roster[0].id.key(), "500");
    }
}
