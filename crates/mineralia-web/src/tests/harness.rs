use axum::{
    Router,
    body::{Body, to_bytes},
    http::Request,
    response::Response,
};
use tower::util::ServiceExt;
use uuid::Uuid;

use mineralia_core::store::SeedDocument;
use mineralia_core::{Catalog, CatalogConfig, SqliteCatalogStore};

use crate::{WebState, app_router};

const FIXTURE: &str = include_str!("../../../mineralia-core/tests/fixtures/catalog_seed.yaml");

pub(super) struct TestHarness {
    _temp: tempfile::TempDir,
    pub(super) router: Router,
    minerals: std::collections::BTreeMap<String, Uuid>,
}

impl TestHarness {
    pub(super) fn setup() -> Self {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = SqliteCatalogStore::open(temp.path().join("catalog.sqlite3")).expect("store");
        let doc = SeedDocument::from_yaml_str(FIXTURE).expect("parse fixture");
        let report = store.apply_seed(&doc).expect("seed fixture");

        let state = WebState::new(Catalog::new(store, CatalogConfig::default()));
        Self {
            _temp: temp,
            router: app_router(state),
            minerals: report.minerals,
        }
    }

    pub(super) fn mineral_id(&self, name: &str) -> Uuid {
        *self
            .minerals
            .get(name)
            .unwrap_or_else(|| panic!("fixture mineral missing: {name}"))
    }

    pub(super) async fn get(&self, path: &str) -> Response {
        self.send(
            Request::builder()
                .uri(path)
                .body(Body::empty())
                .expect("request"),
        )
        .await
    }

    pub(super) async fn send(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router response")
    }
}

pub(super) async fn decode_json<T: serde::de::DeserializeOwned>(response: Response) -> T {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body bytes");
    serde_json::from_slice(&bytes).expect("decode json")
}

pub(super) fn header_value<'a>(headers: &'a axum::http::HeaderMap, key: &str) -> Option<&'a str> {
    headers.get(key).and_then(|value| value.to_str().ok())
}
