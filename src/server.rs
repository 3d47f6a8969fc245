use crate::config::AppConfig;
use crate::data;
use crate::mutate;
use crate::render::{MapRenderer, Popup};
use crate::store::DistrictStore;
use crate::types::PowerStatus;
use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use geo::algorithm::bounding_rect::BoundingRect;
use geo::algorithm::contains::Contains;
use geo::Point;
use geojson::FeatureCollection;
use rstar::{RTree, RTreeObject, AABB};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::info;

// Wrapper for RTree indexing. Status updates never touch geometry or
// district order, so the index built at startup stays valid for the
// lifetime of the server.
struct DistrictIndex {
    index: usize,
    aabb: AABB<[f64; 2]>,
}

impl RTreeObject for DistrictIndex {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        self.aabb
    }
}

pub struct AppState {
    pub store: RwLock<DistrictStore>,
    pub renderer: MapRenderer,
    tree: RTree<DistrictIndex>,
}

#[derive(Deserialize)]
pub struct QueryParams {
    lat: f64,
    lon: f64,
}

#[derive(Deserialize)]
pub struct UpdateRequest {
    pub district: String,
    pub status: String,
    #[serde(default)]
    pub outage_start: String,
    #[serde(default)]
    pub outage_end: String,
}

#[derive(Serialize)]
pub struct QueryResponse {
    pub district: String,
    pub population: String,
    pub status: String,
    pub outage_start: String,
    pub outage_end: String,
}

#[derive(Serialize)]
pub struct LegendEntry {
    pub label: &'static str,
    pub color: String,
}

pub async fn start_server(config: AppConfig, store: DistrictStore) -> Result<()> {
    let dataset = store.current()?;

    info!("Building spatial index for {} districts...", dataset.len());
    let tree_items: Vec<DistrictIndex> = dataset
        .districts
        .iter()
        .enumerate()
        .filter_map(|(i, district)| {
            district.geometry.bounding_rect().map(|rect| DistrictIndex {
                index: i,
                aabb: AABB::from_corners(
                    [rect.min().x, rect.min().y],
                    [rect.max().x, rect.max().y],
                ),
            })
        })
        .collect();
    let tree = RTree::bulk_load(tree_items);

    let state = Arc::new(AppState {
        store: RwLock::new(store),
        renderer: MapRenderer::new(config.map.clone()),
        tree,
    });

    let port = config.server.port;
    let addr = SocketAddr::from(([127, 0, 0, 1], port));

    info!("Starting server on http://{}", addr);

    let app = Router::new()
        .route("/api/districts", get(districts_handler))
        .route("/api/districts/update", post(update_handler))
        .route("/api/query", get(query_handler))
        .route("/api/legend", get(legend_handler))
        .nest_service("/", ServeDir::new(&config.server.static_dir))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Current snapshot as a styled FeatureCollection. The browser treats
/// every response as a full redraw.
async fn districts_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<FeatureCollection>, StatusCode> {
    let store = state.store.read().await;
    let dataset = store
        .current()
        .map_err(|_| StatusCode::SERVICE_UNAVAILABLE)?;
    Ok(Json(data::to_feature_collection(
        &dataset,
        store.keys(),
        &state.renderer,
    )))
}

/// Operator edit: mutate, publish, and hand back the fresh snapshot.
/// Unknown district names are a lenient no-op, never an error status.
async fn update_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpdateRequest>,
) -> Result<Json<FeatureCollection>, StatusCode> {
    let mut store = state.store.write().await;
    let current = store
        .current()
        .map_err(|_| StatusCode::SERVICE_UNAVAILABLE)?;

    let next = Arc::new(mutate::apply(
        &current,
        &req.district,
        PowerStatus::parse(&req.status),
        &req.outage_start,
        &req.outage_end,
    ));
    store.replace(Arc::clone(&next));

    Ok(Json(data::to_feature_collection(
        &next,
        store.keys(),
        &state.renderer,
    )))
}

/// Point-in-district lookup for popups.
async fn query_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<QueryParams>,
) -> Result<Json<Option<QueryResponse>>, StatusCode> {
    let store = state.store.read().await;
    let dataset = store
        .current()
        .map_err(|_| StatusCode::SERVICE_UNAVAILABLE)?;

    let point = Point::new(params.lon, params.lat);
    let envelope = AABB::from_point([params.lon, params.lat]);

    for candidate in state.tree.locate_in_envelope_intersecting(&envelope) {
        if let Some(district) = dataset.districts.get(candidate.index) {
            if district.geometry.contains(&point) {
                let popup = Popup::for_district(district);
                return Ok(Json(Some(QueryResponse {
                    district: popup.district,
                    population: popup.population,
                    status: popup.status,
                    outage_start: popup.outage_start,
                    outage_end: popup.outage_end,
                })));
            }
        }
    }

    Ok(Json(None))
}

/// The three visual classes with their configured colors.
async fn legend_handler(State(state): State<Arc<AppState>>) -> Json<Vec<LegendEntry>> {
    let entries = [
        ("Outage", PowerStatus::Outage),
        ("Powered", PowerStatus::Powered),
        ("Other", PowerStatus::Unset),
    ]
    .into_iter()
    .map(|(label, status)| LegendEntry {
        label,
        color: state.renderer.style_for(&status).color,
    })
    .collect();
    Json(entries)
}
