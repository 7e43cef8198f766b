//! HTTP handler functions for the hotspot map API.

use actix_web::{HttpResponse, web};
use hotspot_map_server_models::{
    ApiError, ApiHealth, ApiNearbyHotspot, ApiWithinBounds, BoundsQueryParams, NearbyQueryParams,
};
use hotspot_map_spatial::{BoundsQuery, NearbyQuery};

use crate::AppState;

/// `GET /api/health`
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        hotspots: state.store.len(),
    })
}

/// `GET /api/hotspots/within-bounds?bounds=west,south,east,north`
///
/// A viewport with `west > east` crosses the antimeridian.
pub async fn within_bounds(
    state: web::Data<AppState>,
    params: web::Query<BoundsQueryParams>,
) -> HttpResponse {
    let query = match BoundsQuery::parse(&params.bounds) {
        Ok(query) => query,
        Err(e) => {
            log::debug!("Rejected within-bounds query: {e}");
            return HttpResponse::BadRequest().json(ApiError::new(e));
        }
    };

    let hotspots = state.store.within_bounds(&query);
    HttpResponse::Ok().json(ApiWithinBounds::from(hotspots))
}

/// `GET /api/hotspots/nearby/{lat},{lng}?radiusKm=&limit=`
///
/// Results are nearest first and never exceed the server-side limit cap.
pub async fn nearby(
    state: web::Data<AppState>,
    path: web::Path<String>,
    params: web::Query<NearbyQueryParams>,
) -> HttpResponse {
    let query = match NearbyQuery::parse(&path, params.radius_km, params.limit) {
        Ok(query) => query,
        Err(e) => {
            log::debug!("Rejected nearby query: {e}");
            return HttpResponse::BadRequest().json(ApiError::new(e));
        }
    };

    let results: Vec<ApiNearbyHotspot> = state
        .store
        .nearby(&query)
        .into_iter()
        .map(|hit| ApiNearbyHotspot::new(hit.hotspot, hit.distance_km))
        .collect();

    HttpResponse::Ok().json(results)
}
