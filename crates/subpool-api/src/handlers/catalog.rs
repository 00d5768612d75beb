//! Catalog reference data endpoints.

use axum::Json;
use axum::extract::State;

use crate::dto::response::{ApiResponse, CountryResponse, CurrencyResponse, ProviderResponse};
use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/catalog/providers
pub async fn list_providers(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<ProviderResponse>>>, ApiError> {
    let providers = state.catalog_repo.list_providers().await?;
    Ok(Json(ApiResponse::ok(
        providers.into_iter().map(Into::into).collect(),
    )))
}

/// GET /api/catalog/countries
pub async fn list_countries(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<CountryResponse>>>, ApiError> {
    let countries = state.catalog_repo.list_countries().await?;
    Ok(Json(ApiResponse::ok(
        countries.into_iter().map(Into::into).collect(),
    )))
}

/// GET /api/catalog/currencies
pub async fn list_currencies(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<CurrencyResponse>>>, ApiError> {
    let currencies = state.catalog_repo.list_currencies().await?;
    Ok(Json(ApiResponse::ok(
        currencies.into_iter().map(Into::into).collect(),
    )))
}
