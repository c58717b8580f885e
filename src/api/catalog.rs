use axum::{extract::State, Json};

use super::error::ApiError;
use super::types::TokenResponse;
use crate::server::AppState;

pub async fn get_catalog_token(
    State(state): State<AppState>,
) -> Result<Json<TokenResponse>, ApiError> {
    let token = state.catalog.login().await?;
    Ok(Json(TokenResponse { token }))
}
