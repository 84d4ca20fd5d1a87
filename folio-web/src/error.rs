use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use folio_core::FolioError;
use folio_portfolio::PortfolioError;
use tracing::error;

#[derive(Debug)]
pub struct FolioAxumError(pub anyhow::Error);

impl From<anyhow::Error> for FolioAxumError {
    fn from(e: anyhow::Error) -> Self {
        Self(e)
    }
}

impl From<FolioError> for FolioAxumError {
    fn from(e: FolioError) -> Self {
        Self(e.into_anyhow())
    }
}

impl From<PortfolioError> for FolioAxumError {
    fn from(e: PortfolioError) -> Self {
        FolioError::from(e).into()
    }
}

impl IntoResponse for FolioAxumError {
    fn into_response(self) -> Response {
        // A FolioError anywhere in the chain keeps its Feathers fields
        let safe = match FolioError::from_anyhow(&self.0) {
            Some(folio) => folio.sanitize_for_client(),
            None => FolioError::general_error(self.0.to_string()),
        };

        if safe.code() >= 500 {
            error!("{:#}", self.0);
        }

        let status = StatusCode::from_u16(safe.code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(safe.to_json())).into_response()
    }
}
