//! Listing request extraction.

use axum::{
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use strata_core::QuerySpec;

use crate::infra::errors::AppError;

/// A validated [`QuerySpec`] taken from the request's query string.
///
/// Malformed query strings and invalid parameters both reject with an
/// [`AppError`], so every failure carries the registry's JSON error body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingQuery(pub QuerySpec);

impl<S> FromRequestParts<S> for ListingQuery
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let Query(params) = Query::<Vec<(String, String)>>::try_from_uri(&parts.uri)
            .map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
        Ok(Self(QuerySpec::from_params(params)?))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{Request, StatusCode};
    use strata_model::ImageId;

    use super::*;

    async fn extract(uri: &str) -> Result<ListingQuery, AppError> {
        let (mut parts, _) = Request::builder().uri(uri).body(()).unwrap().into_parts();
        ListingQuery::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn decodes_listing_parameters() {
        let ListingQuery(spec) = extract("/images?marker=4&name=fake%20image")
            .await
            .unwrap();
        assert_eq!(spec.marker, Some(ImageId(4)));
        assert_eq!(spec.filters.name.as_deref(), Some("fake image"));
    }

    #[tokio::test]
    async fn invalid_parameters_reject_as_app_errors() {
        let err = extract("/images?limit=many").await.unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.message.contains("limit"));
    }
}
