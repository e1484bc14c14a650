use poem::Request;
use poem::http::StatusCode;
use poem_openapi::payload::{Json, Response};
use poem_openapi::types::{ParseFromJSON, ToJSON};

use crate::api::BearerAuth;
use crate::errors::ApiError;
use crate::providers::TokenProvider;
use crate::types::dto::common::DataResponse;
use crate::types::internal::RequestContext;

/// `200` with the payload wrapped in `{"data": ...}`
pub type DataResult<T> = Result<Json<DataResponse<T>>, ApiError>;

/// `201` with the created resource wrapped in `{"data": ...}`
pub type CreatedResult<T> = Result<Response<Json<DataResponse<T>>>, ApiError>;

/// Validate the bearer token and build an authenticated context
pub fn authenticated_context(
    req: &Request,
    auth: &BearerAuth,
    token_provider: &TokenProvider,
) -> Result<RequestContext, ApiError> {
    RequestContext::authenticate(req, &auth.0.token, token_provider).map_err(ApiError::from)
}

pub fn ok<T: ParseFromJSON + ToJSON>(data: T) -> Json<DataResponse<T>> {
    Json(DataResponse::new(data))
}

pub fn created<T: ParseFromJSON + ToJSON>(data: T) -> Response<Json<DataResponse<T>>> {
    Response::new(ok(data)).status(StatusCode::CREATED)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use poem_openapi::auth::Bearer;

    use crate::test::utils::test_settings;

    fn bearer(token: &str) -> BearerAuth {
        BearerAuth(Bearer {
            token: token.to_string(),
        })
    }

    #[test]
    fn test_valid_token_authenticates() {
        let token_provider = TokenProvider::new(Arc::new(test_settings()));
        let token = token_provider.generate_jwt("user-1").unwrap();
        let req = Request::builder().finish();

        let ctx = authenticated_context(&req, &bearer(&token), &token_provider).unwrap();

        assert!(ctx.authenticated);
        assert_eq!(ctx.user_id().unwrap(), "user-1");
        assert_eq!(ctx.actor_id, "user-1");
    }

    #[test]
    fn test_garbage_token_is_unauthorized() {
        let token_provider = TokenProvider::new(Arc::new(test_settings()));
        let req = Request::builder().finish();

        let err = authenticated_context(&req, &bearer("not-a-jwt"), &token_provider).unwrap_err();

        assert_eq!(err.status_code(), 401);
    }
}
