use std::net::IpAddr;

use crate::{errors::InternalError, providers::TokenProvider, types::internal::auth::Claims};
use poem::Request;

use super::{request_id::RequestId, request_source::RequestSource};

/// Request context that flows through all layers
///
/// Carries the request id and client address for log correlation, plus the
/// validated JWT claims once the caller has been authenticated.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestContext {
    /// IP address of the client making the request
    pub ip_address: Option<IpAddr>,

    /// Unique identifier for this request (for tracing across layers)
    pub request_id: RequestId,

    /// Whether the request is authenticated (JWT validated successfully)
    pub authenticated: bool,

    /// Full JWT claims if authenticated
    pub claims: Option<Claims>,

    /// Source of the request (API or CLI)
    pub source: RequestSource,

    /// Actor who initiated the operation
    pub actor_id: String,
}

impl RequestContext {
    /// Create an unauthenticated context for an API request
    pub fn for_api(req: &Request) -> Self {
        Self {
            ip_address: Self::extract_ip_address(req),
            request_id: RequestId::new(),
            authenticated: false,
            claims: None,
            source: RequestSource::API,
            actor_id: "anonymous".to_owned(),
        }
    }

    /// Create a RequestContext for CLI operations
    ///
    /// # Arguments
    /// * `command_name` - Name of the CLI command being executed
    pub fn for_cli(command_name: &str) -> Self {
        Self {
            ip_address: None,
            request_id: RequestId::new(),
            authenticated: false,
            claims: None,
            source: RequestSource::CLI,
            actor_id: format!("cli:{}", command_name),
        }
    }

    /// Create an authenticated context from a bearer token
    ///
    /// # Arguments
    /// * `req` - The HTTP request
    /// * `token` - Raw bearer token taken from the Authorization header
    /// * `token_provider` - TokenProvider for JWT validation
    ///
    /// # Returns
    /// * `Ok(RequestContext)` - Context with validated claims
    /// * `Err(InternalError)` - Token was invalid or expired
    pub fn authenticate(
        req: &Request,
        token: &str,
        token_provider: &TokenProvider,
    ) -> Result<Self, InternalError> {
        let claims = token_provider.validate_jwt(token)?;
        let actor_id = claims.sub.clone();

        let ctx = Self::for_api(req).with_auth(claims).with_actor_id(actor_id);
        tracing::trace!("Request context created: {:?}", ctx);

        Ok(ctx)
    }

    /// Extract IP address from request headers
    ///
    /// Checks X-Forwarded-For, X-Real-IP, and falls back to remote address.
    fn extract_ip_address(req: &Request) -> Option<IpAddr> {
        if let Some(forwarded) = req.header("X-Forwarded-For") {
            if let Some(ip) = forwarded.split(',').next() {
                return ip.trim().parse().ok();
            }
        }

        if let Some(real_ip) = req.header("X-Real-IP") {
            return real_ip.parse().ok();
        }

        req.remote_addr().as_socket_addr().map(|addr| addr.ip())
    }

    /// Set authentication state with claims
    pub fn with_auth(mut self, claims: Claims) -> Self {
        self.authenticated = true;
        self.claims = Some(claims);
        self
    }

    /// Set the actor_id
    pub fn with_actor_id(mut self, actor_id: impl Into<String>) -> Self {
        self.actor_id = actor_id.into();
        self
    }

    /// User id of the authenticated caller
    ///
    /// Fails with `Unauthorized` when the context carries no validated claims.
    pub fn user_id(&self) -> Result<&str, InternalError> {
        match (&self.claims, self.authenticated) {
            (Some(claims), true) => Ok(claims.sub.as_str()),
            _ => Err(InternalError::unauthorized("You are not logged in")),
        }
    }
}
