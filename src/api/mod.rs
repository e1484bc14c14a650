// API layer - HTTP endpoints
pub mod auth;
pub mod health;
pub mod helpers;
pub mod order;
pub mod payment;
pub mod product;
pub mod shop;
pub mod user;

use std::sync::Arc;

use poem::http::Method;
use poem::middleware::Cors;
use poem::{Endpoint, EndpointExt, Response, Route};
use poem_openapi::auth::Bearer;
use poem_openapi::{OpenApiService, SecurityScheme};

use crate::app_data::AppData;

pub use auth::AuthApi;
pub use health::HealthApi;
pub use order::OrderApi;
pub use payment::PaymentApi;
pub use product::ProductApi;
pub use shop::ShopApi;
pub use user::UserApi;

/// JWT Bearer token authentication
#[derive(SecurityScheme)]
#[oai(ty = "bearer", key_name = "Authorization", key_in = "header", bearer_format = "JWT")]
pub struct BearerAuth(pub Bearer);

/// Build the full HTTP application: `/api` endpoints, `/swagger` UI and CORS
pub fn build_routes(app_data: Arc<AppData>) -> impl Endpoint<Output = Response> {
    let api_service = OpenApiService::new(
        (
            HealthApi,
            AuthApi::new(app_data.clone()),
            UserApi::new(app_data.clone()),
            ShopApi::new(app_data.clone()),
            ProductApi::new(app_data.clone()),
            OrderApi::new(app_data.clone()),
            PaymentApi::new(app_data.clone()),
        ),
        "Ramen Marketplace API",
        env!("CARGO_PKG_VERSION"),
    )
    .server("/api");
    let ui = api_service.swagger_ui();

    let cors = Cors::new()
        .allow_origin(app_data.settings.client_origin())
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_credentials(true);

    Route::new()
        .nest("/api", api_service)
        .nest("/swagger", ui)
        .with(cors)
}
