// Common test utilities for integration tests
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use migration::{Migrator, MigratorTrait};
use poem::test::{TestClient, TestResponse};
use poem::{EndpointExt, endpoint::BoxEndpoint};
use ramen_backend::api::build_routes;
use ramen_backend::app_data::AppData;
use ramen_backend::config::{ApplicationSettings, EnvironmentProvider};
use ramen_backend::providers::{EmailTemplate, RecordingMailer};
use sea_orm::{Database, DatabaseConnection};
use serde_json::{Value, json};

pub const TEST_JWT_SECRET: &str = "integration-secret-key-minimum-32-chars";
pub const TEST_PASSWORD: &str = "password123";

/// Fixed set of variables standing in for the process environment
pub struct TestEnvironment {
    vars: HashMap<String, String>,
}

impl TestEnvironment {
    pub fn new(vars: &[(&str, &str)]) -> Self {
        Self {
            vars: vars
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
        }
    }
}

impl EnvironmentProvider for TestEnvironment {
    fn get_var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

pub fn test_settings() -> ApplicationSettings {
    let env = TestEnvironment::new(&[
        ("JWT_SECRET", TEST_JWT_SECRET),
        ("CLIENT_ORIGIN", "http://localhost:3000"),
    ]);
    ApplicationSettings::from_env_provider(Arc::new(env)).expect("Failed to build test settings")
}

/// Creates a test database with migrations applied
pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create test database");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

/// The full HTTP application over an in-memory database
pub struct TestApp {
    pub client: TestClient<BoxEndpoint<'static>>,
    pub app_data: Arc<AppData>,
    pub mailer: Arc<RecordingMailer>,
}

pub async fn spawn_app() -> TestApp {
    let db = setup_test_db().await;
    let mailer = Arc::new(RecordingMailer::new());
    let app_data = Arc::new(AppData::with_mailer(db, test_settings(), mailer.clone()));

    TestApp {
        client: TestClient::new(build_routes(app_data.clone()).boxed()),
        app_data,
        mailer,
    }
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

/// Decode the JSON body of a response
pub async fn body(resp: TestResponse) -> Value {
    resp.0
        .into_body()
        .into_json()
        .await
        .expect("Response body is not JSON")
}

impl TestApp {
    /// Register, verify through the emailed link and sign in; returns `(user_id, token)`
    pub async fn signup(&self, name: &str, email: &str) -> (String, String) {
        let resp = self
            .client
            .post("/api/auth/register")
            .body_json(&json!({
                "name": name,
                "email": email,
                "password": TEST_PASSWORD,
                "password_confirm": TEST_PASSWORD,
            }))
            .send()
            .await;
        resp.assert_status(poem::http::StatusCode::CREATED);
        let user_id = body(resp).await["data"]["id"]
            .as_str()
            .expect("user id")
            .to_string();

        let email_sent = self
            .mailer
            .last_to(email, EmailTemplate::VerificationCode)
            .expect("verification email");
        let code = email_sent.data.url.rsplit('/').next().expect("code in link").to_string();
        self.client
            .get(format!("/api/auth/verifyemail/{}", code))
            .send()
            .await
            .assert_status_is_ok();

        let token = self.login(email, TEST_PASSWORD).await;
        (user_id, token)
    }

    pub async fn login(&self, email: &str, password: &str) -> String {
        let resp = self
            .client
            .post("/api/auth/login")
            .body_json(&json!({ "email": email, "password": password }))
            .send()
            .await;
        resp.assert_status_is_ok();
        body(resp).await["data"]["access_token"]
            .as_str()
            .expect("access token")
            .to_string()
    }

    /// Shop "Ramen House" with Tonkotsu (1200, stock 10); returns `(shop_id, product_id)`
    pub async fn ramen_house(&self, owner_token: &str) -> (String, String) {
        let resp = self
            .client
            .post("/api/shops")
            .header("Authorization", bearer(owner_token))
            .body_json(&json!({ "name": "Ramen House", "description": "Since 1998" }))
            .send()
            .await;
        resp.assert_status(poem::http::StatusCode::CREATED);
        let shop_id = body(resp).await["data"]["id"].as_str().expect("shop id").to_string();

        let resp = self
            .client
            .post(format!("/api/shops/{}/products", shop_id))
            .header("Authorization", bearer(owner_token))
            .body_json(&json!({ "name": "Tonkotsu", "price": 1200, "stock": 10 }))
            .send()
            .await;
        resp.assert_status(poem::http::StatusCode::CREATED);
        let product_id = body(resp).await["data"]["id"].as_str().expect("product id").to_string();

        (shop_id, product_id)
    }

    /// Order `quantity` of a product; returns the decoded response body
    pub async fn place_order(&self, token: &str, shop_id: &str, product_id: &str, quantity: i32) -> Value {
        let resp = self
            .client
            .post(format!("/api/shops/{}/orders", shop_id))
            .header("Authorization", bearer(token))
            .body_json(&json!({ "items": [{ "product_id": product_id, "quantity": quantity }] }))
            .send()
            .await;
        resp.assert_status(poem::http::StatusCode::CREATED);
        body(resp).await
    }
}
