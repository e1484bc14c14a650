// Test utilities shared across unit tests
// Only compiled when running tests

use std::sync::Arc;

use migration::{Migrator, MigratorTrait};
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection};

use crate::app_data::AppData;
use crate::config::{ApplicationSettings, MockEnvironment};
use crate::providers::RecordingMailer;
use crate::stores::order_store::{NewOrder, NewOrderItem};
use crate::stores::product_store::NewProduct;
use crate::stores::shop_store::NewShop;
use crate::stores::user_store::NewUser;
use crate::stores::{MembershipStore, OrderStore, ProductStore, ShopStore, UserStore};
use crate::types::db::{order, shop, user};
use crate::types::internal::Role;

pub const TEST_JWT_SECRET: &str = "test-secret-key-minimum-32-characters-long";

/// Fresh in-memory database with every migration applied
pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create test database");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

/// Settings with a fixed JWT secret and default limits (free 10, monthly 100)
pub fn test_settings() -> ApplicationSettings {
    let env = MockEnvironment::empty()
        .with_var("JWT_SECRET", TEST_JWT_SECRET)
        .with_var("CLIENT_ORIGIN", "http://localhost:3000");

    ApplicationSettings::from_env_provider(Arc::new(env)).expect("Failed to build test settings")
}

/// AppData over a fresh database, with a mailer that records instead of sending
pub async fn setup_test_app_data() -> (Arc<AppData>, Arc<RecordingMailer>) {
    let db = setup_test_db().await;
    let mailer = Arc::new(RecordingMailer::new());
    let app_data = AppData::with_mailer(db, test_settings(), mailer.clone());

    (Arc::new(app_data), mailer)
}

/// Verified user with the `user` role and a free membership (limit 10)
///
/// The stored password hash is a placeholder; use the auth workflow when a
/// test needs to sign in.
pub async fn create_test_user(db: &DatabaseConnection, email: &str) -> user::Model {
    let user_store = UserStore::new();
    let created = user_store
        .create(db, NewUser {
            name: "Test User".to_string(),
            email: email.to_string(),
            password_hash: "not-a-real-hash".to_string(),
            photo: None,
            verification_code: None,
        })
        .await
        .expect("Failed to create test user");

    user_store
        .add_role(db, &created.id, Role::User)
        .await
        .expect("Failed to grant user role");
    MembershipStore::new()
        .create_for_user(db, &created.id, 10)
        .await
        .expect("Failed to create membership");

    let mut model: user::ActiveModel = created.into();
    model.verified = Set(true);
    model.update(db).await.expect("Failed to verify test user")
}

pub async fn create_test_shop(db: &DatabaseConnection, owner_id: &str, name: &str) -> shop::Model {
    ShopStore::new()
        .create(db, NewShop {
            name: name.to_string(),
            description: String::new(),
            owner_id: owner_id.to_string(),
        })
        .await
        .expect("Failed to create test shop")
}

/// Pending order of 2 x Tonkotsu (1200) placed by a fresh buyer at a fresh shop
pub async fn create_test_order(db: &DatabaseConnection) -> order::Model {
    let owner = create_test_user(db, "order-owner@example.com").await;
    let buyer = create_test_user(db, "order-buyer@example.com").await;
    let shop = create_test_shop(db, &owner.id, "Ramen House").await;
    let product = ProductStore::new()
        .create(db, NewProduct {
            shop_id: shop.id.clone(),
            name: "Tonkotsu".to_string(),
            description: String::new(),
            price: 1200,
            stock: 10,
        })
        .await
        .expect("Failed to create test product");

    let (created, _items) = OrderStore::new()
        .create(db, NewOrder {
            user_id: buyer.id,
            shop_id: shop.id,
            total_price: 2400,
            items: vec![NewOrderItem {
                product_id: product.id,
                product_name: product.name,
                product_price: product.price,
                quantity: 2,
            }],
        })
        .await
        .expect("Failed to create test order");

    created
}
