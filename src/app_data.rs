use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::config::ApplicationSettings;
use crate::providers::{Mailer, TokenProvider, mailer_from_settings};
use crate::stores::{MembershipStore, OrderStore, PaymentStore, ProductStore, ShopStore, UserStore};

/// Centralized application data following the main-owned stores pattern
///
/// Everything is created once in main.rs and shared across coordinators.
///
/// ```text
/// main.rs
///   ↓
/// AppData::init(db, settings)
///   ↓ creates once
///   ├─ db (DatabaseConnection pool)
///   ├─ settings (Arc<ApplicationSettings>)
///   ├─ mailer (Arc<dyn Mailer>)
///   ├─ token_provider (Arc<TokenProvider>)
///   └─ stores (user, membership, shop, product, order, payment)
///   ↓ wrapped in Arc<AppData>
///   ↓ passed to coordinators
///   └─ XCoordinator::new(app_data) → extracts stores, creates providers
/// ```
pub struct AppData {
    pub db: DatabaseConnection,
    pub settings: Arc<ApplicationSettings>,
    pub mailer: Arc<dyn Mailer>,
    pub token_provider: Arc<TokenProvider>,
    pub user_store: Arc<UserStore>,
    pub membership_store: Arc<MembershipStore>,
    pub shop_store: Arc<ShopStore>,
    pub product_store: Arc<ProductStore>,
    pub order_store: Arc<OrderStore>,
    pub payment_store: Arc<PaymentStore>,
}

impl AppData {
    /// Build application data with the mailer chosen from settings
    ///
    /// The database must already be migrated.
    pub fn init(db: DatabaseConnection, settings: ApplicationSettings) -> Self {
        let mailer = mailer_from_settings(&settings);
        Self::with_mailer(db, settings, mailer)
    }

    pub fn with_mailer(db: DatabaseConnection, settings: ApplicationSettings, mailer: Arc<dyn Mailer>) -> Self {
        tracing::debug!("Initializing AppData...");
        let settings = Arc::new(settings);

        Self {
            db,
            token_provider: Arc::new(TokenProvider::new(settings.clone())),
            settings,
            mailer,
            user_store: Arc::new(UserStore::new()),
            membership_store: Arc::new(MembershipStore::new()),
            shop_store: Arc::new(ShopStore::new()),
            product_store: Arc::new(ProductStore::new()),
            order_store: Arc::new(OrderStore::new()),
            payment_store: Arc::new(PaymentStore::new()),
        }
    }
}
