// Providers layer - Work performers and business logic
//
// Providers contain business logic and provide composable operations that
// coordinators can orchestrate. They take the connection (or transaction) to
// work on and never open transactions themselves.

pub mod authorization_provider;
pub mod crypto_provider;
pub mod membership_provider;
pub mod notification_provider;
pub mod order_provider;
pub mod token_provider;

pub use authorization_provider::AuthorizationProvider;
pub use crypto_provider::CryptoProvider;
pub use membership_provider::MembershipProvider;
pub use notification_provider::{
    EmailData, EmailTemplate, LogMailer, Mailer, MailtrapMailer, Recipient, RecordingMailer, SentEmail,
    mailer_from_settings,
};
pub use order_provider::{OrderLine, OrderPlan, OrderProvider};
pub use token_provider::TokenProvider;
