// DTOs - request and response shapes of the HTTP API
pub mod auth;
pub mod common;
pub mod order;
pub mod payment;
pub mod product;
pub mod shop;
pub mod user;
