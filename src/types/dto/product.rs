use poem_openapi::Object;

use crate::errors::InternalError;
use crate::types::db::product;
use crate::types::dto::common::format_timestamp;
use crate::types::internal::Validate;
use crate::types::internal::validation::{require_max_length, require_non_empty, require_non_negative};

const NAME_MAX_LENGTH: usize = 255;

#[derive(Object, Debug, Clone)]
pub struct CreateProductRequest {
    #[oai(validator(min_length = 1, max_length = 255))]
    pub name: String,

    pub description: Option<String>,

    /// Price in the smallest currency unit
    #[oai(validator(minimum(value = "0")))]
    pub price: i64,

    #[oai(validator(minimum(value = "0")))]
    pub stock: i32,
}

impl Validate for CreateProductRequest {
    fn validate(&self) -> Result<(), InternalError> {
        require_non_empty("name", &self.name)?;
        require_max_length("name", &self.name, NAME_MAX_LENGTH)?;
        require_non_negative("price", self.price)?;
        require_non_negative("stock", i64::from(self.stock))
    }
}

/// Partial update; stock is changed through its own endpoint
#[derive(Object, Debug, Clone, Default)]
pub struct UpdateProductRequest {
    #[oai(validator(min_length = 1, max_length = 255))]
    pub name: Option<String>,

    pub description: Option<String>,

    #[oai(validator(minimum(value = "0")))]
    pub price: Option<i64>,
}

impl Validate for UpdateProductRequest {
    fn validate(&self) -> Result<(), InternalError> {
        if let Some(name) = &self.name {
            require_non_empty("name", name)?;
            require_max_length("name", name, NAME_MAX_LENGTH)?;
        }
        if let Some(price) = self.price {
            require_non_negative("price", price)?;
        }
        Ok(())
    }
}

#[derive(Object, Debug, Clone)]
pub struct UpdateStockRequest {
    #[oai(validator(minimum(value = "0")))]
    pub stock: i32,
}

impl Validate for UpdateStockRequest {
    fn validate(&self) -> Result<(), InternalError> {
        require_non_negative("stock", i64::from(self.stock))
    }
}

#[derive(Object, Debug, Clone)]
pub struct ProductResponse {
    pub id: String,
    pub shop_id: String,
    pub name: String,
    pub description: String,
    pub price: i64,
    pub stock: i32,
    pub created_at: String,
    pub updated_at: String,
}

impl From<product::Model> for ProductResponse {
    fn from(model: product::Model) -> Self {
        Self {
            id: model.id,
            shop_id: model.shop_id,
            name: model.name,
            description: model.description,
            price: model.price,
            stock: model.stock,
            created_at: format_timestamp(model.created_at),
            updated_at: format_timestamp(model.updated_at),
        }
    }
}
