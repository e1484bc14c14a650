use poem_openapi::Object;

use crate::errors::InternalError;
use crate::types::db::shop;
use crate::types::dto::common::format_timestamp;
use crate::types::internal::Validate;
use crate::types::internal::validation::{require_max_length, require_non_empty};

const NAME_MAX_LENGTH: usize = 255;

#[derive(Object, Debug, Clone)]
pub struct CreateShopRequest {
    #[oai(validator(min_length = 1, max_length = 255))]
    pub name: String,

    pub description: Option<String>,
}

impl Validate for CreateShopRequest {
    fn validate(&self) -> Result<(), InternalError> {
        require_non_empty("name", &self.name)?;
        require_max_length("name", &self.name, NAME_MAX_LENGTH)
    }
}

/// Partial update; omitted fields keep their value
#[derive(Object, Debug, Clone, Default)]
pub struct UpdateShopRequest {
    #[oai(validator(min_length = 1, max_length = 255))]
    pub name: Option<String>,

    pub description: Option<String>,
}

impl Validate for UpdateShopRequest {
    fn validate(&self) -> Result<(), InternalError> {
        if let Some(name) = &self.name {
            require_non_empty("name", name)?;
            require_max_length("name", name, NAME_MAX_LENGTH)?;
        }
        Ok(())
    }
}

#[derive(Object, Debug, Clone)]
pub struct ShopResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub owner_id: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<shop::Model> for ShopResponse {
    fn from(model: shop::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            owner_id: model.owner_id,
            created_at: format_timestamp(model.created_at),
            updated_at: format_timestamp(model.updated_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_length_bounds() {
        let at_limit = CreateShopRequest {
            name: "R".repeat(255),
            description: None,
        };
        assert!(at_limit.validate().is_ok());

        let too_long = UpdateShopRequest {
            name: Some("R".repeat(256)),
            ..Default::default()
        };
        assert_eq!(
            too_long.validate().unwrap_err().to_string(),
            "name must be at most 255 characters"
        );
    }
}
