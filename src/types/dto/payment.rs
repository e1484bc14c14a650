use poem_openapi::Object;

use crate::errors::InternalError;
use crate::types::db::payment;
use crate::types::dto::common::format_timestamp;
use crate::types::internal::validation::{require_max_length, require_non_empty, require_non_negative};
use crate::types::internal::{PaymentStatus, Validate};

#[derive(Object, Debug, Clone)]
pub struct CreatePaymentRequest {
    /// Must equal the order's total price
    #[oai(validator(minimum(value = "0")))]
    pub amount: i64,

    #[oai(validator(min_length = 1, max_length = 64))]
    pub payment_method: String,
}

impl Validate for CreatePaymentRequest {
    fn validate(&self) -> Result<(), InternalError> {
        require_non_negative("amount", self.amount)?;
        require_non_empty("payment_method", &self.payment_method)?;
        require_max_length("payment_method", &self.payment_method, 64)
    }
}

#[derive(Object, Debug, Clone)]
pub struct UpdatePaymentStatusRequest {
    pub status: PaymentStatus,
}

#[derive(Object, Debug, Clone)]
pub struct PaymentResponse {
    pub id: String,
    pub order_id: String,
    pub amount: i64,
    pub payment_method: String,
    pub status: PaymentStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl From<payment::Model> for PaymentResponse {
    fn from(model: payment::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            amount: model.amount,
            payment_method: model.payment_method,
            status: model.status,
            created_at: format_timestamp(model.created_at),
            updated_at: format_timestamp(model.updated_at),
        }
    }
}
