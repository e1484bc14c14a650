use std::sync::Arc;

use poem::Request;
use poem_openapi::param::Path;
use poem_openapi::payload::Json;
use poem_openapi::{OpenApi, Tags};

use crate::api::BearerAuth;
use crate::api::helpers::{CreatedResult, DataResult, authenticated_context, created, ok};
use crate::app_data::AppData;
use crate::coordinators::PaymentCoordinator;
use crate::providers::TokenProvider;
use crate::types::dto::payment::{CreatePaymentRequest, PaymentResponse, UpdatePaymentStatusRequest};

pub struct PaymentApi {
    payment_coordinator: PaymentCoordinator,
    token_provider: Arc<TokenProvider>,
}

impl PaymentApi {
    pub fn new(app_data: Arc<AppData>) -> Self {
        Self {
            token_provider: app_data.token_provider.clone(),
            payment_coordinator: PaymentCoordinator::new(app_data),
        }
    }
}

#[derive(Tags)]
enum PaymentTags {
    /// Order payments
    Payments,
}

#[OpenApi]
impl PaymentApi {
    /// Start paying for a pending order; the amount must equal the order total
    #[oai(path = "/orders/:order_id/payments", method = "post", tag = "PaymentTags::Payments")]
    async fn create(
        &self,
        req: &Request,
        auth: BearerAuth,
        order_id: Path<String>,
        body: Json<CreatePaymentRequest>,
    ) -> CreatedResult<PaymentResponse> {
        let ctx = authenticated_context(req, &auth, &self.token_provider)?;
        Ok(created(self.payment_coordinator.create(&ctx, &order_id.0, body.0).await?))
    }

    #[oai(path = "/orders/:order_id/payments", method = "get", tag = "PaymentTags::Payments")]
    async fn list(&self, req: &Request, auth: BearerAuth, order_id: Path<String>) -> DataResult<Vec<PaymentResponse>> {
        let ctx = authenticated_context(req, &auth, &self.token_provider)?;
        Ok(ok(self.payment_coordinator.list(&ctx, &order_id.0).await?))
    }

    #[oai(path = "/orders/:order_id/payments/:payment_id", method = "get", tag = "PaymentTags::Payments")]
    async fn get(
        &self,
        req: &Request,
        auth: BearerAuth,
        order_id: Path<String>,
        payment_id: Path<String>,
    ) -> DataResult<PaymentResponse> {
        let ctx = authenticated_context(req, &auth, &self.token_provider)?;
        Ok(ok(self.payment_coordinator.get(&ctx, &order_id.0, &payment_id.0).await?))
    }

    /// Settle a payment; `completed` also marks the order paid
    #[oai(path = "/orders/:order_id/payments/:payment_id/status", method = "patch", tag = "PaymentTags::Payments")]
    async fn update_status(
        &self,
        req: &Request,
        auth: BearerAuth,
        order_id: Path<String>,
        payment_id: Path<String>,
        body: Json<UpdatePaymentStatusRequest>,
    ) -> DataResult<PaymentResponse> {
        let ctx = authenticated_context(req, &auth, &self.token_provider)?;
        Ok(ok(self
            .payment_coordinator
            .update_status(&ctx, &order_id.0, &payment_id.0, body.0)
            .await?))
    }
}
