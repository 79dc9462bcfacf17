//! Verify Payment Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};

use crate::{
    errors::ApiError,
    extensions::*,
    observability::record_payment_reconciled,
    orders::OrderEnvelope,
    payments::errors::into_api_error,
    state::State,
};

/// Verify Payment Handler
///
/// Reconciles a completed checkout session into exactly one paid order.
/// Verifying the same session again returns the same order.
#[endpoint(
    tags("payments"),
    summary = "Verify Payment",
    security(("bearer_auth" = [])),
)]
#[tracing::instrument(
    name = "payments.verify",
    skip(session_id, depot),
    fields(session_id = tracing::field::Empty, outcome = tracing::field::Empty),
    err(Debug)
)]
pub(crate) async fn handler(
    session_id: PathParam<String>,
    depot: &mut Depot,
) -> Result<Json<OrderEnvelope>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.current_user_or_401()?;
    let session_id = session_id.into_inner();

    let span = tracing::Span::current();

    span.record("session_id", session_id.as_str());

    let reconciliation = state
        .app
        .payments
        .verify_session(user.actor(), session_id)
        .await
        .map_err(into_api_error)?;

    let outcome = reconciliation.outcome.metric_label();

    span.record("outcome", outcome);
    record_payment_reconciled(outcome);

    tracing::info!(
        order_uuid = %reconciliation.order.uuid,
        outcome,
        "verified checkout session"
    );

    Ok(Json(reconciliation.order.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use storefront_app::domain::{
        orders::records::OrderUuid,
        payments::{
            MockPaymentsService, PaymentsServiceError,
            data::{Reconciliation, ReconciliationOutcome},
        },
    };

    use crate::{
        errors::ErrorResponse,
        orders::tests::make_order,
        test_helpers::{Mocks, customer_user},
    };

    use super::*;

    fn make_service(payments: MockPaymentsService) -> Service {
        Mocks {
            payments,
            ..Mocks::default()
        }
        .service_as(
            &customer_user(),
            Router::with_path("payment/verify/{session_id}").get(handler),
        )
    }

    #[tokio::test]
    async fn test_verify_paid_session_returns_order() -> TestResult {
        let mut payments = MockPaymentsService::new();

        payments
            .expect_verify_session()
            .once()
            .withf(|_, session| session == "cs_test_123")
            .return_once(|actor, session| {
                let mut order = make_order(OrderUuid::new(), actor.uuid);

                order.is_paid = true;
                order.payment_method = "stripe".to_string();
                order.payment.reference = Some(session);

                Ok(Reconciliation {
                    order,
                    outcome: ReconciliationOutcome::Created,
                })
            });

        let response: OrderEnvelope = TestClient::get("http://example.com/payment/verify/cs_test_123")
            .send(&make_service(payments))
            .await
            .take_json()
            .await?;

        assert!(response.success);
        assert!(response.order.is_paid);
        assert_eq!(
            response.order.payment_result.map(|payment| payment.id).as_deref(),
            Some("cs_test_123")
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_verify_unpaid_session_returns_400() -> TestResult {
        let mut payments = MockPaymentsService::new();

        payments.expect_verify_session().once().return_once(|_, _| {
            Err(PaymentsServiceError::PaymentIncomplete {
                status: "unpaid".to_string(),
            })
        });

        let mut res = TestClient::get("http://example.com/payment/verify/cs_test_123")
            .send(&make_service(payments))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        let error: ErrorResponse = res.take_json().await?;

        assert_eq!(error.message, "Payment incomplete: unpaid");

        Ok(())
    }

    #[tokio::test]
    async fn test_verify_unpaid_session_names_status_in_production() -> TestResult {
        let mut payments = MockPaymentsService::new();

        payments.expect_verify_session().once().return_once(|_, _| {
            Err(PaymentsServiceError::PaymentIncomplete {
                status: "unpaid".to_string(),
            })
        });

        let service = Mocks {
            payments,
            redact_error_details: true,
            ..Mocks::default()
        }
        .service_as(
            &customer_user(),
            Router::with_path("payment/verify/{session_id}").get(handler),
        );

        let mut res = TestClient::get("http://example.com/payment/verify/cs_test_123")
            .send(&service)
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        let error: ErrorResponse = res.take_json().await?;

        assert_eq!(error.message, "Payment incomplete: unpaid");
        assert_eq!(error.error, None);

        Ok(())
    }

    #[tokio::test]
    async fn test_verify_underpaid_session_returns_409() -> TestResult {
        let mut payments = MockPaymentsService::new();

        payments.expect_verify_session().once().return_once(|_, _| {
            Err(PaymentsServiceError::AmountMismatch {
                expected: 566_400,
                charged: Some(87_400),
            })
        });

        let res = TestClient::get("http://example.com/payment/verify/cs_test_123")
            .send(&make_service(payments))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::CONFLICT));

        Ok(())
    }

    #[tokio::test]
    async fn test_verify_unknown_session_returns_404() -> TestResult {
        let mut payments = MockPaymentsService::new();

        payments
            .expect_verify_session()
            .once()
            .return_once(|_, _| Err(PaymentsServiceError::SessionNotFound));

        let res = TestClient::get("http://example.com/payment/verify/cs_missing")
            .send(&make_service(payments))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::NOT_FOUND));

        Ok(())
    }

    #[tokio::test]
    async fn test_verify_someone_elses_session_returns_403() -> TestResult {
        let mut payments = MockPaymentsService::new();

        payments
            .expect_verify_session()
            .once()
            .return_once(|_, _| Err(PaymentsServiceError::Forbidden));

        let res = TestClient::get("http://example.com/payment/verify/cs_test_999")
            .send(&make_service(payments))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::FORBIDDEN));

        Ok(())
    }
}
