//! API error responses.
//!
//! Every failure is rendered as `{ "success": false, "message": ..., "error"?: ... }`.
//! The `error` field carries internal detail. Whether it reaches the client is
//! decided per request by [`detail_policy`] from the server's [`State`].

use std::{fmt::Display, sync::Arc};

use salvo::{
    Depot, FlowCtrl, Request, Response, Scribe, handler,
    http::StatusCode,
    oapi::{self, Components, EndpointOutRegister, Operation, ToSchema},
    writing::Json,
};
use serde::{Deserialize, Serialize};

use crate::state::State;

tokio::task_local! {
    static EXPOSE_DETAILS: bool;
}

/// Scope the rest of the request to the detail setting held in [`State`].
/// Must run after state injection; without it details are shown.
#[handler]
pub(crate) async fn detail_policy(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    let expose = match depot.obtain::<Arc<State>>() {
        Ok(state) => state.expose_error_details,
        Err(_) => true,
    };

    EXPOSE_DETAILS
        .scope(expose, ctrl.call_next(req, depot, res))
        .await;
}

/// Error Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ErrorResponse {
    /// Always `false`
    pub success: bool,

    /// Human readable reason
    pub message: String,

    /// Internal detail, omitted in production
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// An HTTP status and message, rendered in the error envelope.
#[derive(Debug)]
pub(crate) struct ApiError {
    status: StatusCode,
    message: String,
    detail: Option<String>,
}

impl ApiError {
    pub(crate) fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            detail: None,
        }
    }

    pub(crate) fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub(crate) fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub(crate) fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub(crate) fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub(crate) fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub(crate) fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub(crate) fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, message)
    }

    #[must_use]
    pub(crate) fn with_detail(mut self, detail: impl Display) -> Self {
        self.detail = Some(detail.to_string());
        self
    }

    #[cfg(test)]
    pub(crate) fn status(&self) -> StatusCode {
        self.status
    }

    #[cfg(test)]
    pub(crate) fn message(&self) -> &str {
        &self.message
    }

    fn into_response(self, expose_detail: bool) -> ErrorResponse {
        let error = self.detail.filter(|_| expose_detail);

        ErrorResponse {
            success: false,
            message: self.message,
            error,
        }
    }
}

impl Scribe for ApiError {
    fn render(self, res: &mut Response) {
        res.status_code(self.status);
        let expose = EXPOSE_DETAILS.try_with(|expose| *expose).unwrap_or(true);

        res.render(Json(self.into_response(expose)));
    }
}

impl EndpointOutRegister for ApiError {
    fn register(components: &mut Components, operation: &mut Operation) {
        let schema = ErrorResponse::to_schema(components);

        for status in [
            StatusCode::BAD_REQUEST,
            StatusCode::UNAUTHORIZED,
            StatusCode::FORBIDDEN,
            StatusCode::NOT_FOUND,
            StatusCode::CONFLICT,
            StatusCode::INTERNAL_SERVER_ERROR,
            StatusCode::BAD_GATEWAY,
        ] {
            operation.responses.insert(
                status.as_str(),
                oapi::Response::new(status.canonical_reason().unwrap_or("Error"))
                    .add_content("application/json", oapi::Content::new(schema.clone())),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use salvo::{
        Router,
        test::{ResponseExt, TestClient},
    };
    use testresult::TestResult;

    use crate::test_helpers::Mocks;

    use super::*;

    #[handler]
    async fn failing() -> Result<&'static str, ApiError> {
        Err(ApiError::internal("Server error").with_detail("pool timed out"))
    }

    async fn render_failure(redact_error_details: bool) -> TestResult<ErrorResponse> {
        let service = Mocks {
            redact_error_details,
            ..Mocks::default()
        }
        .public_service(Router::new().get(failing));

        let body = TestClient::get("http://example.com")
            .send(&service)
            .await
            .take_json()
            .await?;

        Ok(body)
    }

    #[tokio::test]
    async fn state_controls_detail_in_rendered_errors() -> TestResult {
        let shown = render_failure(false).await?;
        let hidden = render_failure(true).await?;

        assert_eq!(shown.error.as_deref(), Some("pool timed out"));
        assert_eq!(hidden.message, "Server error");
        assert_eq!(hidden.error, None);

        Ok(())
    }

    #[test]
    fn detail_is_included_outside_production() {
        let body = ApiError::internal("Server error")
            .with_detail("pool timed out")
            .into_response(true);

        assert!(!body.success);
        assert_eq!(body.message, "Server error");
        assert_eq!(body.error.as_deref(), Some("pool timed out"));
    }

    #[test]
    fn detail_is_hidden_in_production() {
        let body = ApiError::internal("Server error")
            .with_detail("pool timed out")
            .into_response(false);

        assert_eq!(body.message, "Server error");
        assert_eq!(body.error, None);
    }

    #[test]
    fn errors_without_detail_omit_the_field() -> Result<(), serde_json::Error> {
        let body = ApiError::not_found("Order not found").into_response(true);

        let json = serde_json::to_value(&body)?;

        assert_eq!(
            json,
            serde_json::json!({ "success": false, "message": "Order not found" })
        );

        Ok(())
    }
}
