use axum::{extract::FromRequestParts, http::request::Parts};
use service_core::middleware::tracing::REQUEST_ID_HEADER;
use std::convert::Infallible;

use crate::models::{AuthStatus, Ticket};

/// Headers written by the upstream authorizer.
pub const AUTH_STATUS_HEADER: &str = "x-auth-status";
pub const AUTH_STATUS_REASON_HEADER: &str = "x-auth-status-reason";
pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts.headers.get(name).and_then(|value| value.to_str().ok())
}

/// Builds the ticket from authorizer headers. A request without them gets an
/// `invalid` ticket, which the authorization gate rejects. The request id,
/// when present, is attached for audit correlation.
#[axum::async_trait]
impl<S> FromRequestParts<S> for Ticket
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ticket = match header(parts, AUTH_STATUS_HEADER) {
            Some(status) => Ticket::new(
                AuthStatus::from(status),
                header(parts, AUTH_STATUS_REASON_HEADER).unwrap_or_default(),
                header(parts, USER_ID_HEADER).unwrap_or_default(),
                header(parts, USER_ROLE_HEADER).unwrap_or_default(),
            ),
            None => Ticket::new(
                AuthStatus::Invalid,
                "Missing authorization ticket.",
                header(parts, USER_ID_HEADER).unwrap_or_default(),
                "",
            ),
        };

        Ok(match header(parts, REQUEST_ID_HEADER) {
            Some(request_id) => ticket.with_request_id(request_id),
            None => ticket,
        })
    }
}
