use super::error::DirectoryError;
use crate::models::Ticket;

/// Admits only authenticated tickets carrying the admin role.
pub fn require_admin(ticket: &Ticket) -> Result<(), DirectoryError> {
    if !ticket.is_authorized() {
        tracing::warn!(
            user_id = %ticket.user_id,
            auth_status = %ticket.auth_status,
            "Rejected unauthenticated ticket"
        );
        let reason = if ticket.auth_status_reason.is_empty() {
            "Invalid authorization ticket.".to_string()
        } else {
            ticket.auth_status_reason.clone()
        };
        return Err(DirectoryError::Unauthenticated(reason));
    }

    if !ticket.is_admin() {
        tracing::warn!(
            user_id = %ticket.user_id,
            role = %ticket.role,
            "Rejected non-admin ticket for admin operation"
        );
        return Err(DirectoryError::Forbidden);
    }

    Ok(())
}
