pub mod audit_event;
pub mod group;
pub mod ticket;

pub use audit_event::{AuditEvent, AuditResult};
pub use group::{
    Ack, Attribute, Group, GroupSummary, Member, MembershipSet, UserRecord, UserStatus,
    DISPLAY_NAME_ATTRIBUTE, EMAIL_ATTRIBUTE, GROUPS_ATTRIBUTE, ROLE_ATTRIBUTE,
};
pub use ticket::{AuthStatus, Ticket, ADMIN_ROLE};
