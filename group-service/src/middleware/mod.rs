pub mod ticket;

pub use ticket::{
    AUTH_STATUS_HEADER, AUTH_STATUS_REASON_HEADER, USER_ID_HEADER, USER_ROLE_HEADER,
};
