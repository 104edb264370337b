pub mod groups;
pub mod health;
pub mod users;

pub use groups::{
    add_user_to_group, create_group, delete_group, get_group, list_groups,
    remove_user_from_group, update_group,
};
pub use health::{health_check, metrics};
pub use users::{get_user_groups, update_membership};
