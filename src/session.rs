//! Keys an upstream authentication layer writes into the session.

pub const USER_ID: &str = "user_id";
pub const USER_NAME: &str = "user_name";
pub const USER_EMAIL: &str = "user_email";
