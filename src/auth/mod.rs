pub mod password;
pub mod token;

pub use token::{issue_token, verify_token, Claims, TokenError};
