//! Small shared helpers.

pub mod http_client;
pub mod url;
