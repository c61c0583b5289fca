pub mod handlers;
pub mod quota;
