pub mod compare;
pub mod handlers;
