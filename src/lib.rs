pub mod auth;
pub mod config;
pub mod engine;
pub mod grid;
pub mod i18n;
pub mod limits;
pub mod model;
pub mod notify;
pub mod observability;
pub mod request;
