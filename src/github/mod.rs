pub mod event;
pub mod models;
