pub mod auth;
pub mod authorization;
pub mod catalog;
pub mod lifecycle;
pub mod listing;
pub mod pagination;
