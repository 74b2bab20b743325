//! HTTP request handlers.

pub mod feed;
pub mod health;
pub mod notifications;
pub mod videos;
