//! # Infrastructure Layer
//!
//! Handles interactions with external systems and services.
//! Implements the traits defined in the Domain layer (OutboundChat, Catalog,
//! UpdateSource, ErrorSink).

pub mod catalog;
pub mod error_log;
pub mod vk;
