//! # Strings Module
//!
//! Centralizes user-facing strings and format helpers.
//! Ensures consistency in messaging and easier localization/updates.

pub mod labels;
pub mod messages;
