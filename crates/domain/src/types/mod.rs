//! Normalized domain types for the marketplace connector

pub mod event;
pub mod merchant;
pub mod order;
pub mod token;
