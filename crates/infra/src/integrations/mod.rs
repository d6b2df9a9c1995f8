//! Marketplace integrations

pub mod ifood;
