//! Per-guild settings and data, and their lifecycle from join to leave

mod data;
mod registry;
mod settings;
mod state;
pub mod store;

pub use registry::GuildRegistry;
