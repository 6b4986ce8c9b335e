//! Typed cache façade

mod builder;
mod cache;

pub use builder::VaultCacheBuilder;
pub use cache::VaultCache;
