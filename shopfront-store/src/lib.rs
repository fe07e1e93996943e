pub mod app_config;
pub mod memory_repo;
pub mod vault;

pub use app_config::Config;
pub use memory_repo::{InMemoryOrderStore, StoreError};
pub use vault::InMemoryCardVault;
