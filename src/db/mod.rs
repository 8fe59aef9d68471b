use log::*;

use crate::error::*;

pub mod util;
pub mod client;

mod reminder;
mod tag;
pub use self::{
  reminder::*,
  tag::*,
};

pub mod store;
pub use store::{BoxStore, ReminderStore, StorageTx};

mod transaction;
mod service;
pub use service::*;

pub mod memory;
pub use memory::MemoryStore;

const MEMORY_URL_PREFIX: &str = "memory:";

/// Which backend `db.url` selects.
#[derive(Clone)]
pub enum StorageConfig {
  Postgres(String),
  /// Shared by every worker.
  Memory(MemoryStore),
}

impl StorageConfig {
  pub fn from_url(url: &str) -> StorageConfig {
    if url.starts_with(MEMORY_URL_PREFIX) {
      StorageConfig::Memory(MemoryStore::new())
    } else {
      StorageConfig::Postgres(url.to_string())
    }
  }

  /// Store handle for the current worker.  Must run inside an actix system.
  pub fn connect(&self) -> BoxStore {
    match self {
      StorageConfig::Postgres(url) => {
        debug!("Connecting postgres store.");
        Box::new(DbService::new(url))
      },
      StorageConfig::Memory(store) => Box::new(store.clone()),
    }
  }
}

/// Open a store and prepare every statement; fails fast on a bad database.
pub async fn test_db(url: String) -> Result<()> {
  let storage = StorageConfig::from_url(&url);
  storage.connect().prepare().await
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_db_on_its_own_system() {
    let mut sys = actix_rt::System::new("test_db");
    sys.block_on(test_db("memory:".to_string())).unwrap();
  }

  #[test]
  fn url_selects_backend() {
    match StorageConfig::from_url("memory:") {
      StorageConfig::Memory(_) => (),
      StorageConfig::Postgres(url) => panic!("unexpected postgres: {}", url),
    }
    match StorageConfig::from_url("postgres://localhost/souviens") {
      StorageConfig::Postgres(url) => assert_eq!(url, "postgres://localhost/souviens"),
      StorageConfig::Memory(_) => panic!("unexpected memory store"),
    }
  }
}
