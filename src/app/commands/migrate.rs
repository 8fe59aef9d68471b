use log::*;

use actix_rt::System;

use crate::{
  error::*,
  app::*,
  db::{client::SharedClient, StorageConfig},
};

/// Tables, unique tag names and the listing index.
pub const SCHEMA: &str = include_str!("../../../conf/schema.sql");

/// Run `SCHEMA` against `url`.  Must run inside an actix system.
pub async fn apply_schema(url: String) -> Result<()> {
  let shared = SharedClient::new("migrate", &url);
  let cl = shared.get_client().await?;
  cl.1.batch_execute(SCHEMA).await?;
  Ok(())
}

pub fn execute(config: AppConfig) -> Result<()> {
  let db_url = config.require_str("db.url")?;
  match StorageConfig::from_url(&db_url) {
    StorageConfig::Memory(_) => {
      info!("Migrate: in-memory store needs no schema.");
      Ok(())
    },
    StorageConfig::Postgres(url) => {
      let mut sys = System::new("system.migrate");
      info!("Migrate: applying schema.");
      sys.block_on(apply_schema(url))?;
      info!("Migrate: finished.");
      Ok(())
    },
  }
}
