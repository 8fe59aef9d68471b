use log::*;

use std::rc::Rc;

use async_trait::async_trait;
use futures::lock::Mutex;

use crate::error::*;
use crate::models::*;

use super::{
  client::SharedClient,
  store::*,
  transaction::{PgTransaction, TxLane},
  ReminderService,
  TagService,
};

/// Postgres store for one actix worker.
///
/// Reads go over `read_cl`; transactions run one at a time on `write_cl`, so
/// readers never share a session with uncommitted writes.
#[derive(Clone)]
pub struct DbService {
  pub read_cl: SharedClient,
  pub write_cl: SharedClient,
  pub(crate) lane: Rc<Mutex<TxLane>>,
  pub reminder: ReminderService,
  pub tag: TagService,
}

impl DbService {
  pub fn new(db_url: &str) -> DbService {
    let read_cl = SharedClient::new("reader", db_url);
    let write_cl = SharedClient::new("writer", db_url);

    DbService {
      reminder: ReminderService::new(read_cl.clone(), write_cl.clone()),
      tag: TagService::new(read_cl.clone(), write_cl.clone()),
      lane: Rc::new(Mutex::new(TxLane::default())),
      read_cl,
      write_cl,
    }
  }
}

#[async_trait(?Send)]
impl ReminderStore for DbService {
  async fn begin<'a>(&'a self) -> Result<Box<dyn StorageTx + 'a>> {
    Ok(Box::new(PgTransaction::begin(self).await?))
  }

  async fn list_reminders(&self) -> Result<Vec<Reminder>> {
    self.reminder.get_reminders().await
  }

  async fn list_tags(&self) -> Result<Vec<Tag>> {
    self.tag.get_tags().await
  }

  async fn prepare(&self) -> Result<()> {
    info!("DBService: Prepare ReminderService.");
    self.reminder.prepare().await?;
    info!("DBService: Prepare TagService.");
    self.tag.prepare().await?;

    info!("DBService: finished.");
    Ok(())
  }
}
