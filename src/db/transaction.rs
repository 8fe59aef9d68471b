use log::*;

use async_trait::async_trait;
use futures::lock::MutexGuard;

use crate::error::*;
use crate::forms::NewReminder;
use crate::models::*;

use crate::db::client::RefClient;
use crate::db::service::DbService;
use crate::db::store::StorageTx;

/// Per-worker bookkeeping for the writer connection.
#[derive(Debug, Default)]
pub struct TxLane {
  /// A transaction was dropped while still open; roll it back before the
  /// next `BEGIN`.
  pub abandoned: bool,
}

/// Transaction on the worker's writer connection.
///
/// Holds the lane lock so only one transaction per worker uses the writer
/// connection at a time.
pub struct PgTransaction<'a> {
  db: &'a DbService,
  lane: MutexGuard<'a, TxLane>,
  cl: RefClient,
  open: bool,
}

impl<'a> PgTransaction<'a> {
  pub async fn begin(db: &'a DbService) -> Result<PgTransaction<'a>> {
    let mut lane = db.lane.lock().await;
    let cl = db.write_cl.get_client().await?;
    if lane.abandoned {
      warn!("Rolling back abandoned transaction.");
      cl.1.batch_execute("ROLLBACK").await?;
      lane.abandoned = false;
    }
    cl.1.batch_execute("BEGIN").await?;
    Ok(PgTransaction {
      db,
      lane,
      cl,
      open: true,
    })
  }

  fn check_open(&self) -> Result<()> {
    if self.open {
      Ok(())
    } else {
      Err(Error::StorageFailure("transaction already finished".to_string()))
    }
  }

  async fn finish(&mut self, sql: &str) -> Result<()> {
    self.check_open()?;
    self.open = false;
    if let Err(err) = self.cl.1.batch_execute(sql).await {
      // leave the connection clean for the next transaction.
      self.lane.abandoned = true;
      return Err(err.into());
    }
    Ok(())
  }
}

impl<'a> Drop for PgTransaction<'a> {
  fn drop(&mut self) {
    if self.open {
      warn!("Transaction dropped without commit or rollback.");
      self.lane.abandoned = true;
    }
  }
}

const TAG_SAVEPOINT: &str = "insert_tag";

#[async_trait(?Send)]
impl<'a> StorageTx for PgTransaction<'a> {
  async fn find_tag(&mut self, name: &str) -> Result<Option<Tag>> {
    self.check_open()?;
    self.db.tag.find_in(&self.cl, name).await
  }

  async fn insert_tag(&mut self, name: &str) -> Result<Tag> {
    self.check_open()?;
    // a failed statement aborts the whole transaction unless it is fenced
    // by a savepoint.
    self.cl.1.batch_execute(&format!("SAVEPOINT {}", TAG_SAVEPOINT)).await?;
    match self.db.tag.store_in(&self.cl, name).await {
      Ok(tag) => {
        self.cl.1.batch_execute(&format!("RELEASE SAVEPOINT {}", TAG_SAVEPOINT)).await?;
        Ok(tag)
      },
      Err(err) => {
        self.cl.1.batch_execute(&format!("ROLLBACK TO SAVEPOINT {}", TAG_SAVEPOINT)).await?;
        if err.is_unique_violation() {
          Err(Error::DuplicateTagRace(name.to_string()))
        } else {
          Err(err)
        }
      },
    }
  }

  async fn insert_reminder(&mut self, reminder: &NewReminder) -> Result<Reminder> {
    self.check_open()?;
    self.db.reminder.store_in(&self.cl, reminder).await
  }

  async fn attach_tag(&mut self, reminder_id: i32, tag_id: i32) -> Result<()> {
    self.check_open()?;
    self.db.reminder.add_tag_in(&self.cl, reminder_id, tag_id).await
  }

  async fn commit(&mut self) -> Result<()> {
    self.finish("COMMIT").await
  }

  async fn rollback(&mut self) -> Result<()> {
    self.finish("ROLLBACK").await
  }
}
