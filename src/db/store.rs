use async_trait::async_trait;

use crate::error::*;
use crate::forms::NewReminder;
use crate::models::*;

pub type BoxStore = Box<dyn ReminderStore>;

/// Storage backend for reminders and tags.
///
/// Futures are `?Send`: every actix worker owns its own store handle.
#[async_trait(?Send)]
pub trait ReminderStore {
  /// Start a transaction.  Readers never observe its writes before `commit`.
  async fn begin<'a>(&'a self) -> Result<Box<dyn StorageTx + 'a>>;

  /// All reminders ordered by date (then id), tags ordered by name.
  async fn list_reminders(&self) -> Result<Vec<Reminder>>;

  /// All tags ordered by name.
  async fn list_tags(&self) -> Result<Vec<Tag>>;

  /// Warm up connections/statements.
  async fn prepare(&self) -> Result<()> {
    Ok(())
  }
}

#[async_trait(?Send)]
pub trait StorageTx {
  async fn find_tag(&mut self, name: &str) -> Result<Option<Tag>>;

  /// Insert a new tag.  A name that already exists (possibly committed by a
  /// concurrent transaction) fails with `Error::DuplicateTagRace`.
  async fn insert_tag(&mut self, name: &str) -> Result<Tag>;

  /// Insert the reminder row; the returned reminder has no tags yet.
  async fn insert_reminder(&mut self, reminder: &NewReminder) -> Result<Reminder>;

  async fn attach_tag(&mut self, reminder_id: i32, tag_id: i32) -> Result<()>;

  async fn commit(&mut self) -> Result<()>;

  async fn rollback(&mut self) -> Result<()>;
}
