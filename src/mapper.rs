//! Persistence mapper: validated creation requests -> storage.

use log::*;

use serde_json::Value as JsonValue;

use crate::codec::Envelope;
use crate::db::{ReminderStore, StorageTx};
use crate::error::*;
use crate::forms::{CreateReminder, NewReminder};
use crate::models::*;

pub const DEFAULT_MAX_TAG_RETRIES: u32 = 3;

#[derive(Debug, Clone)]
pub struct ReminderMapper {
  /// Lookups retried after losing a tag insert race.
  pub max_tag_retries: u32,
}

impl Default for ReminderMapper {
  fn default() -> Self {
    Self {
      max_tag_retries: DEFAULT_MAX_TAG_RETRIES,
    }
  }
}

impl ReminderMapper {
  pub fn new(max_tag_retries: u32) -> Self {
    Self { max_tag_retries }
  }

  pub fn validate(&self, raw: &JsonValue) -> Result<CreateReminder> {
    CreateReminder::validate(raw)
  }

  /// Connect-or-create by name.
  pub async fn find_or_create_tag(&self, tx: &mut dyn StorageTx, name: &str) -> Result<Tag> {
    for attempt in 0..=self.max_tag_retries {
      if let Some(tag) = tx.find_tag(name).await? {
        return Ok(tag);
      }
      match tx.insert_tag(name).await {
        Err(Error::DuplicateTagRace(_)) => {
          debug!("Tag '{}' created concurrently, lookup again (attempt {})", name, attempt + 1);
        },
        res => return res,
      }
    }
    Err(Error::StorageFailure(format!("could not find or create tag '{}'", name)))
  }

  /// Insert the reminder and connect its tags in one transaction.
  pub async fn persist(&self, store: &dyn ReminderStore, req: &CreateReminder) -> Result<Reminder> {
    let new_reminder = req.to_new_reminder()?;
    debug!("creating new reminder");
    let mut tx = store.begin().await?;
    let res = self.create_in(&mut *tx, &new_reminder, &req.tags).await;
    match res {
      Ok(reminder) => {
        tx.commit().await?;
        info!("Created new reminder (id={})", reminder.id);
        Ok(reminder)
      },
      Err(err) => {
        warn!("Create reminder failed, rolling back: {}", err);
        if let Err(rollback_err) = tx.rollback().await {
          error!("Rollback failed: {:?}", rollback_err);
        }
        Err(err)
      },
    }
  }

  async fn create_in(
    &self,
    tx: &mut dyn StorageTx,
    new_reminder: &NewReminder,
    tags: &[String],
  ) -> Result<Reminder> {
    let mut reminder = tx.insert_reminder(new_reminder).await?;
    // name order: two transactions creating the same new tags lock them in
    // the same order and cannot deadlock.
    let mut names: Vec<&String> = tags.iter().collect();
    names.sort();
    names.dedup();
    for name in names {
      let tag = self.find_or_create_tag(tx, name).await?;
      if reminder.tags.iter().any(|t| t.id == tag.id) {
        continue;
      }
      tx.attach_tag(reminder.id, tag.id).await?;
      reminder.tags.push(tag);
    }
    reminder.tags.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(reminder)
  }

  /// decode -> validate -> persist.
  pub async fn create_from_envelope(&self, store: &dyn ReminderStore, envelope: &Envelope) -> Result<Reminder> {
    let raw = envelope.decode()?;
    let req = self.validate(&raw)?;
    self.persist(store, &req).await
  }
}
