use log::*;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use futures::lock::{Mutex, MutexGuard};

use crate::error::*;
use crate::forms::NewReminder;
use crate::models::*;
use crate::util::now;

use super::store::*;

#[derive(Debug, Clone)]
struct ReminderRow {
  id: i32,
  title: String,
  img_url: Option<String>,
  date: NaiveDateTime,
  created_at: NaiveDateTime,
}

#[derive(Debug, Default, Clone)]
struct Tables {
  reminders: Vec<ReminderRow>,
  tags: Vec<Tag>,
  // (reminder_id, tag_id)
  reminder_tags: Vec<(i32, i32)>,
  last_reminder_id: i32,
  last_tag_id: i32,
}

impl Tables {
  fn tag_by_name(&self, name: &str) -> Option<&Tag> {
    self.tags.iter().find(|tag| tag.name == name)
  }

  fn reminder_tags(&self, reminder_id: i32) -> Vec<Tag> {
    let mut tags: Vec<Tag> = self.reminder_tags.iter()
      .filter(|(r_id, _)| *r_id == reminder_id)
      .filter_map(|(_, t_id)| self.tags.iter().find(|tag| tag.id == *t_id))
      .cloned()
      .collect();
    tags.sort_by(|a, b| a.name.cmp(&b.name));
    tags
  }
}

/// In-process store (`db.url = "memory:"`).
///
/// Transactions are serialized: each one holds the table lock until it is
/// committed or rolled back, and works on a private copy of the tables.
#[derive(Clone)]
pub struct MemoryStore {
  tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self {
      tables: Arc::new(Mutex::new(Tables::default())),
    }
  }
}

impl Default for MemoryStore {
  fn default() -> Self {
    Self::new()
  }
}

#[async_trait(?Send)]
impl ReminderStore for MemoryStore {
  async fn begin<'a>(&'a self) -> Result<Box<dyn StorageTx + 'a>> {
    let guard = self.tables.lock().await;
    let work = guard.clone();
    Ok(Box::new(MemoryTransaction {
      guard,
      work,
      open: true,
    }))
  }

  async fn list_reminders(&self) -> Result<Vec<Reminder>> {
    let tables = self.tables.lock().await;
    let mut reminders: Vec<Reminder> = tables.reminders.iter().map(|row| {
      Reminder {
        id: row.id,
        title: row.title.clone(),
        img_url: row.img_url.clone(),
        date: row.date,
        created_at: row.created_at,
        tags: tables.reminder_tags(row.id),
      }
    }).collect();
    reminders.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));
    Ok(reminders)
  }

  async fn list_tags(&self) -> Result<Vec<Tag>> {
    let tables = self.tables.lock().await;
    let mut tags = tables.tags.clone();
    tags.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(tags)
  }
}

pub struct MemoryTransaction<'a> {
  guard: MutexGuard<'a, Tables>,
  work: Tables,
  open: bool,
}

impl<'a> MemoryTransaction<'a> {
  fn check_open(&self) -> Result<()> {
    if self.open {
      Ok(())
    } else {
      Err(Error::StorageFailure("transaction already finished".to_string()))
    }
  }
}

#[async_trait(?Send)]
impl<'a> StorageTx for MemoryTransaction<'a> {
  async fn find_tag(&mut self, name: &str) -> Result<Option<Tag>> {
    self.check_open()?;
    Ok(self.work.tag_by_name(name).cloned())
  }

  async fn insert_tag(&mut self, name: &str) -> Result<Tag> {
    self.check_open()?;
    if self.work.tag_by_name(name).is_some() {
      return Err(Error::DuplicateTagRace(name.to_string()));
    }
    self.work.last_tag_id += 1;
    let tag = Tag {
      id: self.work.last_tag_id,
      name: name.to_string(),
    };
    self.work.tags.push(tag.clone());
    Ok(tag)
  }

  async fn insert_reminder(&mut self, reminder: &NewReminder) -> Result<Reminder> {
    self.check_open()?;
    self.work.last_reminder_id += 1;
    let row = ReminderRow {
      id: self.work.last_reminder_id,
      title: reminder.title.clone(),
      img_url: reminder.img_url.clone(),
      date: reminder.date,
      created_at: now(),
    };
    self.work.reminders.push(row.clone());
    Ok(Reminder {
      id: row.id,
      title: row.title,
      img_url: row.img_url,
      date: row.date,
      created_at: row.created_at,
      tags: Vec::new(),
    })
  }

  async fn attach_tag(&mut self, reminder_id: i32, tag_id: i32) -> Result<()> {
    self.check_open()?;
    if !self.work.reminders.iter().any(|row| row.id == reminder_id) {
      return Err(Error::StorageFailure(format!("no reminder with id {}", reminder_id)));
    }
    if !self.work.tags.iter().any(|tag| tag.id == tag_id) {
      return Err(Error::StorageFailure(format!("no tag with id {}", tag_id)));
    }
    let link = (reminder_id, tag_id);
    if !self.work.reminder_tags.contains(&link) {
      self.work.reminder_tags.push(link);
    }
    Ok(())
  }

  async fn commit(&mut self) -> Result<()> {
    self.check_open()?;
    self.open = false;
    *self.guard = std::mem::take(&mut self.work);
    debug!("memory store: committed");
    Ok(())
  }

  async fn rollback(&mut self) -> Result<()> {
    self.check_open()?;
    self.open = false;
    self.work = Tables::default();
    debug!("memory store: rolled back");
    Ok(())
  }
}
