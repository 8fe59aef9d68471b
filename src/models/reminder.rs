use chrono::NaiveDateTime;

use serde::{Deserialize, Serialize};

use crate::models::*;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
  pub id: i32,
  pub title: String,
  pub img_url: Option<String>,
  pub date: NaiveDateTime,
  pub created_at: NaiveDateTime,
  pub tags: Vec<Tag>,
}

impl Reminder {
  pub fn has_any_tag(&self, names: &[&str]) -> bool {
    self.tags.iter().any(|tag| names.contains(&tag.name.as_str()))
  }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderList {
  pub reminders: Vec<Reminder>,
  pub reminders_count: usize,
}

impl From<Vec<Reminder>> for ReminderList {
  fn from(reminders: Vec<Reminder>) -> Self {
    ReminderList {
      reminders_count: reminders.len(),
      reminders,
    }
  }
}
