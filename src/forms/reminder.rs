use chrono::{NaiveDate, NaiveDateTime};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::error::*;
use crate::forms::validation::*;
use crate::util::{date_to_epoch_millis, empty_as_none_date, from_epoch_millis};

/// What the user typed into the "new reminder" form.
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReminderForm {
  #[serde(default)]
  pub title: String,
  /// Comma separated.
  #[serde(default)]
  pub tags: Option<String>,
  #[serde(default)]
  pub img_url: Option<String>,
  #[serde(default, deserialize_with = "empty_as_none_date")]
  pub date: Option<NaiveDate>,
}

impl ReminderForm {
  pub fn validate(&self) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    check_title(&self.title, &mut errors);
    if let Some(ref img_url) = self.img_url {
      check_img_url(img_url, &mut errors);
    }
    if self.date.is_none() {
      errors.add("date", "Date is required");
    }
    errors.into_result()
  }

  /// Validate, then build the wire DTO.
  pub fn to_dto(&self) -> Result<CreateReminder> {
    self.validate()?;
    let date = match self.date {
      Some(date) => date,
      None => return Err(Error::BadRequest("date is required".to_string())),
    };
    Ok(CreateReminder {
      title: self.title.clone(),
      tags: self.tags.as_deref().map(split_tags).unwrap_or_default(),
      img_url: self.img_url.clone(),
      date: date_to_epoch_millis(date),
    })
  }
}

/// Split a comma separated tag string: trim, drop empty entries and repeats.
pub fn split_tags(tags: &str) -> Vec<String> {
  let mut out: Vec<String> = Vec::new();
  for tag in tags.split(',').map(str::trim) {
    if !tag.is_empty() && !out.iter().any(|t| t == tag) {
      out.push(tag.to_string());
    }
  }
  out
}

/// Wire DTO for creating a reminder.
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateReminder {
  pub title: String,
  pub tags: Vec<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub img_url: Option<String>,
  /// Epoch milliseconds.
  pub date: i64,
}

const EXPECTED_STRING: &str = "Expected string";
const EXPECTED_TAGS: &str = "Expected array of strings";
const REQUIRED: &str = "Required";

impl CreateReminder {
  /// Check an untrusted payload against the server schema.
  ///
  /// Every failing field is reported; on success duplicate tag names are
  /// removed (first occurrence kept).
  pub fn validate(raw: &JsonValue) -> Result<CreateReminder> {
    let empty = Map::new();
    let mut errors = ValidationErrors::new();
    let obj = match raw.as_object() {
      Some(obj) => obj,
      None => {
        errors.add("_", "Expected object");
        &empty
      },
    };

    let title = match obj.get("title") {
      Some(JsonValue::String(title)) => {
        check_title(title, &mut errors);
        title.clone()
      },
      None | Some(JsonValue::Null) => {
        errors.add("title", TITLE_REQUIRED);
        String::new()
      },
      Some(_) => {
        errors.add("title", EXPECTED_STRING);
        String::new()
      },
    };

    let mut tags: Vec<String> = Vec::new();
    match obj.get("tags") {
      Some(JsonValue::Array(items)) => {
        for item in items.iter() {
          match item {
            JsonValue::String(tag) if tag.trim().is_empty() => {
              errors.add("tags", "Tags must not be empty");
            },
            JsonValue::String(tag) => {
              if !tags.contains(tag) {
                tags.push(tag.clone());
              }
            },
            _ => errors.add("tags", EXPECTED_TAGS),
          }
        }
      },
      None => errors.add("tags", REQUIRED),
      Some(_) => errors.add("tags", EXPECTED_TAGS),
    }

    let img_url = match obj.get("imgUrl") {
      None | Some(JsonValue::Null) => None,
      Some(JsonValue::String(img_url)) => {
        check_img_url(img_url, &mut errors);
        Some(img_url.clone())
      },
      Some(_) => {
        errors.add("imgUrl", EXPECTED_STRING);
        None
      },
    };

    let date = match obj.get("date") {
      None | Some(JsonValue::Null) => {
        errors.add("date", REQUIRED);
        0
      },
      Some(JsonValue::Number(num)) => match epoch_millis(num) {
        Some(date) => date,
        None => {
          errors.add("date", "Must be epoch milliseconds");
          0
        },
      },
      Some(_) => {
        errors.add("date", "Expected number");
        0
      },
    };

    errors.into_result()?;
    Ok(CreateReminder { title, tags, img_url, date })
  }

  /// Storage input: empty image URL means no image.
  pub fn to_new_reminder(&self) -> Result<NewReminder> {
    let date = from_epoch_millis(self.date)
      .ok_or_else(|| Error::BadRequest(format!("date out of range: {}", self.date)))?;
    Ok(NewReminder {
      title: self.title.clone(),
      img_url: self.img_url.clone().filter(|url| !url.is_empty()),
      date,
    })
  }
}

/// Integral number of milliseconds that maps to a representable timestamp.
fn epoch_millis(num: &serde_json::Number) -> Option<i64> {
  let millis = match num.as_i64() {
    Some(millis) => millis,
    None => {
      let val = num.as_f64()?;
      if val.fract() != 0.0 || val.abs() > i64::MAX as f64 {
        return None;
      }
      val as i64
    },
  };
  from_epoch_millis(millis).map(|_| millis)
}

/// Reminder row to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReminder {
  pub title: String,
  pub img_url: Option<String>,
  pub date: NaiveDateTime,
}
