use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub const TITLE_REQUIRED: &str = "Title is required";
pub const INVALID_URL: &str = "Must be a valid URL";

/// Field name -> messages, reported for the whole request at once.
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationErrors {
  pub errors: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
  pub fn new() -> Self {
    Default::default()
  }

  pub fn add(&mut self, field: &str, message: &str) {
    self.errors.entry(field.to_string())
      .or_insert_with(Vec::new)
      .push(message.to_string());
  }

  pub fn is_empty(&self) -> bool {
    self.errors.is_empty()
  }

  pub fn get(&self, field: &str) -> Option<&[String]> {
    self.errors.get(field).map(|msgs| msgs.as_slice())
  }

  pub fn has(&self, field: &str) -> bool {
    self.errors.contains_key(field)
  }

  pub fn into_result(self) -> Result<(), ValidationErrors> {
    if self.is_empty() {
      Ok(())
    } else {
      Err(self)
    }
  }
}

impl fmt::Display for ValidationErrors {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut first = true;
    for (field, messages) in self.errors.iter() {
      if !first {
        write!(f, "; ")?;
      }
      first = false;
      write!(f, "{}: {}", field, messages.join(", "))?;
    }
    Ok(())
  }
}

// Rules shared by the client form and the server DTO.

pub fn check_title(title: &str, errors: &mut ValidationErrors) {
  if title.is_empty() {
    errors.add("title", TITLE_REQUIRED);
  }
}

/// Empty means "no image"; anything else must parse as an absolute URL.
pub fn check_img_url(img_url: &str, errors: &mut ValidationErrors) {
  if !img_url.is_empty() && url::Url::parse(img_url).is_err() {
    errors.add("imgUrl", INVALID_URL);
  }
}
