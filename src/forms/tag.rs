use serde::{Deserialize, Serialize};

use crate::models::tag::*;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct TagList {
  pub tags: Vec<TagName>,
}

impl From<Vec<Tag>> for TagList {
  fn from(tags: Vec<Tag>) -> Self {
    TagList {
      tags: tags.into_iter().map(|tag| TagName(tag.name)).collect(),
    }
  }
}
