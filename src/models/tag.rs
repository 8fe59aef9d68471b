use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tag {
  pub id: i32,
  pub name: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct TagName(pub String);
