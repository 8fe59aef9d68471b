use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use url::form_urlencoded;

/// Value of a flat query-string map.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum QueryValue {
  One(String),
  Many(Vec<String>),
}

impl QueryValue {
  pub fn values(&self) -> Vec<&str> {
    match self {
      QueryValue::One(val) => vec![val.as_str()],
      QueryValue::Many(vals) => vals.iter().map(String::as_str).collect(),
    }
  }

  fn push(&mut self, val: String) {
    match self {
      QueryValue::One(first) => {
        let first = std::mem::replace(first, String::new());
        *self = QueryValue::Many(vec![first, val]);
      },
      QueryValue::Many(vals) => vals.push(val),
    }
  }
}

impl From<&str> for QueryValue {
  fn from(val: &str) -> Self {
    QueryValue::One(val.to_string())
  }
}

impl From<Vec<&str>> for QueryValue {
  fn from(vals: Vec<&str>) -> Self {
    QueryValue::Many(vals.into_iter().map(str::to_string).collect())
  }
}

pub type QueryMap = BTreeMap<String, QueryValue>;

/// One `key=value` pair per value; sequences repeat the key.
pub fn encode_query(map: &QueryMap) -> String {
  let mut query = form_urlencoded::Serializer::new(String::new());
  for (key, val) in map.iter() {
    for val in val.values() {
      query.append_pair(key, val);
    }
  }
  query.finish()
}

/// A key seen once stays scalar; repeated keys collect into a sequence in
/// the order they appear.
pub fn decode_query(query: &str) -> QueryMap {
  let query = query.strip_prefix('?').unwrap_or(query);
  let mut map = QueryMap::new();
  for (key, val) in form_urlencoded::parse(query.as_bytes()) {
    let val = val.into_owned();
    match map.get_mut(&*key) {
      Some(existing) => existing.push(val),
      None => {
        map.insert(key.into_owned(), QueryValue::One(val));
      },
    }
  }
  map
}
