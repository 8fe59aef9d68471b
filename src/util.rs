use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use serde::{Deserialize, Deserializer};

// epoch milliseconds <-> chrono util functions.

pub fn from_epoch_millis(millis: i64) -> Option<NaiveDateTime> {
  let secs = millis.div_euclid(1000);
  let nsecs = (millis.rem_euclid(1000) * 1_000_000) as u32;
  DateTime::<Utc>::from_timestamp(secs, nsecs).map(|ts| ts.naive_utc())
}

pub fn to_epoch_millis(val: NaiveDateTime) -> i64 {
  val.and_utc().timestamp_millis()
}

/// Calendar day at UTC midnight, as epoch milliseconds.
pub fn date_to_epoch_millis(date: NaiveDate) -> i64 {
  to_epoch_millis(date.and_time(NaiveTime::MIN))
}

pub fn now() -> NaiveDateTime {
  Utc::now().naive_utc()
}

/// Treat an empty (or blank) form value as an absent date.
pub fn empty_as_none_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
  D: Deserializer<'de>,
{
  let val: Option<String> = Option::deserialize(deserializer)?;
  match val.as_deref().map(str::trim) {
    None | Some("") => Ok(None),
    Some(val) => {
      NaiveDate::parse_from_str(val, "%Y-%m-%d")
        .map(Some)
        .map_err(serde::de::Error::custom)
    },
  }
}
