use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value as JsonValue;

use url::form_urlencoded;

use crate::error::*;

/// Form field that carries the JSON text.
pub const ENVELOPE_KEY: &str = "json";

/// Single-field transport container for an arbitrary JSON payload.
///
/// The envelope does not know the payload's schema; callers validate what
/// `decode` hands back.
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
pub struct Envelope {
  #[serde(default)]
  pub json: Option<String>,
}

impl Envelope {
  pub fn encode<T: Serialize + ?Sized>(payload: &T) -> Result<Envelope> {
    Ok(Envelope {
      json: Some(serde_json::to_string(payload)?),
    })
  }

  pub fn decode(&self) -> Result<JsonValue> {
    let text = self.json.as_ref().ok_or_else(|| {
      Error::MalformedEnvelope(format!("missing '{}' field", ENVELOPE_KEY))
    })?;
    serde_json::from_str(text).map_err(|err| {
      Error::MalformedEnvelope(format!("invalid json: {}", err))
    })
  }

  /// Decode straight into `T`.  Shape mismatches are reported as malformed.
  pub fn decode_as<T: DeserializeOwned>(&self) -> Result<T> {
    serde_json::from_value(self.decode()?).map_err(|err| {
      Error::MalformedEnvelope(format!("unexpected payload: {}", err))
    })
  }

  /// `application/x-www-form-urlencoded` body.
  pub fn to_form_body(&self) -> String {
    let mut body = form_urlencoded::Serializer::new(String::new());
    if let Some(ref json) = self.json {
      body.append_pair(ENVELOPE_KEY, json);
    }
    body.finish()
  }

  /// The first `json` field of a urlencoded body wins; other fields are ignored.
  pub fn from_form_body(body: &str) -> Envelope {
    let json = form_urlencoded::parse(body.as_bytes())
      .find(|(key, _)| key == ENVELOPE_KEY)
      .map(|(_, val)| val.into_owned());
    Envelope { json }
  }
}
