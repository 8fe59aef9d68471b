use serde::de::Deserialize;

use clap::ArgMatches;
use config::{Config, ConfigError, Value, File, FileFormat, Environment};

use crate::error::*;

const ENV_PREFIX: &str = "app";
const ENV_SEPARATOR: &str = "__";

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub conf: Config
}

impl AppConfig {
  pub fn new_clap(cli: &ArgMatches) -> Result<Self> {
    let mut conf = Config::default();
    // Load defaults
    conf.merge(File::with_name("conf/default"))?;

    if let Some(ref config_file) = cli.value_of("config") {
      conf.merge(File::with_name(config_file))?;
    } else {
      // Get RUN_MODE from environment
      let env = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
      conf.merge(File::with_name(&format!("conf/{}", env)).required(false))?;
    }

    let mut config = AppConfig {
      conf,
    };
    // Allow overrides from environment
    config.merge_env(ENV_PREFIX)?;
    Ok(config)
  }

  /// Merge `<PREFIX>_*` variables.  `__` separates path segments so keys
  /// keep their underscores: `APP_REMINDER__MAX_TAG_RETRIES` sets
  /// `reminder.max_tag_retries`.
  pub fn merge_env(&mut self, prefix: &str) -> Result<()> {
    self.conf.merge(Environment::with_prefix(prefix).separator(ENV_SEPARATOR))?;
    Ok(())
  }

  /// Config from literal TOML, no files or environment.
  pub fn from_toml_str(toml: &str) -> Result<Self> {
    let mut conf = Config::default();
    conf.merge(File::from_str(toml, FileFormat::Toml))?;
    Ok(AppConfig {
      conf,
    })
  }

  pub fn get<'de, T: Deserialize<'de>>(&self, key: &str) -> Result<Option<T>> {
    Ok(self.conf.get(key).or_else(|e| {
      match e {
        ConfigError::NotFound(_) => Ok(None),
        err => Err(err),
      }
    })?)
  }

  pub fn get_str(&self, key: &str) -> Result<Option<String>> {
    let val = if let Some(val) = self.get(key)? {
      Some(Value::into_str(val)?)
    } else {
      None
    };
    Ok(val)
  }

  /// Required string setting.
  pub fn require_str(&self, key: &str) -> Result<String> {
    match self.get_str(key)? {
      Some(val) => Ok(val),
      None => Err(anyhow::anyhow!("{} must be set", key).into()),
    }
  }

  pub fn get_int(&self, key: &str) -> Result<Option<i64>> {
    let val = if let Some(val) = self.get(key)? {
      Some(Value::into_int(val)?)
    } else {
      None
    };
    Ok(val)
  }

  pub fn get_bool(&self, key: &str) -> Result<Option<bool>> {
    let val = if let Some(val) = self.get(key)? {
      Some(Value::into_bool(val)?)
    } else {
      None
    };
    Ok(val)
  }

  pub fn get_array(&self, key: &str) -> Result<Option<Vec<Value>>> {
    let val = if let Some(val) = self.get(key)? {
      Some(Value::into_array(val)?)
    } else {
      None
    };
    Ok(val)
  }

  /// List of strings, e.g. `servers` or `<server>.services`.
  pub fn get_str_list(&self, key: &str) -> Result<Vec<String>> {
    let list = match self.get_array(key)? {
      Some(list) => list,
      None => return Err(anyhow::anyhow!("missing list '{}'", key).into()),
    };
    let mut out = Vec::with_capacity(list.len());
    for val in list.into_iter() {
      out.push(val.into_str()?);
    }
    Ok(out)
  }
}
