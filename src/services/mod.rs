use log::*;

use std::collections::HashSet;

use actix_web::{web};

use crate::error::*;
use crate::app::*;
use crate::db::StorageConfig;

pub mod reminder;
pub mod tag;
pub mod manifest;

type BoxService = Box<dyn Service>;

pub trait Service: ServiceClone + Send {
  /// Load Service config from AppConfig.
  fn load_app_config(&mut self, config: &AppConfig, prefix: &str) -> Result<()>;

  /// Setup Service endpoints.
  fn web_config(&self, _web: &mut web::ServiceConfig) {
  }

  fn api_config(&self, _web: &mut web::ServiceConfig) {
  }
}

pub trait ServiceClone {
  fn clone_box(&self) -> BoxService;
}

impl<T> ServiceClone for T
where
    T: 'static + Service + Clone,
{
  fn clone_box(&self) -> BoxService {
    Box::new(self.clone())
  }
}

impl Clone for BoxService {
  fn clone(&self) -> BoxService {
    self.clone_box()
  }
}

#[derive(Clone)]
pub struct Services {
  storage: StorageConfig,
  services: Vec<BoxService>,
}

impl Services {
  pub fn new(storage: StorageConfig) -> Services {
    Services {
      storage,
      services: Vec::new(),
    }
  }

  fn load_service(&mut self, name: &str, config: &AppConfig, prefix: &str) -> Result<BoxService> {
    let mut service: BoxService = match name {
      "Reminder" => Box::new(reminder::new_factory()),
      "Tag" => Box::new(tag::new_factory()),
      "Manifest" => Box::new(manifest::new_factory()),
      _ => {
        return Err(anyhow::anyhow!("Unknown Service: {}", name).into());
      },
    };

    service.load_app_config(&config, prefix)?;
    Ok(service)
  }

  /// Load Service config from AppConfig.
  pub fn load_app_config(&mut self, config: &AppConfig, prefix: &str) -> Result<()> {
    let mut loaded: HashSet<String> = HashSet::new();
    let list = config.get_str_list(&format!("{}.services", prefix))?;
    for name in list.into_iter() {
      info!("Loading {}Service config", name);
      // check if it is loaded already.
      if !loaded.insert(name.clone()) {
        return Err(anyhow::anyhow!("can't load service {} multiple times.", name).into());
      }
      // load service
      let service = self.load_service(&name, config, prefix)?;
      self.services.push(service);
    }
    Ok(())
  }

  /// Setup Service endpoints.
  pub fn web_config(&self, web: &mut web::ServiceConfig) {
    // Store handle for worker.
    let store = self.storage.connect();
    web.data(store);

    for service in self.services.iter() {
      service.web_config(web);
    }
    web.service(
      web::scope("/api")
        .configure(|web| {
          for service in self.services.iter() {
            service.api_config(web);
          }
        })
    );
  }
}

pub fn config_services(config: &AppConfig, prefix: &str) -> Result<Services> {
  let db_url = config.require_str("db.url")?;
  let mut services = Services::new(StorageConfig::from_url(&db_url));
  services.load_app_config(config, prefix)?;
  Ok(services)
}
