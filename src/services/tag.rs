use actix_web::{
  get, web, HttpResponse,
  Error
};

use crate::error::*;
use crate::app::*;
use crate::db::BoxStore;
use crate::forms::TagList;

/// Get list of tags
#[get("/tags")]
async fn list(
  store: web::Data<BoxStore>,
) -> Result<HttpResponse, Error> {
  let tags = store.list_tags().await?;
  Ok(HttpResponse::Ok().json(TagList::from(tags)))
}

#[derive(Debug, Clone, Default)]
pub struct TagService {
}

impl super::Service for TagService {
  fn load_app_config(&mut self, _config: &AppConfig, _prefix: &str) -> Result<()> {
    Ok(())
  }

  fn api_config(&self, web: &mut web::ServiceConfig) {
    web
      .service(list);
  }
}

pub fn new_factory() -> TagService {
  Default::default()
}
