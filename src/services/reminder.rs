use log::*;

use std::convert::TryInto;

use actix_web::{
  get, post, web, http::header, HttpRequest, HttpResponse,
  Error
};

use serde_json::Value as JsonValue;

use crate::error::*;
use crate::app::*;
use crate::codec::{decode_query, Envelope};
use crate::db::BoxStore;
use crate::forms::ReminderForm;
use crate::mapper::{ReminderMapper, DEFAULT_MAX_TAG_RETRIES};
use crate::models::*;

/// Query parameter filtering the listing by tag name.
const TAG_FILTER: &str = "tag";

/// List all reminders
#[get("/")]
async fn index(
  store: web::Data<BoxStore>,
) -> Result<HttpResponse, Error> {
  let reminders = store.list_reminders().await?;
  Ok(HttpResponse::Ok().json(ReminderList::from(reminders)))
}

/// New reminder submitted as an envelope form.
#[post("/new")]
async fn create(
  cfg: web::Data<ReminderService>,
  store: web::Data<BoxStore>,
  envelope: web::Form<Envelope>,
) -> Result<HttpResponse, Error> {
  let reminder = cfg.mapper.create_from_envelope(&***store, &envelope).await?;
  Ok(cfg.created(&reminder))
}

/// New reminder from the plain HTML form.  Checked against the client schema
/// before anything is sent through the envelope.
#[post("/new/form")]
async fn create_from_form(
  cfg: web::Data<ReminderService>,
  store: web::Data<BoxStore>,
  form: web::Form<ReminderForm>,
) -> Result<HttpResponse, Error> {
  let dto = form.to_dto()?;
  let envelope = Envelope::encode(&dto)?;
  let reminder = cfg.mapper.create_from_envelope(&***store, &envelope).await?;
  Ok(cfg.created(&reminder))
}

/// Get list of reminders, optionally filtered by `?tag=..`
#[get("/reminders")]
async fn list(
  store: web::Data<BoxStore>,
  req: HttpRequest,
) -> Result<HttpResponse, Error> {
  let query = decode_query(req.query_string());
  let mut reminders = store.list_reminders().await?;
  if let Some(filter) = query.get(TAG_FILTER) {
    let names = filter.values();
    debug!("Reminder - list: filter tags={:?}", names);
    reminders.retain(|reminder| reminder.has_any_tag(&names));
  }
  Ok(HttpResponse::Ok().json(ReminderList::from(reminders)))
}

/// post new reminder as raw JSON
#[post("/reminders")]
async fn store_reminder(
  cfg: web::Data<ReminderService>,
  store: web::Data<BoxStore>,
  raw: web::Json<JsonValue>,
) -> Result<HttpResponse, Error> {
  let req = cfg.mapper.validate(&raw)?;
  let reminder = cfg.mapper.persist(&***store, &req).await?;
  Ok(HttpResponse::Created().json(reminder))
}

#[derive(Debug, Clone)]
pub struct ReminderService {
  pub redirect_to: String,
  pub mapper: ReminderMapper,
}

impl Default for ReminderService {
  fn default() -> Self {
    Self {
      redirect_to: "/".to_string(),
      mapper: ReminderMapper::default(),
    }
  }
}

impl ReminderService {
  fn created(&self, reminder: &Reminder) -> HttpResponse {
    HttpResponse::SeeOther()
      .header(header::LOCATION, self.redirect_to.as_str())
      .json(reminder)
  }
}

impl super::Service for ReminderService {
  fn load_app_config(&mut self, config: &AppConfig, _prefix: &str) -> Result<()> {
    if let Some(redirect_to) = config.get_str("Reminder.redirect_to")? {
      self.redirect_to = redirect_to;
    }
    let retries = config.get_int("Reminder.max_tag_retries")?
      .unwrap_or(DEFAULT_MAX_TAG_RETRIES as i64);
    let retries: u32 = retries.try_into()
      .map_err(|_| anyhow::anyhow!("Reminder.max_tag_retries must be >= 0"))?;
    self.mapper = ReminderMapper::new(retries);
    Ok(())
  }

  fn web_config(&self, web: &mut web::ServiceConfig) {
    web
      .data(self.clone())
      .service(index)
      .service(create)
      .service(create_from_form);
  }

  fn api_config(&self, web: &mut web::ServiceConfig) {
    web
      .data(self.clone())
      .service(list)
      .service(store_reminder);
  }
}

pub fn new_factory() -> ReminderService {
  Default::default()
}
