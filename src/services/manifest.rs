use actix_web::{get, web, HttpResponse};

use serde::Serialize;

use crate::error::*;
use crate::app::*;

#[derive(Debug, Clone, Serialize)]
pub struct ManifestIcon {
  pub src: &'static str,
  pub sizes: &'static str,
  #[serde(rename = "type")]
  pub mime: &'static str,
  pub purpose: &'static str,
}

const fn icon(src: &'static str, sizes: &'static str, purpose: &'static str) -> ManifestIcon {
  ManifestIcon { src, sizes, mime: "image/png", purpose }
}

const ICONS: [ManifestIcon; 4] = [
  icon("/web-app-manifest-192x192.png", "192x192", "any"),
  icon("/web-app-manifest-192x192.png", "192x192", "maskable"),
  icon("/web-app-manifest-512x512.png", "512x512", "any"),
  icon("/web-app-manifest-512x512.png", "512x512", "maskable"),
];

/// Web app manifest.
#[derive(Debug, Clone, Serialize)]
pub struct Manifest {
  pub name: String,
  pub short_name: String,
  pub description: String,
  pub start_url: &'static str,
  pub display: &'static str,
  pub background_color: String,
  pub theme_color: String,
  pub orientation: &'static str,
  pub scope: &'static str,
  pub icons: Vec<ManifestIcon>,
  pub categories: Vec<&'static str>,
  pub lang: &'static str,
  pub dir: &'static str,
}

impl Default for Manifest {
  fn default() -> Self {
    Self {
      name: "Souviens".to_string(),
      short_name: "Souviens".to_string(),
      description: "A personal reminder app to help you remember important things for the future".to_string(),
      start_url: "/",
      display: "standalone",
      background_color: "#1f2937".to_string(),
      theme_color: "#ea580c".to_string(),
      orientation: "portrait",
      scope: "/",
      icons: ICONS.to_vec(),
      categories: vec!["productivity", "lifestyle", "utilities"],
      lang: "en",
      dir: "ltr",
    }
  }
}

#[get("/resources/manifest.json")]
async fn manifest(
  cfg: web::Data<ManifestService>,
) -> HttpResponse {
  HttpResponse::Ok()
    .content_type("application/manifest+json")
    .json(&cfg.manifest)
}

#[derive(Debug, Clone, Default)]
pub struct ManifestService {
  pub manifest: Manifest,
}

impl super::Service for ManifestService {
  fn load_app_config(&mut self, config: &AppConfig, _prefix: &str) -> Result<()> {
    let m = &mut self.manifest;
    for (key, field) in vec![
      ("Manifest.name", &mut m.name),
      ("Manifest.short_name", &mut m.short_name),
      ("Manifest.description", &mut m.description),
      ("Manifest.theme_color", &mut m.theme_color),
      ("Manifest.background_color", &mut m.background_color),
    ] {
      if let Some(val) = config.get_str(key)? {
        *field = val;
      }
    }
    Ok(())
  }

  fn web_config(&self, web: &mut web::ServiceConfig) {
    web
      .data(self.clone())
      .service(manifest);
  }
}

pub fn new_factory() -> ManifestService {
  Default::default()
}
