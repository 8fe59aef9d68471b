use actix_web::{
  http::{header, StatusCode},
  test, App,
};

use serde_json::{json, Value as JsonValue};

use souviens::{app::AppConfig, codec::Envelope, services::config_services};

const CONFIG: &str = r#"
servers = ["main"]

[db]
url = "memory:"

[main]
listen = "127.0.0.1:0"
services = ["Reminder", "Tag", "Manifest"]

[Manifest]
name = "Souviens (test)"
"#;

/// 2034-12-25T00:00:00Z
const CHRISTMAS_2034: i64 = 2050617600000;
/// 2035-01-01T00:00:00Z
const NEW_YEAR_2035: i64 = 2051222400000;

macro_rules! init_app {
  () => {{
    let config = AppConfig::from_toml_str(CONFIG).unwrap();
    let services = config_services(&config, "main").unwrap();
    test::init_service(App::new().configure(|web| services.web_config(web))).await
  }};
}

fn envelope_request(payload: &JsonValue) -> test::TestRequest {
  let envelope = Envelope::encode(payload).unwrap();
  test::TestRequest::post()
    .uri("/new")
    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
    .set_payload(envelope.to_form_body())
}

#[actix_rt::test]
async fn envelope_submission_redirects_with_reminder() {
  let mut app = init_app!();

  let req = envelope_request(&json!({
    "title": "Anna",
    "tags": ["Baby names", "gifts", "Baby names"],
    "imgUrl": "",
    "date": CHRISTMAS_2034,
  })).to_request();
  let resp = test::call_service(&mut app, req).await;
  assert_eq!(resp.status(), StatusCode::SEE_OTHER);
  assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/");

  let body: JsonValue = test::read_body_json(resp).await;
  assert_eq!(body["title"], "Anna");
  assert_eq!(body["imgUrl"], JsonValue::Null);
  assert_eq!(body["date"], "2034-12-25T00:00:00");
  let names: Vec<&str> = body["tags"].as_array().unwrap().iter()
    .map(|tag| tag["name"].as_str().unwrap())
    .collect();
  assert_eq!(names, vec!["Baby names", "gifts"]);
}

#[actix_rt::test]
async fn invalid_payload_reports_every_field() {
  let mut app = init_app!();

  let req = envelope_request(&json!({
    "title": "",
    "tags": "Crypto",
    "imgUrl": "not a url",
    "date": 1.5,
  })).to_request();
  let resp = test::call_service(&mut app, req).await;
  assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

  let body: JsonValue = test::read_body_json(resp).await;
  let errors = body["errors"].as_object().unwrap();
  for field in &["title", "tags", "imgUrl", "date"] {
    assert!(errors.contains_key(*field), "missing error for {}", field);
  }
  assert_eq!(body["errors"]["title"], json!(["Title is required"]));

  // nothing was stored
  let req = test::TestRequest::get().uri("/").to_request();
  let body: JsonValue = test::read_response_json(&mut app, req).await;
  assert_eq!(body["remindersCount"], 0);
}

#[actix_rt::test]
async fn malformed_envelope_is_bad_request() {
  let mut app = init_app!();

  for payload in &["json=not+json", "other=field", ""] {
    let req = test::TestRequest::post()
      .uri("/new")
      .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
      .set_payload(*payload)
      .to_request();
    let resp = test::call_service(&mut app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "payload: {:?}", payload);
  }
}

#[actix_rt::test]
async fn html_form_goes_through_client_validation() {
  let mut app = init_app!();

  let req = test::TestRequest::post()
    .uri("/new/form")
    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
    .set_payload("title=&tags=a&imgUrl=nope&date=")
    .to_request();
  let resp = test::call_service(&mut app, req).await;
  assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
  let body: JsonValue = test::read_body_json(resp).await;
  assert!(body["errors"]["title"].is_array());
  assert_eq!(body["errors"]["date"], json!(["Date is required"]));

  let req = test::TestRequest::post()
    .uri("/new/form")
    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
    .set_payload("title=Anna&tags=Baby+names%2C+gifts%2C+&imgUrl=&date=2034-12-25")
    .to_request();
  let resp = test::call_service(&mut app, req).await;
  assert_eq!(resp.status(), StatusCode::SEE_OTHER);
  let body: JsonValue = test::read_body_json(resp).await;
  assert_eq!(body["date"], "2034-12-25T00:00:00");
  assert_eq!(body["tags"].as_array().unwrap().len(), 2);
}

#[actix_rt::test]
async fn listing_orders_by_date_and_filters_by_tag() {
  let mut app = init_app!();

  let payloads = vec![
    json!({ "title": "Sell Bitcoin", "tags": ["Crypto"], "date": NEW_YEAR_2035 }),
    json!({ "title": "Anna", "tags": ["Baby names"], "date": CHRISTMAS_2034 }),
    json!({ "title": "Buy Ether", "tags": ["Crypto", "Investments"], "date": CHRISTMAS_2034 }),
  ];
  for payload in payloads.iter() {
    let req = test::TestRequest::post()
      .uri("/api/reminders")
      .set_json(payload)
      .to_request();
    let resp = test::call_service(&mut app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
  }

  let titles = |body: &JsonValue| -> Vec<String> {
    body["reminders"].as_array().unwrap().iter()
      .map(|r| r["title"].as_str().unwrap().to_string())
      .collect()
  };

  let req = test::TestRequest::get().uri("/").to_request();
  let body: JsonValue = test::read_response_json(&mut app, req).await;
  assert_eq!(body["remindersCount"], 3);
  // same date: insertion order
  assert_eq!(titles(&body), vec!["Anna", "Buy Ether", "Sell Bitcoin"]);

  let req = test::TestRequest::get().uri("/api/reminders?tag=Crypto").to_request();
  let body: JsonValue = test::read_response_json(&mut app, req).await;
  assert_eq!(titles(&body), vec!["Buy Ether", "Sell Bitcoin"]);

  let req = test::TestRequest::get().uri("/api/reminders?tag=Baby%20names&tag=Investments").to_request();
  let body: JsonValue = test::read_response_json(&mut app, req).await;
  assert_eq!(titles(&body), vec!["Anna", "Buy Ether"]);

  let req = test::TestRequest::get().uri("/api/tags").to_request();
  let body: JsonValue = test::read_response_json(&mut app, req).await;
  assert_eq!(body, json!({ "tags": ["Baby names", "Crypto", "Investments"] }));
}

#[actix_rt::test]
async fn raw_json_is_validated() {
  let mut app = init_app!();

  let req = test::TestRequest::post()
    .uri("/api/reminders")
    .set_json(&json!(["not", "an", "object"]))
    .to_request();
  let resp = test::call_service(&mut app, req).await;
  assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_rt::test]
async fn manifest_uses_config() {
  let mut app = init_app!();

  let req = test::TestRequest::get().uri("/resources/manifest.json").to_request();
  let resp = test::call_service(&mut app, req).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(resp.headers().get(header::CONTENT_TYPE).unwrap(), "application/manifest+json");

  let body: JsonValue = test::read_body_json(resp).await;
  assert_eq!(body["name"], "Souviens (test)");
  assert_eq!(body["short_name"], "Souviens");
  assert_eq!(body["theme_color"], "#ea580c");
  assert_eq!(body["icons"].as_array().unwrap().len(), 4);
}

#[test]
fn unknown_service_is_rejected() {
  let config = AppConfig::from_toml_str(r#"
[db]
url = "memory:"

[main]
services = ["Reminder", "Comments"]
"#).unwrap();
  assert!(config_services(&config, "main").is_err());

  let config = AppConfig::from_toml_str(r#"
[db]
url = "memory:"

[main]
services = ["Tag", "Tag"]
"#).unwrap();
  assert!(config_services(&config, "main").is_err());
}
