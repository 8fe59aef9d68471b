use log::*;

use std::convert::TryInto;
use std::thread;

use futures::executor;

use crossbeam_channel::{unbounded, Receiver, Sender};

use actix_rt::System;
use actix_web::{dev::Server, get, middleware, web, App, HttpResponse, HttpServer};

use crate::{
  error::*,
  app::*,
  db::test_db,
  services::config_services,
};

const FORM_LIMIT: usize = 256 * 1024;

/// What server threads and the `/stop` endpoint report to the supervisor.
pub enum ServerEvent<S> {
  /// Listening; `S` stops it.
  Started(String, S),
  StopRequested,
  /// The server thread is done.  `error` is set when it never started or
  /// failed while running.
  Stopped {
    name: String,
    error: Option<String>,
  },
}

type Events = Sender<ServerEvent<Server>>;

/// A running server the supervisor can shut down.
pub trait StopHandle {
  fn stop_gracefully(&self);
}

impl StopHandle for Server {
  fn stop_gracefully(&self) {
    executor::block_on(self.stop(true));
  }
}

/// Wait until `count` server threads have stopped.
///
/// A stop request or a failed server stops every other server.
pub fn supervise<S: StopHandle>(events: &Receiver<ServerEvent<S>>, count: usize) -> Result<()> {
  let mut pending = count;
  let mut running: Vec<(String, S)> = Vec::new();
  let mut stopping = false;
  let mut failed: Vec<String> = Vec::new();

  while pending > 0 {
    let event = match events.recv() {
      Ok(event) => event,
      Err(err) => {
        error!("Server events closed with {} server(s) pending: {}", pending, err);
        break;
      },
    };
    match event {
      ServerEvent::Started(name, srv) => {
        info!("Server({}) started.", name);
        if stopping {
          srv.stop_gracefully();
        }
        running.push((name, srv));
      },
      ServerEvent::StopRequested => {
        if !stopping {
          info!("Shutdown requested.");
          stopping = true;
          for (name, srv) in running.iter() {
            debug!("Stopping server({}).", name);
            srv.stop_gracefully();
          }
        }
      },
      ServerEvent::Stopped { name, error } => {
        pending -= 1;
        running.retain(|(running_name, _)| *running_name != name);
        if let Some(error) = error {
          error!("Server({}) failed: {}", name, error);
          failed.push(name);
          if !stopping {
            stopping = true;
            for (name, srv) in running.iter() {
              debug!("Stopping server({}).", name);
              srv.stop_gracefully();
            }
          }
        }
        debug!("Remaining servers: {}", pending);
      },
    }
  }

  if failed.is_empty() {
    info!("Stopped all servers.");
    Ok(())
  } else {
    Err(anyhow::anyhow!("server(s) failed: {}", failed.join(", ")).into())
  }
}

#[get("/stop")]
async fn stop(events: web::Data<Events>) -> HttpResponse {
  info!("Got shutdown request.");
  if let Err(err) = events.send(ServerEvent::StopRequested) {
    error!("Shutdown request lost: {}", err);
  }
  HttpResponse::Ok().body("Shutting down.")
}

pub fn execute(config: AppConfig) -> Result<()> {
  let servers = config.get_str_list("servers")?;
  let (tx, rx) = unbounded();

  for name in servers.iter() {
    let config = config.clone();
    let events = tx.clone();
    let name = name.clone();
    debug!("Spawn server: {}", name);
    thread::Builder::new()
      .name(format!("server.{}", name))
      .spawn(move || {
        let error = run_server(&config, &name, &events).err().map(|err| format!("{:?}", err));
        // reported even when the server never got to listen.
        if let Err(err) = events.send(ServerEvent::Stopped { name, error }) {
          error!("Supervisor gone: {}", err);
        }
      })?;
  }
  drop(tx);

  supervise(&rx, servers.len())
}

fn run_server(config: &AppConfig, name: &str, events: &Events) -> Result<()> {
  let mut sys = System::new(format!("system.{}", name));
  let key = |setting: &str| format!("{}.{}", name, setting);

  if config.get_bool("debug")?.unwrap_or(false) {
    // fail fast on a bad database.
    sys.block_on(test_db(config.require_str("db.url")?))?;
  }

  info!("Server({}): configure services.", name);
  let services = config_services(config, name)?;

  let stopper = if config.get_bool(&key("stopper"))?.unwrap_or_default() {
    Some(events.clone())
  } else {
    None
  };

  let mut server = HttpServer::new(move || {
    let mut app = App::new()
      .app_data(web::FormConfig::default().limit(FORM_LIMIT))
      .wrap(middleware::Logger::default())
      .wrap(middleware::Compress::default())
      .configure(|web| services.web_config(web));

    if let Some(ref stopper) = stopper {
      app = app.data(stopper.clone())
        .service(stop);
    }
    app
  });

  if let Some(workers) = config.get_int(&key("workers"))? {
    let workers: usize = workers.try_into()
      .map_err(|_| anyhow::anyhow!("{} must be > 0", key("workers")))?;
    server = server.workers(workers);
  }
  if let Some(backlog) = config.get_int(&key("backlog"))? {
    let backlog: i32 = backlog.try_into()
      .map_err(|_| anyhow::anyhow!("{} out of range", key("backlog")))?;
    server = server.backlog(backlog);
  }

  let listen = config.require_str(&key("listen"))?;
  info!("Server({}): listening on {}", name, listen);
  let server = server.bind(listen.as_str())?.run();

  events.send(ServerEvent::Started(name.to_string(), server.clone()))
    .map_err(|_| anyhow::anyhow!("supervisor gone"))?;

  sys.block_on(server)?;
  Ok(())
}
