use log::*;

use std::rc::Rc;
use std::cell::RefCell;
use std::time::Duration;

use tokio::time::delay_for;

use tokio_postgres::{
  connect, Client, Statement, Row, NoTls,
  types::ToSql,
};

use crate::error::*;

const MAX_RETRIES: u32 = 10;
const RETRY_DELAY: Duration = Duration::from_millis(100);
const RECONNECT_DELAY: Duration = Duration::from_millis(500);

/// Connection tagged with the version it was opened under.
pub type RefClient = Rc<(u64, Client)>;

/// Client connected state
#[derive(Clone)]
pub enum ClientState {
  Disconnected(u64),
  Connecting(u64),
  Connected(RefClient),
}

/// A postgres connection owned by one actix worker.
///
/// A background task keeps it connected; each reconnect bumps the version so
/// prepared statements and open transactions can tell they are stale.
#[derive(Clone)]
pub struct SharedClient {
  name: &'static str,
  state: Rc<RefCell<ClientState>>,
}

impl SharedClient {
  pub fn new(name: &'static str, url: &str) -> Self {
    let cl = Self {
      name,
      state: Rc::new(RefCell::new(ClientState::Disconnected(0))),
    };
    let task_cl = cl.clone();
    let url = url.to_string();
    actix_rt::spawn(async move {
      task_cl.run_connection(url).await;
      debug!("{} client: background task stopped.", task_cl.name);
    });
    cl
  }

  async fn run_connection(&self, url: String) {
    let mut version = 0;
    loop {
      version += 1;
      debug!("{} client: ver={}: Connecting", self.name, version);
      self.set_state(ClientState::Connecting(version));
      let (cl, conn) = loop {
        match connect(&url, NoTls).await {
          Ok(res) => break res,
          Err(err) => {
            warn!("{} client: ver={}: connect error: {}", self.name, version, err);
            delay_for(RECONNECT_DELAY).await;
          },
        }
      };
      debug!("{} client: ver={}: Connecting -> Connected", self.name, version);
      self.set_state(ClientState::Connected(Rc::new((version, cl))));
      match conn.await {
        Err(err) => {
          warn!("{} client: ver={}: connection error: {}", self.name, version, err);
        },
        Ok(()) => {
          debug!("{} client: ver={}: connection closed.", self.name, version);
          self.set_state(ClientState::Disconnected(version));
          return;
        },
      }
      self.set_state(ClientState::Disconnected(version));
      delay_for(RECONNECT_DELAY).await;
    }
  }

  pub async fn get_client(&self) -> Result<RefClient> {
    for _ in 0..MAX_RETRIES {
      match self.get_state() {
        ClientState::Connected(cl) => return Ok(cl),
        ClientState::Connecting(version) | ClientState::Disconnected(version) => {
          debug!("{} client: ver={}: waiting for connection", self.name, version);
          delay_for(RETRY_DELAY).await;
        },
      }
    }
    Err(Error::DisconnectedError("Failed to connect to database".to_string()))
  }

  /// Is `version` still the live connection?
  pub fn check_version(&self, version: u64) -> bool {
    match *self.state.borrow() {
      ClientState::Connected(ref cl) => cl.0 == version,
      _ => false,
    }
  }

  fn get_state(&self) -> ClientState {
    self.state.borrow().clone()
  }

  fn set_state(&self, state: ClientState) {
    self.state.replace(state);
  }
}

/// "connection closed" is the only client-side error worth retrying.
fn is_connection_closed(err: &tokio_postgres::Error) -> bool {
  err.code().is_none() && err.to_string() == "connection closed"
}

pub type RefClientStatement = Rc<ClientStatement>;

pub struct ClientStatement {
  cl: RefClient,
  statement: Statement,
}

impl ClientStatement {
  pub fn get_version(&self) -> u64 {
    self.cl.0
  }

  pub fn get_cl_statement(&self) -> (&Client, &Statement) {
    (&self.cl.1, &self.statement)
  }
}

/// Prepare statement state
#[derive(Clone)]
enum StatementState {
  Init,
  Preparing(u64),
  Prepared(RefClientStatement),
}

/// A statement that re-prepares itself whenever its `SharedClient`
/// reconnects.
#[derive(Clone)]
pub struct VersionedStatement {
  shared_cl: SharedClient,
  state: RefCell<StatementState>,
  query: String,
}

macro_rules! impl_client_method {
  ($method:ident, $res_ty:ty) => {
    /// Autocommit execution, retried across reconnects.
    pub async fn $method(&self, params: &[&(dyn ToSql + Sync)]) -> Result<$res_ty> {
      let mut retries = 0;
      loop {
        let ref_statement = self.get_statement().await?;
        let (cl, statement) = ref_statement.get_cl_statement();

        match cl.$method(statement, params).await {
          Ok(res) => return Ok(res),
          Err(ref err) if is_connection_closed(err) => {
            retries += 1;
            if retries >= MAX_RETRIES {
              return Err(Error::DisconnectedError(
                "Failed to connect to database".to_string()));
            }
            info!("DB connection closed, retry query.");
            delay_for(RETRY_DELAY).await;
          },
          Err(err) => {
            error!("Postgres error: {}, query=[[{}]]", err, self.query);
            return Err(err.into());
          },
        }
      }
    }
  };
}

macro_rules! impl_tx_method {
  ($name:ident, $method:ident, $res_ty:ty) => {
    /// Run on the transaction's connection.  Never retried: a reconnect
    /// means the transaction is gone.
    pub async fn $name(&self, tx_cl: &RefClient, params: &[&(dyn ToSql + Sync)]) -> Result<$res_ty> {
      let ref_statement = self.get_statement().await?;
      if ref_statement.get_version() != tx_cl.0 {
        return Err(Error::DisconnectedError(
          "Database connection lost during transaction".to_string()));
      }
      let (cl, statement) = ref_statement.get_cl_statement();
      cl.$method(statement, params).await.map_err(|err| {
        debug!("Postgres error in transaction: {}, query=[[{}]]", err, self.query);
        err.into()
      })
    }
  };
}

impl VersionedStatement {
  pub fn new(shared_cl: SharedClient, query: &str) -> Self {
    Self {
      shared_cl,
      state: RefCell::new(StatementState::Init),
      query: query.to_string(),
    }
  }

  pub async fn prepare(&self) -> Result<()> {
    self.get_statement().await?;
    Ok(())
  }

  pub async fn get_statement(&self) -> Result<RefClientStatement> {
    for _ in 0..MAX_RETRIES {
      match self.get_state() {
        StatementState::Init => {
          let cl = self.shared_cl.get_client().await?;
          let version = cl.0;
          debug!("get_statement: ver={}: Init -> Preparing", version);
          self.set_state(StatementState::Preparing(version));
          match cl.1.prepare(&self.query).await {
            Ok(statement) => {
              self.set_state(StatementState::Prepared(
                Rc::new(ClientStatement { cl, statement })
              ));
            },
            Err(ref err) if is_connection_closed(err) => {
              self.set_state(StatementState::Init);
            },
            Err(err) => {
              self.set_state(StatementState::Init);
              error!("Postgres error: {}, query=[[{}]]", err, self.query);
              return Err(err.into());
            },
          }
        },
        StatementState::Preparing(version) => {
          // another request on this worker is preparing it.
          debug!("get_statement: ver={}: Preparing..", version);
          delay_for(RETRY_DELAY).await;
        },
        StatementState::Prepared(cl_statement) => {
          if self.shared_cl.check_version(cl_statement.get_version()) {
            return Ok(cl_statement);
          }
          debug!("get_statement: ver={}: stale, re-prepare", cl_statement.get_version());
          self.set_state(StatementState::Init);
        },
      }
    }
    Err(Error::DisconnectedError("Failed to connect to database".to_string()))
  }

  fn get_state(&self) -> StatementState {
    self.state.borrow().clone()
  }

  fn set_state(&self, state: StatementState) {
    self.state.replace(state);
  }

  impl_client_method!(query, Vec<Row>);

  impl_tx_method!(query_one_in, query_one, Row);
  impl_tx_method!(query_opt_in, query_opt, Option<Row>);
  impl_tx_method!(execute_in, execute, u64);
}
