#[macro_use]
extern crate lazy_static;

pub mod error;
pub use error::Error;

pub mod util;

pub mod app;

pub mod codec;

pub mod forms;

pub mod models;

pub mod db;

pub mod mapper;

pub mod services;
