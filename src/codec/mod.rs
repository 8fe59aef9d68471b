pub mod envelope;
pub use envelope::Envelope;

pub mod query;
pub use query::{QueryMap, QueryValue, encode_query, decode_query};
