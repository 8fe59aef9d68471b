pub mod reminder;
pub mod tag;
pub use self::{
  reminder::*,
  tag::*,
};
