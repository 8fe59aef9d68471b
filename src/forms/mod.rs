pub mod validation;
pub use validation::ValidationErrors;

pub mod reminder;
pub mod tag;
pub use self::{
  reminder::*,
  tag::*,
};
