//! Common types shared by every docstore module.

mod constants;
mod value;

pub use constants::*;
pub use value::*;
