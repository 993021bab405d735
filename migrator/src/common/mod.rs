mod constants;
mod lock;
mod type_utils;

pub use constants::*;
pub use lock::*;
pub use type_utils::*;
