pub use crate::app::App;
pub use vtexday_types::prelude::*;

// vim: ts=4
