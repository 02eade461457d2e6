pub use vtexday_core::prelude::*;

// vim: ts=4
