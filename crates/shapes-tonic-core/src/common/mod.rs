pub mod error;
pub mod geometry;
pub mod proto;
pub mod shape_id;
pub mod types;

pub use error::{Error, Result};
