pub mod bootstrap;
pub mod config;
pub mod corpus;
pub mod error;
pub mod geometry;
pub mod io;
pub mod landmark;
pub mod model;
pub mod reconcile;
pub mod stats;
pub mod store;
pub mod visualization;

pub use error::{Error, Result};
