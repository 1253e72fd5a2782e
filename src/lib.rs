pub mod control;
pub mod engine;
pub mod error;
pub mod flow;
pub mod layer;
pub mod model;
pub mod project;

pub use error::{Error, Result};

#[cfg(test)]
mod test;
