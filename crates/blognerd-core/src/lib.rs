#![deny(dead_code)]
#![deny(unused_variables)]

pub mod config;
pub mod error;
pub mod filter;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use filter::{Clause, FilterOp, FilterPredicate, FilterValue};
