pub mod report;

pub use report::{RunFailure, RunReport};
