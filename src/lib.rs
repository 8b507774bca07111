pub mod boundary;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod git;
pub mod manifest;
pub mod plan;
pub mod report;
pub mod state;
pub mod ui;

pub use error::{RelsyncError, Result};
