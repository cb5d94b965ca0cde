pub mod config;
pub mod dispatch;
pub mod error;
pub mod grammar;
pub mod history;
pub mod interpreter;
pub mod io;
pub mod job;
pub mod log;
pub mod paths;
pub mod session;
pub mod tabs;

pub use error::{NorthfallError, Result};
