pub mod config;
pub mod exec;
pub mod init;
pub mod serve;
pub mod shell;
