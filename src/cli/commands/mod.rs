//! Command handlers, one module per subcommand

pub mod config;
pub mod init;
pub mod reset;
pub mod run;
pub mod status;
