pub mod config;
pub mod init;
pub mod matching;
pub mod serve;
pub mod targets;
