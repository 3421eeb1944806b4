pub mod archive;
pub mod checksum;
pub mod cleanup;
pub mod config;
pub mod download;
pub mod error;
pub mod formula;
pub mod github;
pub mod http;
pub mod install;
pub mod platform;
pub mod release;
pub mod runtime;
