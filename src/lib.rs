pub mod application;
pub mod archive;
pub mod commands;
pub mod error;
pub mod github;
pub mod http;
pub mod package;
pub mod reconcile;
pub mod runtime;
