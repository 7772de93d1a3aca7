pub mod agent;
pub mod cli;
pub mod completion;
pub mod config;
pub mod error;
pub mod guidelines;
pub mod language;
pub mod lint;
pub mod logging;
pub mod prompt;
pub mod response;
pub mod tweaks;
pub mod validation;
