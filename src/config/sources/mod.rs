//! Configuration sources, lowest precedence first: global file, explicit file, environment.

pub mod environment;
pub mod global_file;
