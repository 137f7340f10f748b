mod args;

pub use args::{Cli, Command, read_json};
