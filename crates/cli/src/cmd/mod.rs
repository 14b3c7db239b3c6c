mod build;
mod info;
mod machines;

pub use build::{BuildArgs, cmd_build};
pub use info::cmd_info;
pub use machines::cmd_machines;
