//! machbuild-lib: machine and compiler resolution for standalone library builds
//!
//! This crate provides the stages of a build run:
//! - `config`: machines and compiler settings loaded from JSON documents
//! - `machine`: explicit or detected machine identity
//! - `compiler`: default or explicit compiler, leniently validated
//! - `settings`: settings for the chosen machine/compiler pair
//! - `macros`: the generated CMake macro file
//! - `driver`: machine-specific configure/build/test drivers
//! - `pipeline`: all of the above, in order

pub mod compiler;
pub mod config;
pub mod consts;
pub mod driver;
pub mod machine;
pub mod macros;
pub mod pipeline;
pub mod platform;
pub mod settings;
pub mod util;
