mod config;
mod generate;
mod install;
mod plan;

pub use config::*;
pub use generate::*;
pub use install::*;
pub use plan::*;
