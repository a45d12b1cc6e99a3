// Command line interface

mod args;

pub use args::{BackendArgs, Cli, Mode, RunArgs, SmokeArgs, TargetArgs};
