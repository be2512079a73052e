mod config;
mod error;
mod gate;
mod registry;
mod start;

pub use {config::*, error::*, gate::check_resume, registry::*, start::*};

pub(crate) use gate::{catch_up_gate, sanity_gate};
