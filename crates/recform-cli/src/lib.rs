//! Library side of the `recform` binary: command runners, logging setup and
//! result tables.

pub mod commands;
pub mod logging;
pub mod summary;
