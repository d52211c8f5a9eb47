//! External process execution

pub mod runner;
