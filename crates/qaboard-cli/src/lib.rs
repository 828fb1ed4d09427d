#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

//! HTTP surface of qaboard, shared by the `serve` command and integration tests.

pub mod server;
