//! End-to-end CLI tests driving real builds through a shell fake builder.
#![cfg(unix)]

mod common;

mod build_tests;
mod gc_tests;
mod status_tests;
mod verify_tests;
