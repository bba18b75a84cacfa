pub mod common;
mod webhook_tests;
