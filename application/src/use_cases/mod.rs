//! Use cases for the taskforce application layer

pub mod decompose;
pub mod direct_message;
pub mod run_task;
pub mod shared;
