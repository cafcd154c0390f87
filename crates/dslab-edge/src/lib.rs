#![doc = include_str!("../readme.md")]

pub mod capacity;
pub mod cloud;
pub mod common;
pub mod config;
pub mod environment;
pub mod error;
pub mod logger;
pub mod orchestrator;
pub mod state;
pub mod task;
pub mod tier_selector;
pub mod vm;
pub mod vm_selection_policies;
pub mod vm_selection_policy;
