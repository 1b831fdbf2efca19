#![doc = include_str!("../readme.md")]

pub mod config;
pub mod detector;
pub mod error;
pub mod history;
pub mod host;
pub mod load_model;
pub mod math;
pub mod prediction;
pub mod vm;
