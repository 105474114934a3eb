// src/config/mod.rs
pub mod ai;
pub mod apps;
