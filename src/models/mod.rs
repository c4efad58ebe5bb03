// src/models/mod.rs
pub mod diploma;
pub mod session;
pub mod transaction;
