// src/contracts/mod.rs
pub mod diploma_registry;

#[cfg(test)]
pub mod mock;
