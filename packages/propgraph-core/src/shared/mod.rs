//! Shared building blocks used across features

pub mod models;
