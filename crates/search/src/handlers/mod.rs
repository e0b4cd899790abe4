//! HTTP handlers for the tool service

pub mod health;
pub mod tools;
