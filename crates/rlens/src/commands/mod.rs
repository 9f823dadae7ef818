//! Command implementations.

pub mod compare;
pub mod doctor;
pub mod report;
