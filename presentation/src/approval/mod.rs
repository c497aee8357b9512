//! Interactive approval adapter

pub mod interactive;
