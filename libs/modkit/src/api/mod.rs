//! JSON API helpers.

pub mod problem;
