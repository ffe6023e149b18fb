//! Leave balance computation and the allocation edit workflow built on it.

pub mod calculator;
pub mod editor;
pub mod period;
pub mod store;
