#![forbid(unsafe_code)]

pub mod statusline;
pub mod table;
