#![forbid(unsafe_code)]

pub mod cleanup;
pub mod ghq;
pub mod git;
pub mod naming;
pub mod siblings;
pub mod workspace;
