//! Types shared between the cutover workflow core and its front ends.

pub mod domain;
pub mod error;
pub mod protocol;
