//! Shared helpers for layer construction.

pub mod init;

pub use init::{buffer_len, linspace, uniform_noise, xavier_uniform, SimpleRng};
