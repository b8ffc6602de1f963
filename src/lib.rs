// src/lib.rs
//! Gamepad remote control for Xiaomi smart fans.
//!
//! The binary logs in to the cloud account, picks an online fan, and maps
//! controller input to guarded fan commands. The cloud service, the fan RPC
//! endpoint and the input device are all reached through traits; the
//! [`simulator`] module provides in-process implementations of the first two.

pub mod auth;
pub mod cipher;
pub mod config;
pub mod credentials;
pub mod devices;
pub mod dispatch;
pub mod error;
pub mod fan;
pub mod input;
pub mod output;
pub mod simulator;
pub mod storage;

pub use error::{FanPadError, Result};
