//! Error types for simulation setup and the front ends.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SimError>;

/// Errors raised while configuring the simulation or bringing up a window.
/// The physics core itself never fails once constructed.
#[derive(Error, Debug)]
pub enum SimError {
  #[error("Invalid configuration: {0}")]
  InvalidConfig(String),

  #[error("Surface error: {0}")]
  Surface(String),

  #[error("No suitable graphics adapter found")]
  Adapter,

  #[error("Device request failed: {0}")]
  Device(#[from] wgpu::RequestDeviceError),

  #[error("Event loop error: {0}")]
  EventLoop(#[from] winit::error::EventLoopError),

  #[error("Window creation failed: {0}")]
  Window(#[from] winit::error::OsError),
}

impl SimError {
  pub fn invalid_config(msg: impl Into<String>) -> Self {
    SimError::InvalidConfig(msg.into())
  }
}
