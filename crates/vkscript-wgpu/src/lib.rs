//! Script runner on top of wgpu
//!
//! Negotiates the requirements of loaded scripts against the available adapters and
//! runs them through an [`Executor`], which keeps the device context and framebuffer
//! alive across scripts for as long as they stay compatible.
//!
//! The caching policy lives in [`executor`] and is independent of wgpu; the
//! [`wgpu_backend`] module implements its [`Backend`] trait.

pub mod config;
pub mod executor;
pub mod wgpu_backend;

pub use config::RunnerConfig;
pub use executor::{Backend, CacheDecision, Executor, ResourceState, Resources};
pub use wgpu_backend::{ExternalDevice, WgpuBackend, WgpuError, render_all};
