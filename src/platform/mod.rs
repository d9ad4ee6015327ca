//! Native camera backends.
//!
//! With the `native` feature, [`NativeMediaDevices`] provides the device
//! media seam over the system camera through nokhwa.

#[cfg(feature = "native")]
pub mod native;

#[cfg(feature = "native")]
pub use native::{list_devices, NativeDeviceInfo, NativeMediaDevices};
