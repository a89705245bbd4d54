//! This crate holds the device-independent core used to drive
//! MagicHome LED controllers.
//!
//! The color model, white-channel mixing and command encoder are pure
//! functions. They turn a `LightState` into the byte frame a given
//! controller variant expects. The remaining pieces (state sync,
//! effects and the `Transport` trait) describe how a driver keeps the
//! in-memory state and the physical device in agreement.

use async_trait::async_trait;
use tokio::time::Duration;

mod types;

pub mod color;
pub mod config;
pub mod effect;
pub mod encoder;
pub mod light;
pub mod profile;
pub mod sync;
pub mod whites;

// Pull commonly used types down to the `magichome-api` namespace.

pub use config::DriverConfig;
pub use light::LightState;
pub use types::{DeviceState, Error, Rgb};

/// A specialization of `std::result::Result<>` where the error value
/// is `types::Error`.

pub type Result<T> = std::result::Result<T, Error>;

/// Defines the link between a controller and one physical device.
///
/// Implementations own whatever connection is needed to reach the
/// hardware. The controller calls these methods one at a time and in
/// the order its requests arrived, so an implementation doesn't need
/// to guard against concurrent use.

#[async_trait]
pub trait Transport: Send {
    /// Reads the device's current state. If no complete reply arrives
    /// within `timeout`, `Error::TimeoutError` is returned.
    ///
    /// Only the power state and the color channels are of interest to
    /// the core; the white channels are reported, but never fed back
    /// into `LightState`.

    async fn get_state(&mut self, timeout: Duration) -> Result<DeviceState>;

    /// Transmits one command frame. When `use_checksum` is `true`, the
    /// implementation appends the protocol's checksum byte before
    /// writing. Frames must be written atomically and in the order
    /// they were submitted.

    async fn send(&mut self, cmd: &[u8], use_checksum: bool) -> Result<()>;
}
