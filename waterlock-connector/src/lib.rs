//! A Rust library that delivers the Water Lock command from a wearable to its
//! paired companion device.
//!
//! The crate models the peer connection manager of the Water Lock feature: it
//! discovers companion devices, opens a logical channel to them and writes one
//! fire-and-forget command. Two interchangeable backends implement the same
//! [`link::WaterLockLink`] contract and are selected by configuration.
//!
//! # Key Components
//!
//! *   [`messaging::MessagingLink`]: The generic messaging path. Lists connected
//!     nodes and sends a short message to each of them on a fixed path.
//! *   [`accessory::AccessoryLink`]: The vendor accessory path. Checks that the
//!     accessory service is installed and forwards taps to the [`agent::AccessoryAgent`],
//!     the single task that owns the socket to the companion.
//! *   [`controller::WaterLockController`]: Runs one background task per tap and
//!     reports the outcome as a transient [`controller::StatusMessage`].
//! *   [`sim::SimulatedCompanion`]: An in-memory companion implementing every
//!     platform seam, used by the application shell and by tests.
pub mod accessory;
/// The accessory agent actor and its handle.
pub mod agent;
pub mod command;
/// Defines configuration structures for the connector.
pub mod config;
pub mod controller;
/// The error taxonomy shared by both backends.
pub mod error;
/// Callback events emitted by the vendor accessory framework.
pub mod events;
/// The `WaterLockLink` contract and backend selection.
pub mod link;
pub mod messaging;
pub mod peer;
/// Outcome of a single tap.
pub mod report;
pub mod sim;
/// The pure peer connection state machine.
pub mod state;
/// Traits abstracting the platform and vendor collaborators.
pub mod transport;

pub use error::LinkError;
pub use link::WaterLockLink;
