//! Remote control and now-playing polling for Zidoo media players.
//!
//! [`ZidooClient`] talks to one player over its HTTP/JSON API on port 9529.
//! [`PollCoordinator`] drives a client on an adaptive schedule and publishes
//! [`PlayerSnapshot`]s and [`ZidooEvent`]s.
//!
//! # Logging
//!
//! This library uses the `tracing` crate for logging. To enable logs, you'll need to
//! initialize a tracing subscriber in your application.
//!
//! Example using `tracing_subscriber`:
//! ```no_run
//! use tracing::Level;
//! use tracing_subscriber::FmtSubscriber;
//!
//! // Create a subscriber with the desired log level
//! let subscriber = FmtSubscriber::builder()
//!     .with_max_level(Level::DEBUG) // Set to DEBUG, INFO, WARN, or ERROR
//!     .finish();
//!
//! // Initialize the global subscriber
//! tracing::subscriber::set_global_default(subscriber)
//!     .expect("Failed to set tracing subscriber");
//! ```
//!
//! The log levels control what information is displayed:
//! - `TRACE`: Shows all logs, including every request attempt
//! - `DEBUG`: Shows request failures, catalog lookups and interval changes
//! - `INFO`: Shows connects, disconnects and player state changes
//! - `WARN`: Shows retries and busy responses
//!
//! # Example
//!
//! ```no_run
//! use zidoo_rc::{PollCoordinator, PollSettings, ZidooClient, ZidooConfig};
//!
//! # async fn run() -> Result<(), zidoo_rc::ZidooError> {
//! let client = ZidooClient::new(ZidooConfig::new("192.168.1.50"))?;
//! let handle = PollCoordinator::new(client, PollSettings::default()).spawn();
//!
//! let mut snapshots = handle.subscribe_snapshots();
//! while snapshots.changed().await.is_ok() {
//!     let snapshot = snapshots.borrow().clone();
//!     println!("{:?}: {:?}", snapshot.state, snapshot.record.media_title());
//! }
//! handle.shutdown().await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub use client::{MusicCategory, ZidooClient};
pub mod commands;
pub use commands::RemoteKey;
pub mod config;
pub use config::ZidooConfig;
pub mod coordinator;
pub use coordinator::{CoordinatorHandle, PollCoordinator, PollSettings, PollState};
mod error;
pub use error::ZidooError;
pub mod events;
pub use events::{LifecycleState, MediaType, PlayerSnapshot, PowerState, ZidooEvent};
pub mod executor;
pub use executor::{CallClass, DeviceRequest, RequestExecutor, RetryPolicy, Timeouts};
pub mod identity;
pub use identity::{ExternalIds, IdentityCache, MediaIdentity, MediaKind};
pub mod models;
pub use models::{OutputOption, SystemInfo};
pub mod playback;
pub use playback::{
    Extensions, MusicExtensions, MusicSchema, PlaybackRecord, PlaybackResolver, PlaybackSource,
    TrackState, VideoExtensions,
};
pub mod session;
pub use session::DeviceSession;
pub mod settings;
pub mod transport;
pub use transport::{HttpTransport, OutgoingRequest, RawResponse, Transport};
mod utils;
pub use utils::{parse_mac, zidoo_parse};
pub mod wol;
