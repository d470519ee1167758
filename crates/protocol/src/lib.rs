//! Wire types shared by the roost daemon and the control client.
//!
//! Everything that crosses the loopback HTTP boundary lives here: the
//! response envelope, per-endpoint request/response payloads, telemetry
//! entries, the session descriptor file, and persisted storage state.

pub mod command;
pub mod descriptor;
pub mod envelope;
pub mod storage;
pub mod telemetry;

pub use command::*;
pub use descriptor::SessionDescriptor;
pub use envelope::{Envelope, ErrorBody, ErrorCode};
pub use storage::{Cookie, LocalStorageEntry, OriginState, SameSite, StorageState};
pub use telemetry::{
	ConsoleEntry, ConsoleKind, NetworkRequestEntry, NetworkResponseEntry, PageErrorEntry,
	PageErrorKind,
};
