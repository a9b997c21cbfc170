//! umbra note discovery
//!
//! client-side half of the protocol. a wallet does not trust an indexer to
//! tell it what it owns; it replays the pool's event history, rebuilds the
//! commitment tree locally and trial-decrypts every blob with its viewing
//! key:
//!
//! ```text
//!   chain events ──page by cursor──► scanner
//!        │                             ├─ tree mirror (root must match chain)
//!        │                             ├─ owned notes (viewing key opens blob)
//!        │                             └─ spent set  (published nullifiers)
//!        ▼
//!   spendable notes = owned ∖ spent, each with its sibling path
//! ```
//!
//! pagination and the nullifier cross-check are async and cancel-safe;
//! state up to the last acknowledged cursor survives a dropped task.

pub mod error;
pub mod mirror;
pub mod scanner;
pub mod source;

pub use error::SyncError;
pub use mirror::{MerklePath, TreeMirror};
pub use scanner::{NoteScanner, OwnedNote, ScannerSnapshot, SpendableNote};
pub use source::{Cursor, EventSource, MemoryEventIndex, SourceError};
