// Session registry module
// Issues opaque session tokens, tracks access times and evicts expired records

pub mod manager;
pub mod reaper;
pub mod storage;
pub mod types;

pub use manager::{SessionManager, SessionManagerState};
pub use reaper::Reaper;
pub use storage::{MemorySessionStorage, SessionStorage};
pub use types::{
    ExpiryBasis, IdentityUpdate, NewSession, SessionConfig, SessionIdentity, SessionRecord,
};
