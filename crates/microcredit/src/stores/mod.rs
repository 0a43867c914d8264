//! [`RecordStore`](crate::proposals::RecordStore) adapters: in-memory, JSON file cache, and
//! the remote HTTP store of record.

pub mod local;
pub mod memory;
pub mod remote;

pub use local::LocalFileStore;
pub use memory::MemoryStore;
pub use remote::RemoteHttpStore;
