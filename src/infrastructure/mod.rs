// Core infrastructure modules
pub mod cache_layer;      // L1 LRU + persistent L2 snapshot cache
pub mod mutation_queue;   // Per-id FIFO of in-flight mutations
pub mod remote_client;    // HTTP client for the page service
pub mod snapshot;         // Cached page snapshot and pending edits
pub mod sqlite_database;  // SQLite snapshot backend
pub mod traits;           // Collaborator and storage traits

pub use cache_layer::{MemorySnapshotBackend, SnapshotCache, SnapshotCacheConfig};
pub use mutation_queue::{MutationQueue, MutationTurn};
pub use remote_client::RemoteClient;
pub use snapshot::{CacheSnapshot, EditState, PendingEdit};
pub use sqlite_database::SqliteSnapshotBackend;
pub use traits::{
    CredentialProvider, Navigator, NoopNavigator, Notice, NoticeLevel, Notifier, PageRemote, SnapshotBackend,
    StaticCredentials, TracingNotifier,
};
