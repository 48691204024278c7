// ── User preferences ──
//
// Preference bundle persistence: local storage, the remote store, and the
// sync manager that reconciles the two.

mod local;
mod remote;
mod sync;

pub use local::{JsonFileStore, LocalStore, MemoryStore};
pub use remote::{PreferenceBackend, RemoteBundle, RemotePrefs};
pub use sync::PreferenceSync;
