//! Client-side video library: a local collection mirroring the server, kept
//! current by pushed status events and projected through a search view.

pub mod collection;
pub mod dashboard;
pub mod error;
pub mod live;
pub mod models;
pub mod query;
pub mod transport;

pub use collection::MediaCollection;
pub use dashboard::{Change, Dashboard, WatchEnd, refresh_every};
pub use error::{LiveUpdateError, SyncError};
pub use live::{LiveUpdateSource, SocketIoChannel, Subscription};
pub use models::{MediaItem, MediaStatus, StatusEvent};
pub use query::{QueryState, QueryView, SortKey, StatusFilter, ViewResult};
pub use transport::{HttpMediaTransport, MediaTransport};
