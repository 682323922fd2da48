/// Media download coordination - Gateway

mod coordinator;

pub use coordinator::{DownloadCoordinator, MediaDownloader, MediaRequest};
