//! Asset loading: bundle sources, glTF decoding, and the load job

mod decode;
mod handle;
mod job;
mod source;

pub use decode::decode_bundle;
pub use handle::{AssetHandle, SceneNode};
pub use job::{AssetLoadJob, JobEvent, LoadState};
#[cfg(feature = "http")]
pub use source::HttpBundleSource;
pub use source::{BundleSource, FileBundleSource, ProgressSink};
