//! Asset pipeline: model sources, collaborator I/O, staging and decoding.

pub mod io;
pub mod loader;
pub mod loaders;
pub mod prefab;
pub mod source;
pub mod staging;

pub use io::{ConversionService, HttpConversionService, HttpStorageClient, StorageClient};
pub use loader::{
    ConversionPolicy, LoadState, LoadTicket, LoadTracker, LoadedModel, ModelLoader, normalize_model,
};
pub use prefab::{Prefab, PrefabMesh, PrefabNode};
pub use source::{LocalFile, ModelFormat, ModelSource};
pub use staging::{StagedBlob, StagingArea};
