#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod assets;
pub mod config;
pub mod editor;
pub mod errors;
pub mod resources;
pub mod scene;
pub mod utils;

pub use assets::{LocalFile, ModelLoader, ModelSource};
pub use config::EditorSettings;
pub use editor::{EditMode, EditorSession, MaterialParams};
pub use errors::{EditorError, Result};
pub use resources::{Geometry, Material, MaterialKind, Mesh, Texture};
pub use scene::{Camera, Light, Node, NodeHandle, Scene};
