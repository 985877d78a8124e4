//! Editor Layer
//!
//! Interactive editing on top of the scene graph:
//!
//! - [`EditorSession`]: owns one mounted [`Viewport`] and all UI-facing state
//! - [`Viewport`]: default scene, camera, orbit/gizmo controls, render loop
//! - [`Raycaster`]: pointer picking
//! - [`TransformControls`]: the translate/rotate/scale gizmo
//! - [`apply_material_params`] and [`SkinSet`]: material panel
//! - [`export_subtree`]: glTF/GLB export
//! - [`RenderBackend`] and [`MountSurface`]: the host's drawing seams

pub mod backend;
pub mod edit_mode;
pub mod exporter;
pub mod gizmo;
pub mod input;
pub mod material_sync;
pub mod orbit;
pub mod outline;
pub mod picking;
pub mod render_loop;
pub mod session;
pub mod viewport;

pub use backend::{FrameContext, HeadlessBackend, HeadlessMount, MountSurface, RenderBackend};
pub use edit_mode::EditMode;
pub use exporter::{DirectorySink, DownloadSink, ExportArtifact, export_subtree};
pub use gizmo::{DragPointer, GizmoMode, GizmoTransform, TransformControls};
pub use input::{Input, PointerButton};
pub use material_sync::{MaterialParams, SkinSet, apply_material_params};
pub use orbit::OrbitControls;
pub use outline::OutlineSelection;
pub use picking::{Intersection, Ray, Raycaster};
pub use render_loop::RenderLoop;
pub use session::{EditorSession, LoadOutcome};
pub use viewport::{Viewport, fetch_environment};
