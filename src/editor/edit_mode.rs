use serde::{Deserialize, Serialize};

use crate::editor::gizmo::GizmoMode;

/// Toolbar edit mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditMode {
    #[default]
    None,
    Translate,
    Rotate,
    Scale,
}

impl EditMode {
    /// Result of pressing the `requested` toolbar button while in `self`.
    ///
    /// Pressing the active button returns to [`EditMode::None`].
    #[must_use]
    pub fn toggled(self, requested: EditMode) -> EditMode {
        if self == requested { EditMode::None } else { requested }
    }

    #[must_use]
    pub fn gizmo_mode(self) -> Option<GizmoMode> {
        match self {
            Self::None => None,
            Self::Translate => Some(GizmoMode::Translate),
            Self::Rotate => Some(GizmoMode::Rotate),
            Self::Scale => Some(GizmoMode::Scale),
        }
    }

    #[inline]
    #[must_use]
    pub fn is_editing(self) -> bool {
        self != Self::None
    }
}

/// Orbit navigation is allowed only with no edit mode and no drag.
#[inline]
#[must_use]
pub fn orbit_allowed(mode: EditMode, dragging: bool) -> bool {
    !mode.is_editing() && !dragging
}
