use crate::config::OutlineSettings;
use crate::scene::{NodeHandle, Scene};

/// Nodes drawn with an edge highlight.
///
/// Purely presentational: nothing here writes to the scene. The selected node,
/// if any, is always part of the outlined set.
#[derive(Debug, Clone, Default)]
pub struct OutlineSelection {
    objects: Vec<NodeHandle>,
    selected: Option<NodeHandle>,
    pub settings: OutlineSettings,
}

impl OutlineSelection {
    #[must_use]
    pub fn new(settings: OutlineSettings) -> Self {
        Self {
            objects: Vec::new(),
            selected: None,
            settings,
        }
    }

    pub fn add(&mut self, node: NodeHandle) {
        if !self.objects.contains(&node) {
            self.objects.push(node);
        }
    }

    pub fn remove(&mut self, node: NodeHandle) {
        self.objects.retain(|&n| n != node);
        if self.selected == Some(node) {
            self.selected = None;
        }
    }

    pub fn clear(&mut self) {
        self.objects.clear();
        self.selected = None;
    }

    /// Replaces the selection. The previous selection leaves the outline.
    pub fn set_selected(&mut self, node: Option<NodeHandle>) {
        if let Some(previous) = self.selected.take() {
            self.objects.retain(|&n| n != previous);
        }
        if let Some(node) = node {
            self.add(node);
        }
        self.selected = node;
    }

    #[inline]
    #[must_use]
    pub fn selected(&self) -> Option<NodeHandle> {
        self.selected
    }

    /// Nodes to highlight, or nothing while the pass is disabled.
    #[must_use]
    pub fn outlined(&self) -> &[NodeHandle] {
        if self.settings.enabled { &self.objects } else { &[] }
    }

    /// Drops nodes no longer in `scene`.
    pub fn prune(&mut self, scene: &Scene) {
        self.objects.retain(|&n| scene.contains(n));
        if self.selected.is_some_and(|n| !scene.contains(n)) {
            self.selected = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Node;

    #[test]
    fn selection_is_mirrored_into_outline() {
        let mut scene = Scene::new();
        let a = scene.add_node(Node::new("a"));
        let b = scene.add_node(Node::new("b"));

        let mut outline = OutlineSelection::new(OutlineSettings::default());
        outline.set_selected(Some(a));
        assert_eq!(outline.outlined(), &[a]);
        outline.set_selected(Some(b));
        assert_eq!(outline.outlined(), &[b]);

        scene.remove_node(b);
        outline.prune(&scene);
        assert!(outline.outlined().is_empty());
        assert_eq!(outline.selected(), None);
    }

    #[test]
    fn disabled_pass_outlines_nothing() {
        let mut scene = Scene::new();
        let a = scene.add_node(Node::new("a"));
        let mut outline = OutlineSelection::new(OutlineSettings { enabled: false, ..Default::default() });
        outline.add(a);
        assert!(outline.outlined().is_empty());
    }
}
