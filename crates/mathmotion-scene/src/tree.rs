use std::collections::HashMap;

use mathmotion_core::math::{Point3, DOWN, RIGHT};
use mathmotion_core::{ObjectId, ObjectKind, SceneConfig, SceneError, SceneResult};

use crate::deferred::Deferred;
use crate::object::{ObjectState, Snapshot};
use crate::ops::ObjectOps;

/// One object in the tree.
#[derive(Debug, Clone)]
pub struct ObjectNode {
    pub id: ObjectId,
    pub kind: ObjectKind,
    pub state: ObjectState,
    children: Vec<ObjectId>,
    parent: Option<ObjectId>,
}

impl ObjectNode {
    pub fn children(&self) -> &[ObjectId] {
        &self.children
    }

    pub fn parent(&self) -> Option<ObjectId> {
        self.parent
    }
}

/// Arena holding every object of a scene, attached or not.
///
/// A node has at most one parent and a parent owns its children exclusively.
/// All structural edits validate first and leave the tree untouched on error.
#[derive(Debug, Clone)]
pub struct ObjectTree {
    nodes: HashMap<ObjectId, ObjectNode>,
    config: &'static SceneConfig,
}

impl Default for ObjectTree {
    fn default() -> Self {
        Self::with_config(SceneConfig::global())
    }
}

impl ObjectTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty tree whose layout operations use `config`.
    pub fn with_config(config: &'static SceneConfig) -> Self {
        Self {
            nodes: HashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &'static SceneConfig {
        self.config
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Every object id in the arena, in no particular order.
    pub fn ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.nodes.keys().copied()
    }

    /// Insert a detached, childless object.
    pub fn insert(&mut self, kind: ObjectKind, state: ObjectState) -> ObjectId {
        let id = ObjectId::new();
        self.nodes.insert(
            id,
            ObjectNode {
                id,
                kind,
                state,
                children: Vec::new(),
                parent: None,
            },
        );
        id
    }

    /// Insert a detached path through `points`.
    pub fn add_path(&mut self, points: Vec<Point3>) -> ObjectId {
        self.insert(ObjectKind::Path, ObjectState::with_points(points))
    }

    /// Create a group owning `children`, in order. Fails without changes if
    /// any child is unknown or already owned.
    pub fn add_group(&mut self, children: &[ObjectId]) -> SceneResult<ObjectId> {
        for (i, child) in children.iter().enumerate() {
            let node = self.get(*child)?;
            if let Some(parent) = node.parent {
                return Err(SceneError::AlreadyParented {
                    parent,
                    child: *child,
                });
            }
            if children[..i].contains(child) {
                return Err(SceneError::InvalidArgument(format!(
                    "{} listed twice in one group",
                    child
                )));
            }
        }
        let group = self.insert(ObjectKind::Group, ObjectState::default());
        for child in children {
            self.link(group, *child);
        }
        Ok(group)
    }

    pub fn get(&self, id: ObjectId) -> SceneResult<&ObjectNode> {
        self.nodes.get(&id).ok_or(SceneError::UnknownObject(id))
    }

    fn get_mut(&mut self, id: ObjectId) -> SceneResult<&mut ObjectNode> {
        self.nodes.get_mut(&id).ok_or(SceneError::UnknownObject(id))
    }

    pub fn parent(&self, id: ObjectId) -> SceneResult<Option<ObjectId>> {
        Ok(self.get(id)?.parent)
    }

    pub fn children(&self, id: ObjectId) -> SceneResult<&[ObjectId]> {
        Ok(&self.get(id)?.children)
    }

    /// True if `ancestor` is `id` itself or lies on its parent chain.
    pub fn is_ancestor(&self, ancestor: ObjectId, id: ObjectId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.nodes.get(&node).and_then(|n| n.parent);
        }
        false
    }

    /// Append `child` to `parent`'s children.
    pub fn add_child(&mut self, parent: ObjectId, child: ObjectId) -> SceneResult<()> {
        self.get(parent)?;
        let node = self.get(child)?;
        if self.is_ancestor(child, parent) {
            return Err(SceneError::Cycle { parent, child });
        }
        if let Some(owner) = node.parent {
            return Err(SceneError::AlreadyParented {
                parent: owner,
                child,
            });
        }
        self.link(parent, child);
        Ok(())
    }

    pub(crate) fn link(&mut self, parent: ObjectId, child: ObjectId) {
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.push(child);
        }
    }

    /// Detach `child` from `parent`. The child keeps its own descendants and
    /// stays in the arena until released.
    pub fn remove_child(&mut self, parent: ObjectId, child: ObjectId) -> SceneResult<()> {
        if self.get(child)?.parent != Some(parent) {
            return Err(SceneError::InvalidArgument(format!(
                "{} is not a child of {}",
                child, parent
            )));
        }
        self.get_mut(parent)?.children.retain(|c| *c != child);
        self.get_mut(child)?.parent = None;
        Ok(())
    }

    /// Drop a detached object and its whole family from the arena.
    pub fn release(&mut self, id: ObjectId) -> SceneResult<()> {
        if let Some(parent) = self.get(id)?.parent {
            return Err(SceneError::AlreadyParented { parent, child: id });
        }
        for member in self.family(id)? {
            self.nodes.remove(&member);
        }
        Ok(())
    }

    /// `id` and all its descendants, depth-first, parents before children.
    pub fn family(&self, id: ObjectId) -> SceneResult<Vec<ObjectId>> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let node = self.get(current)?;
            out.push(current);
            stack.extend(node.children.iter().rev());
        }
        Ok(out)
    }

    /// Detached copy of the family's current state.
    pub fn snapshot(&self, id: ObjectId) -> SceneResult<Snapshot> {
        let node = self.get(id)?;
        Ok(Snapshot {
            id,
            kind: node.kind.clone(),
            state: node.state.clone(),
            children: node
                .children
                .iter()
                .map(|c| self.snapshot(*c))
                .collect::<SceneResult<_>>()?,
        })
    }

    /// Materialize `snapshot` as a new detached family with fresh identities.
    pub fn instantiate(&mut self, snapshot: &Snapshot) -> ObjectId {
        let id = self.insert(snapshot.kind.clone(), snapshot.state.clone());
        for child in &snapshot.children {
            let child_id = self.instantiate(child);
            self.link(id, child_id);
        }
        id
    }

    /// Deep, independent, detached clone of `id`'s family.
    pub fn copy(&mut self, id: ObjectId) -> SceneResult<ObjectId> {
        let snapshot = self.snapshot(id)?;
        Ok(self.instantiate(&snapshot))
    }

    /// Overwrite the family's states from `snapshot`. The snapshot must have
    /// the same child structure as the live family; nothing is written otherwise.
    pub fn restore(&mut self, id: ObjectId, snapshot: &Snapshot) -> SceneResult<()> {
        self.check_structure(id, snapshot)?;
        self.write_back(id, snapshot);
        Ok(())
    }

    /// Fail unless the live family under `id` has `snapshot`'s child structure.
    pub fn check_structure(&self, id: ObjectId, snapshot: &Snapshot) -> SceneResult<()> {
        let node = self.get(id)?;
        if node.children.len() != snapshot.children.len() {
            return Err(SceneError::incompatible(format!(
                "{} has {} children, state has {}",
                id,
                node.children.len(),
                snapshot.children.len()
            )));
        }
        for (child, snap) in node.children.iter().zip(&snapshot.children) {
            self.check_structure(*child, snap)?;
        }
        Ok(())
    }

    fn write_back(&mut self, id: ObjectId, snapshot: &Snapshot) {
        let children = match self.nodes.get_mut(&id) {
            Some(node) => {
                node.state = snapshot.state.clone();
                node.children.clone()
            }
            None => return,
        };
        for (child, snap) in children.iter().zip(&snapshot.children) {
            self.write_back(*child, snap);
        }
    }

    /// Live handle exposing the transformation operations on `id`.
    pub fn object_mut(&mut self, id: ObjectId) -> SceneResult<ObjectMut<'_>> {
        self.get(id)?;
        Ok(ObjectMut { tree: self, id })
    }

    /// Start a deferred mutation of `id`.
    pub fn animate(&self, id: ObjectId) -> SceneResult<Deferred> {
        Deferred::new(self, id)
    }

    /// Lay out `id`'s children along `direction` with `buff` between them.
    pub fn arrange(&mut self, id: ObjectId, direction: Point3, buff: f64) -> SceneResult<()> {
        self.object_mut(id)?.arrange(direction, buff);
        Ok(())
    }

    /// A detached group of `rows * cols` copies of `id`, laid out row by row
    /// around `id`'s center and scaled to `height`.
    pub fn get_grid(
        &mut self,
        id: ObjectId,
        rows: usize,
        cols: usize,
        height: f64,
    ) -> SceneResult<ObjectId> {
        if rows == 0 || cols == 0 {
            return Err(SceneError::InvalidArgument(
                "grid needs at least one row and one column".into(),
            ));
        }
        let template = self.snapshot(id)?;
        let (w, h) = template
            .bounds()
            .map(|b| (b.width(), b.height()))
            .unwrap_or((0.0, 0.0));
        let buff = self.config.spacing.med_small_buff;

        let mut cells = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for c in 0..cols {
                let mut cell = template.clone();
                cell.shift(RIGHT * (c as f64 * (w + buff)) + DOWN * (r as f64 * (h + buff)));
                cells.push(self.instantiate(&cell));
            }
        }
        let grid = self.add_group(&cells)?;
        self.object_mut(grid)?
            .move_to(template.center())
            .set_height(height);
        Ok(grid)
    }
}

/// Mutable handle to a live object. Mutations are visible immediately to
/// every holder of the id.
pub struct ObjectMut<'a> {
    tree: &'a mut ObjectTree,
    id: ObjectId,
}

impl ObjectMut<'_> {
    pub fn id(&self) -> ObjectId {
        self.id
    }
}

impl ObjectOps for ObjectMut<'_> {
    fn edit<F: FnOnce(&mut Snapshot)>(&mut self, f: F) -> &mut Self {
        if let Ok(mut snapshot) = self.tree.snapshot(self.id) {
            f(&mut snapshot);
            self.tree.write_back(self.id, &snapshot);
        }
        self
    }

    fn config(&self) -> &SceneConfig {
        self.tree.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mathmotion_core::math::{ORIGIN, UP};

    fn unit_square(tree: &mut ObjectTree) -> ObjectId {
        tree.add_path(vec![
            Point3::new(-0.5, -0.5, 0.0),
            Point3::new(0.5, -0.5, 0.0),
            Point3::new(0.5, 0.5, 0.0),
            Point3::new(-0.5, 0.5, 0.0),
            Point3::new(-0.5, -0.5, 0.0),
        ])
    }

    #[test]
    fn test_add_child_preserves_order() {
        let mut tree = ObjectTree::new();
        let root = tree.insert(ObjectKind::Group, ObjectState::default());
        let a = unit_square(&mut tree);
        let b = unit_square(&mut tree);
        tree.add_child(root, a).unwrap();
        tree.add_child(root, b).unwrap();
        assert_eq!(tree.children(root).unwrap(), &[a, b]);
        assert_eq!(tree.parent(b).unwrap(), Some(root));
    }

    #[test]
    fn test_cycle_rejected_and_tree_unchanged() {
        let mut tree = ObjectTree::new();
        let a = tree.insert(ObjectKind::Group, ObjectState::default());
        let b = tree.insert(ObjectKind::Group, ObjectState::default());
        tree.add_child(a, b).unwrap();
        let err = tree.add_child(b, a).unwrap_err();
        assert!(matches!(err, SceneError::Cycle { .. }));
        assert_eq!(tree.children(a).unwrap(), &[b]);
        assert!(tree.children(b).unwrap().is_empty());
        assert_eq!(tree.parent(a).unwrap(), None);

        assert!(matches!(tree.add_child(a, a), Err(SceneError::Cycle { .. })));
    }

    #[test]
    fn test_single_owner() {
        let mut tree = ObjectTree::new();
        let a = tree.insert(ObjectKind::Group, ObjectState::default());
        let b = tree.insert(ObjectKind::Group, ObjectState::default());
        let c = unit_square(&mut tree);
        tree.add_child(a, c).unwrap();
        assert!(matches!(
            tree.add_child(b, c),
            Err(SceneError::AlreadyParented { .. })
        ));
        tree.remove_child(a, c).unwrap();
        tree.add_child(b, c).unwrap();
        assert_eq!(tree.parent(c).unwrap(), Some(b));
    }

    #[test]
    fn test_remove_child_keeps_descendants() {
        let mut tree = ObjectTree::new();
        let root = tree.insert(ObjectKind::Group, ObjectState::default());
        let leaf = unit_square(&mut tree);
        let group = tree.add_group(&[leaf]).unwrap();
        tree.add_child(root, group).unwrap();
        tree.remove_child(root, group).unwrap();
        assert_eq!(tree.children(group).unwrap(), &[leaf]);
        assert!(tree.remove_child(root, group).is_err());
    }

    #[test]
    fn test_release_drops_family() {
        let mut tree = ObjectTree::new();
        let leaf = unit_square(&mut tree);
        let group = tree.add_group(&[leaf]).unwrap();
        assert!(tree.release(leaf).is_err());
        tree.release(group).unwrap();
        assert!(tree.is_empty());
    }

    #[test]
    fn test_copy_is_independent() {
        let mut tree = ObjectTree::new();
        let leaf = unit_square(&mut tree);
        let group = tree.add_group(&[leaf]).unwrap();
        let copy = tree.copy(group).unwrap();
        assert_ne!(copy, group);
        assert_eq!(tree.parent(copy).unwrap(), None);
        let copied_leaf = tree.children(copy).unwrap()[0];
        assert_ne!(copied_leaf, leaf);

        let before = tree.snapshot(group).unwrap();
        tree.object_mut(copy).unwrap().shift(UP * 2.0).set_opacity(0.1);
        assert_eq!(tree.snapshot(group).unwrap(), before);
        assert_eq!(
            tree.get(copied_leaf).unwrap().state.points[0],
            Point3::new(-0.5, 1.5, 0.0)
        );
    }

    #[test]
    fn test_restore_checks_structure() {
        let mut tree = ObjectTree::new();
        let leaf = unit_square(&mut tree);
        let group = tree.add_group(&[leaf]).unwrap();
        let lone = unit_square(&mut tree);
        let lone_state = tree.snapshot(lone).unwrap();
        let err = tree.restore(group, &lone_state).unwrap_err();
        assert!(matches!(err, SceneError::IncompatibleShape(_)));
    }

    #[test]
    fn test_family_is_preorder() {
        let mut tree = ObjectTree::new();
        let a = unit_square(&mut tree);
        let b = unit_square(&mut tree);
        let inner = tree.add_group(&[a]).unwrap();
        let outer = tree.add_group(&[inner, b]).unwrap();
        assert_eq!(tree.family(outer).unwrap(), vec![outer, inner, a, b]);
    }

    #[test]
    fn test_get_grid() {
        let mut tree = ObjectTree::new();
        let cell = unit_square(&mut tree);
        let grid = tree.get_grid(cell, 3, 4, 2.0).unwrap();
        assert_eq!(tree.children(grid).unwrap().len(), 12);
        let bounds = tree.snapshot(grid).unwrap().bounds().unwrap();
        assert!((bounds.height() - 2.0).abs() < 1e-9);
        assert!((bounds.center() - ORIGIN).norm() < 1e-9);
        assert!(tree.get_grid(cell, 0, 4, 2.0).is_err());
    }

    #[test]
    fn test_unknown_object() {
        let mut tree = ObjectTree::new();
        let ghost = ObjectId::new();
        assert!(matches!(tree.snapshot(ghost), Err(SceneError::UnknownObject(_))));
        assert!(tree.object_mut(ghost).is_err());
    }
}
