use std::collections::HashSet;

use mathmotion_core::{ObjectId, SceneError};

use crate::tree::ObjectTree;

/// Check the whole arena for structural correctness: parent and child links
/// agree, no object is listed twice, no cycles, every point is finite.
pub fn validate_tree(tree: &ObjectTree) -> Result<(), Vec<SceneError>> {
    let mut errors = Vec::new();

    for id in tree.ids() {
        let Ok(node) = tree.get(id) else { continue };

        if let Some(parent) = node.parent() {
            match tree.get(parent) {
                Ok(p) if p.children().contains(&id) => {}
                Ok(_) => errors.push(SceneError::Invariant(format!(
                    "{} names {} as parent but is not among its children",
                    id, parent
                ))),
                Err(_) => errors.push(SceneError::Invariant(format!(
                    "{} has a dangling parent {}",
                    id, parent
                ))),
            }
        }

        let mut seen = HashSet::new();
        for child in node.children() {
            if !seen.insert(*child) {
                errors.push(SceneError::Invariant(format!(
                    "{} lists {} twice",
                    id, child
                )));
            }
            match tree.get(*child) {
                Ok(c) if c.parent() == Some(id) => {}
                Ok(_) => errors.push(SceneError::Invariant(format!(
                    "{} lists {} as a child it does not own",
                    id, child
                ))),
                Err(_) => errors.push(SceneError::Invariant(format!(
                    "{} has a dangling child {}",
                    id, child
                ))),
            }
        }

        if on_cycle(tree, id) {
            errors.push(SceneError::Invariant(format!("{} is its own ancestor", id)));
        }

        if node.state.points.iter().any(|p| !p.is_finite()) {
            errors.push(SceneError::Invariant(format!(
                "{} has non-finite points",
                id
            )));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn on_cycle(tree: &ObjectTree, id: ObjectId) -> bool {
    let mut visited = HashSet::new();
    let mut current = tree.get(id).ok().and_then(|n| n.parent());
    while let Some(node) = current {
        if node == id || !visited.insert(node) {
            return node == id;
        }
        current = tree.get(node).ok().and_then(|n| n.parent());
    }
    false
}
