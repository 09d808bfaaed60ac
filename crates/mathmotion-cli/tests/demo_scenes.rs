use mathmotion_cli::all_scenes;
use mathmotion_scene::{validate_tree, RecordingSink, Scene};

#[test]
fn test_all_demo_scenes_complete() {
    for construct in all_scenes() {
        let sink = RecordingSink::new();
        let mut scene = Scene::new().with_sink(sink.clone());
        let status = scene.run(construct.as_ref());
        assert_eq!(status.to_string(), "ok", "{} failed: {:?}", construct.name(), status);
        assert!(!sink.is_empty());
        assert!(validate_tree(scene.tree()).is_ok());
    }
}

#[test]
fn test_tex_transform_leaves_stage_empty() {
    let construct = mathmotion_cli::find_scene("TexTransformExample").unwrap();
    let mut scene = Scene::new();
    assert!(scene.run(construct.as_ref()).is_ok());
    let stage = scene.tree().children(scene.stage()).unwrap();
    assert!(stage.is_empty());
    // 3 transforms, 3 waits and the closing fade.
    assert_eq!(scene.timeline().history().len(), 7);
}

#[test]
fn test_opening_subdivides_the_mapped_plane() {
    let construct = mathmotion_cli::find_scene("OpeningExample").unwrap();
    let mut scene = Scene::new();
    assert!(scene.run(construct.as_ref()).is_ok());
    let tree = scene.tree();
    // Both 17 x 9 planes stay on stage; the one mapped by z^2 is finer.
    let mut first_lines: Vec<usize> = tree
        .children(scene.stage())
        .unwrap()
        .iter()
        .filter_map(|id| {
            let lines = tree.children(*id).ok()?;
            (lines.len() == 17 + 9).then(|| tree.get(lines[0]).ok().map(|n| n.state.points.len()))?
        })
        .collect();
    first_lines.sort();
    assert_eq!(first_lines, vec![17, 65]);
}
