//! Demonstration scenes.
//!
//! Each scene exercises a different corner of the engine: deferred
//! animation of transformation methods, cross-fades, nonlinear maps of
//! coordinate grids, and glyph-level matching between equations.

use std::f64::consts::{FRAC_PI_2, PI, TAU};

use mathmotion_core::math::{Complex, Point3, DOWN, LEFT, RIGHT, UP, UR};
use mathmotion_core::{ObjectId, SceneResult};
use mathmotion_scene::{
    lagged_start, Animation, Construct, Deferred, Fade, ObjectOps, Scene, ShapeBuilder, Style,
    TransformMatchingStrings,
};

/// Every built-in scene, in presentation order.
pub fn all_scenes() -> Vec<Box<dyn Construct>> {
    vec![
        Box::new(OpeningExample),
        Box::new(AnimatingMethods),
        Box::new(TexTransformExample),
    ]
}

/// Look up a scene by name, ignoring ASCII case.
pub fn find_scene(name: &str) -> Option<Box<dyn Construct>> {
    all_scenes()
        .into_iter()
        .find(|scene| scene.name().eq_ignore_ascii_case(name))
}

/// Play one beat animating `id` toward whatever `edit` does to it.
fn play_animated(
    scene: &mut Scene,
    id: ObjectId,
    run_time: Option<f64>,
    edit: impl FnOnce(&mut Deferred),
) -> SceneResult<()> {
    let mut proxy = scene.animate(id)?;
    edit(&mut proxy);
    if let Some(seconds) = run_time {
        proxy.run_time(seconds);
    }
    let animation = proxy.build(scene.tree())?;
    scene.play([animation])
}

/// Functions as transformations of the plane: a shear, then `z -> z^2`.
pub struct OpeningExample;

impl Construct for OpeningExample {
    fn name(&self) -> &str {
        "OpeningExample"
    }

    fn construct(&self, scene: &mut Scene) -> SceneResult<()> {
        let config = scene.config();
        let edge_buff = config.spacing.med_large_buff;

        let intro = scene.text(
            "The original motivation for manim was to\n\
             better illustrate mathematical functions\n\
             as transformations.",
            Style::default(),
        );
        scene.object_mut(intro)?.to_edge(UP, edge_buff);
        scene.play([Animation::create(scene.tree(), intro)?])?;
        scene.wait_for(2.0)?;

        // Linear transform
        let grid = ShapeBuilder::number_plane((-10, 10), (-5, 5), 2).build(scene.tree_mut());
        let matrix = [[1.0, 1.0], [0.0, 1.0]];
        let words = [
            scene.text("This is what the matrix", Style::default()),
            scene.text("[1 1; 0 1]", Style::default()),
            scene.text("looks like", Style::default()),
        ];
        let caption = scene.tree_mut().add_group(&words)?;
        scene.tree_mut().arrange(caption, RIGHT, config.spacing.med_small_buff)?;
        scene.object_mut(caption)?.to_edge(UP, edge_buff);

        let mut beat = vec![Animation::create(scene.tree(), grid)?];
        beat.extend(Animation::fade_transform(scene.tree(), intro, caption)?);
        scene.play(beat)?;
        scene.wait()?;
        play_animated(scene, grid, Some(3.0), |p| {
            p.apply_matrix(matrix);
        })?;
        scene.wait()?;

        // Complex map
        let c_grid = ShapeBuilder::number_plane((-8, 8), (-4, 4), 2).build(scene.tree_mut());
        let moving = scene.tree_mut().copy(c_grid)?;
        scene.object_mut(moving)?.prepare_for_nonlinear_transform(4);
        scene
            .object_mut(c_grid)?
            .set_stroke(config.color("BLUE_E")?, 1.0);
        let map_words = scene.text(
            "Or thinking of the plane as C,\nthis is the map z -> z^2",
            Style::default(),
        );
        scene.object_mut(map_words)?.to_corner(UR, edge_buff);

        let mut beat = vec![
            Animation::fade_out(scene.tree(), grid, Fade::default())?,
            Animation::create(scene.tree(), c_grid)?.with_run_time(3.0),
            Animation::fade_in(scene.tree(), moving, Fade::default())?,
        ];
        beat.extend(Animation::fade_transform(scene.tree(), caption, map_words)?);
        scene.play(beat)?;
        scene.wait()?;
        play_animated(scene, moving, Some(6.0), |p| {
            p.apply_complex_function(|z| z.powi(2));
        })?;
        scene.wait_for(2.0)
    }
}

/// Any method applied through `animate` becomes an animation.
pub struct AnimatingMethods;

impl Construct for AnimatingMethods {
    fn name(&self) -> &str {
        "AnimatingMethods"
    }

    fn construct(&self, scene: &mut Scene) -> SceneResult<()> {
        let config = scene.config();
        let pi = scene.text("π", Style::default());
        let grid = scene.tree_mut().get_grid(pi, 10, 10, 4.0)?;
        scene.add(&[grid])?;

        play_animated(scene, grid, None, |p| {
            p.shift(LEFT);
        })?;

        let yellow = config.color("YELLOW")?;
        play_animated(scene, grid, None, |p| {
            p.set_color(yellow);
        })?;
        scene.wait()?;

        let stops = [config.color("BLUE")?, config.color("GREEN")?];
        play_animated(scene, grid, None, |p| {
            p.set_submobject_colors_by_gradient(&stops);
        })?;
        scene.wait()?;

        let height = TAU - config.spacing.med_small_buff;
        play_animated(scene, grid, None, |p| {
            p.set_height(height);
        })?;
        scene.wait()?;

        play_animated(scene, grid, Some(5.0), |p| {
            p.apply_complex_function(Complex::exp);
        })?;
        scene.wait()?;

        play_animated(scene, grid, Some(5.0), |p| {
            p.apply_function(|q| {
                Point3::new(q.x + 0.5 * q.y.sin(), q.y + 0.5 * q.x.sin(), q.z)
            });
        })?;
        scene.wait()
    }
}

/// Rearranging an equation one step at a time.
pub struct TexTransformExample;

impl Construct for TexTransformExample {
    fn name(&self) -> &str {
        "TexTransformExample"
    }

    fn construct(&self, scene: &mut Scene) -> SceneResult<()> {
        let config = scene.config();
        let style = Style::default()
            .with_font_size(72.0)
            .with_color("A", config.color("BLUE")?)
            .with_color("B", config.color("TEAL")?)
            .with_color("C", config.color("GREEN")?);

        let lines = [
            scene.text("A^2 + B^2 = C^2", style.clone()),
            scene.text("A^2 = C^2 - B^2", style.clone()),
            scene.text("A^2 = (C + B)(C - B)", style.clone()),
            scene.text("A = \\sqrt{(C + B)(C - B)}", style),
        ];
        let column = scene.tree_mut().add_group(&lines)?;
        scene
            .tree_mut()
            .arrange(column, DOWN, config.spacing.large_buff)?;
        // Lines go on stage one by one, so they cannot stay in the column.
        for line in lines {
            scene.tree_mut().remove_child(column, line)?;
        }

        scene.add(&[lines[0]])?;
        let source = scene.tree_mut().copy(lines[0])?;
        let step = TransformMatchingStrings::new(source, lines[1])
            .matched_keys(["A^2", "B^2", "C^2"])
            .key_map([("+", "-")])
            .path_arc(FRAC_PI_2)
            .build(scene.tree())?;
        scene.play(step)?;
        scene.wait()?;

        let source = scene.tree_mut().copy(lines[1])?;
        let step = TransformMatchingStrings::new(source, lines[2])
            .matched_keys(["A^2"])
            .build(scene.tree())?;
        scene.play(step)?;
        scene.wait()?;

        let source = scene.tree_mut().copy(lines[2])?;
        let step = TransformMatchingStrings::new(source, lines[3])
            .key_map([("2", "\\sqrt")])
            .path_arc(-PI / 6.0)
            .build(scene.tree())?;
        scene.play(step)?;
        scene.wait_for(2.0)?;

        let fades = lines
            .iter()
            .map(|line| Animation::fade_out(scene.tree(), *line, Fade::shift(RIGHT * 2.0)))
            .collect::<SceneResult<Vec<_>>>()?;
        scene.play(lagged_start(fades, 0.05))
    }
}
