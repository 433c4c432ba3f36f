//! Headless world state driven by the frame loop.

use std::f32::consts::FRAC_PI_2;

use glam::{Quat, Vec3};

use crate::animation::AnimationMixer;
use crate::camera::{OrbitController, PerspectiveCamera};
use crate::input::InputEvent;
use crate::loader::{AssetLoader, LoadRequest, LoadedModel, PendingLoad};
use crate::options::Options;
use crate::panel::{PanelSnapshot, ParameterPanel};
use crate::scene::{
    Light, Material, MeshData, MeshInstance, Node, NodeId, Payload,
    PointLight, SceneGraph, ShadowCamera, SpotLight, Transform,
};
use crate::util::color::srgb_hex_to_linear;
use crate::util::frame_timing::FrameClock;

/// Name of the node the loaded model is grafted under.
pub const MODEL_ROOT_NAME: &str = "model";

/// Lifecycle of the one model the viewer shows.
pub enum ModelSlot {
    /// No load was requested.
    Absent,
    /// Loader still running.
    Pending(PendingLoad),
    /// Model grafted under `root`.
    Loaded {
        /// Model root node.
        root: NodeId,
    },
    /// Load failed; the scene renders without the model.
    Failed(String),
}

impl ModelSlot {
    /// Whether a load is in flight.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }
}

/// Scene, camera, controls, panel and model slot, without any GPU state.
///
/// One call to [`advance`](Self::advance) is one frame: controller update,
/// load completion check, animation step.
pub struct Stage {
    options: Options,
    scene: SceneGraph,
    camera: PerspectiveCamera,
    controller: OrbitController,
    spot_light: NodeId,
    point_light: NodeId,
    ground: Option<NodeId>,
    panel: ParameterPanel,
    model: ModelSlot,
    mixer: Option<AnimationMixer>,
    clock: FrameClock,
    frames: u64,
}

impl Stage {
    /// Build the static scene for a `width x height` viewport. No model
    /// load is started.
    pub fn new(options: Options, width: u32, height: u32) -> Self {
        let options = options.normalized();
        let mut scene = SceneGraph::new();
        let root = scene.root();

        let spot_light = add_spot_light(&mut scene, root, &options);
        let point_light = add_point_light(&mut scene, root, &options);
        let ground = options
            .ground
            .enabled
            .then(|| add_ground(&mut scene, root, &options))
            .flatten();

        let cam = &options.camera;
        let mut camera = PerspectiveCamera {
            eye: Vec3::from_array(cam.position),
            target: Vec3::from_array(cam.target),
            up: Vec3::Y,
            aspect: 1.0,
            fovy: cam.fovy,
            znear: cam.znear,
            zfar: cam.zfar,
        };
        camera.set_viewport(width, height);
        let controller =
            OrbitController::new(&options.controls, camera.target, height);
        let panel = ParameterPanel::for_point_light(point_light);

        Self {
            options,
            scene,
            camera,
            controller,
            spot_light,
            point_light,
            ground,
            panel,
            model: ModelSlot::Absent,
            mixer: None,
            clock: FrameClock::new(),
            frames: 0,
        }
    }

    /// Build the scene and start loading the configured model.
    pub fn from_options(options: Options, width: u32, height: u32) -> Self {
        let mut stage = Self::new(options, width, height);
        let request = LoadRequest::from_options(&stage.options.model);
        stage.begin_load(AssetLoader::load(request));
        stage
    }

    /// Track an in-flight load. Ignored (returns `false`) if a model is
    /// already loaded or loading.
    pub fn begin_load(&mut self, pending: PendingLoad) -> bool {
        match self.model {
            ModelSlot::Absent | ModelSlot::Failed(_) => {
                self.model = ModelSlot::Pending(pending);
                true
            }
            ModelSlot::Pending(_) | ModelSlot::Loaded { .. } => {
                log::warn!(
                    "ignoring load of {}: model already present",
                    pending.path().display()
                );
                false
            }
        }
    }

    // -- Frame --

    /// Advance by the wall-clock time since the previous tick (zero on the
    /// first). The clock is read after the controller update. Returns the
    /// delta used.
    pub fn tick(&mut self) -> f32 {
        self.controller.update(&mut self.camera);
        let delta = self.clock.tick();
        self.step(delta);
        delta
    }

    /// Advance one frame by `delta` seconds.
    pub fn advance(&mut self, delta: f32) {
        self.controller.update(&mut self.camera);
        self.step(delta);
    }

    /// Load poll and animation half of a frame.
    fn step(&mut self, delta: f32) {
        self.poll_model();
        if let Some(mixer) = &mut self.mixer {
            mixer.update(delta, &mut self.scene);
        }
        self.frames += 1;
    }

    fn poll_model(&mut self) {
        let ModelSlot::Pending(pending) = &mut self.model else {
            return;
        };
        let Some(result) = pending.try_recv() else {
            return;
        };
        self.model = match result {
            Ok(model) => self.attach_model(model),
            Err(e) => {
                log::error!("model load failed: {e}");
                ModelSlot::Failed(e.to_string())
            }
        };
    }

    /// Graft the model, place it, flag shadow casters and start the
    /// autoplay clip.
    fn attach_model(&mut self, model: LoadedModel) -> ModelSlot {
        let opts = &self.options.model;
        let root = self.scene.root();
        let triangles = model.triangle_count();
        let Some(inst) = model.instantiate(&mut self.scene, root, MODEL_ROOT_NAME)
        else {
            return ModelSlot::Failed("could not graft model".into());
        };

        if let Some(node) = self.scene.get_mut(inst.root) {
            node.transform = Transform {
                position: Vec3::from_array(opts.position),
                rotation: Quat::from_rotation_y(opts.rotation_y),
                scale: Vec3::splat(opts.scale),
            };
        }
        let cast_shadow = opts.cast_shadow;
        self.scene.for_each_mut(inst.root, |_, node| {
            if let Some(mesh) = node.mesh_mut() {
                mesh.cast_shadow = cast_shadow;
            }
        });

        log::info!(
            "model attached: {} nodes, {} triangles, {} clips",
            inst.nodes.len(),
            triangles,
            inst.mixer.clips().len()
        );

        // Static models get no mixer.
        let mut mixer = inst.mixer;
        if mixer.clips().is_empty() {
            return ModelSlot::Loaded { root: inst.root };
        }
        if let Some(index) = opts.autoplay_clip {
            match mixer.clip_action(index) {
                Some(action) => {
                    action.play();
                }
                None => log::debug!("model has no clip {index}"),
            }
        }
        self.mixer = Some(mixer);
        ModelSlot::Loaded { root: inst.root }
    }

    // -- Input / viewport --

    /// Route a pointer event to the orbit controller.
    pub fn handle_input(&mut self, event: InputEvent) {
        match event {
            InputEvent::CursorMoved { x, y } => {
                self.controller.pointer_move(x, y);
            }
            InputEvent::CursorLeft => self.controller.pointer_leave(),
            InputEvent::MouseButton { button, pressed } => {
                if pressed {
                    self.controller.pointer_down(button);
                } else {
                    self.controller.pointer_up(button);
                }
            }
            InputEvent::Scroll { delta } => self.controller.zoom(delta),
        }
    }

    /// Match the camera to a new viewport size. Zero sizes are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.set_viewport(width, height);
        self.controller.set_viewport_height(height);
    }

    // -- Panel --

    /// Write a panel field; see [`ParameterPanel::set`].
    pub fn set_panel_field(&mut self, name: &str, value: f32) -> bool {
        self.panel.set(&mut self.scene, name, value)
    }

    /// Read a panel field.
    pub fn panel_field(&self, name: &str) -> Option<f32> {
        self.panel.get(&self.scene, name)
    }

    /// Current panel state for frontends.
    pub fn panel_snapshot(&self) -> PanelSnapshot {
        self.panel.snapshot(&self.scene)
    }

    // -- Accessors --

    /// Active options (normalised).
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Scene graph.
    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    /// Mutable scene graph.
    pub fn scene_mut(&mut self) -> &mut SceneGraph {
        &mut self.scene
    }

    /// Camera as of the last frame.
    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    /// Orbit controller.
    pub fn controller(&self) -> &OrbitController {
        &self.controller
    }

    /// Parameter panel.
    pub fn panel(&self) -> &ParameterPanel {
        &self.panel
    }

    /// Mutable parameter panel.
    pub fn panel_mut(&mut self) -> &mut ParameterPanel {
        &mut self.panel
    }

    /// Model lifecycle.
    pub fn model(&self) -> &ModelSlot {
        &self.model
    }

    /// Mixer for the loaded model.
    pub fn mixer(&self) -> Option<&AnimationMixer> {
        self.mixer.as_ref()
    }

    /// Shadow-casting spot light node.
    pub fn spot_light(&self) -> NodeId {
        self.spot_light
    }

    /// Panel-driven point light node.
    pub fn point_light(&self) -> NodeId {
        self.point_light
    }

    /// Ground plane node, if enabled.
    pub fn ground(&self) -> Option<NodeId> {
        self.ground
    }

    /// Frames advanced so far.
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// Smoothed frames per second, as measured by [`tick`](Self::tick).
    pub fn fps(&self) -> f32 {
        self.clock.fps()
    }
}

fn add_spot_light(scene: &mut SceneGraph, parent: NodeId, options: &Options) -> NodeId {
    let o = &options.lights.spot;
    let light = SpotLight {
        color: srgb_hex_to_linear(o.color),
        intensity: o.intensity,
        distance: o.distance,
        decay: o.decay,
        angle: o.angle,
        penumbra: o.penumbra,
        target: Vec3::from_array(o.target),
        cast_shadow: o.cast_shadow && options.renderer.shadows,
        shadow: ShadowCamera {
            near: o.shadow_near,
            far: o.shadow_far,
            focus: o.shadow_focus,
            bias: o.shadow_bias,
        },
    };
    let node = Node::new("spot_light")
        .with_transform(Transform::from_position(Vec3::from_array(o.position)))
        .with_payload(Payload::Light(Light::Spot(light)));
    // The root always exists, so adding under it cannot fail.
    scene.add(parent, node).unwrap_or(parent)
}

fn add_point_light(scene: &mut SceneGraph, parent: NodeId, options: &Options) -> NodeId {
    let o = &options.lights.point;
    let color = srgb_hex_to_linear(o.color);
    let light = PointLight {
        color,
        intensity: o.intensity,
        distance: o.distance,
        decay: o.decay,
        cast_shadow: false,
    };
    let node = Node::new("point_light")
        .with_transform(Transform::from_position(Vec3::from_array(o.position)))
        .with_payload(Payload::Light(Light::Point(light)));
    let Some(id) = scene.add(parent, node) else {
        return parent;
    };

    if o.helper {
        let mesh = scene.add_mesh(MeshData::octahedron(o.helper_size));
        let material = Material {
            base_color: [color[0], color[1], color[2], 1.0],
            unlit: true,
            ..Material::default()
        };
        let helper = Node::new("point_light_helper")
            .with_payload(Payload::Mesh(MeshInstance::new(mesh, material)));
        let _ = scene.add(id, helper);
    }
    id
}

fn add_ground(scene: &mut SceneGraph, parent: NodeId, options: &Options) -> Option<NodeId> {
    let o = &options.ground;
    let mesh = scene.add_mesh(MeshData::plane(o.size, o.size));
    let [r, g, b] = srgb_hex_to_linear(o.color);
    let material = Material {
        base_color: [r, g, b, 1.0],
        depth_write: false,
        ..Material::default()
    };
    let mut instance = MeshInstance::new(mesh, material);
    instance.receive_shadow = o.receive_shadow;

    let mut transform = Transform::from_position(Vec3::new(0.0, o.height, 0.0));
    transform.set_euler(-FRAC_PI_2, 0.0, 0.0);
    let node = Node::new("ground")
        .with_transform(transform)
        .with_payload(Payload::Mesh(instance));
    scene.add(parent, node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{AnimationClip, Interpolation, Track, TrackValues};
    use crate::input::MouseButton;
    use crate::loader::{LoadError, ModelNode, ModelPrimitive};

    fn animated_model() -> LoadedModel {
        LoadedModel {
            nodes: vec![ModelNode {
                name: "tower".into(),
                parent: None,
                transform: Transform::IDENTITY,
                primitives: vec![ModelPrimitive {
                    mesh: 0,
                    material: Material::default(),
                }],
            }],
            meshes: vec![MeshData::octahedron(1.0)],
            clips: vec![AnimationClip::new(
                "spin",
                vec![Track {
                    target: 0,
                    times: vec![0.0, 10.0],
                    values: TrackValues::Rotation(vec![
                        Quat::IDENTITY,
                        Quat::from_rotation_y(1.0),
                    ]),
                    interpolation: Interpolation::Linear,
                }],
            )],
        }
    }

    fn model_roots(stage: &Stage) -> usize {
        stage
            .scene()
            .children(stage.scene().root())
            .iter()
            .filter(|&&id| {
                stage.scene().get(id).is_some_and(|n| n.name == MODEL_ROOT_NAME)
            })
            .count()
    }

    fn loaded_stage() -> Stage {
        let mut stage = Stage::new(Options::default(), 800, 600);
        stage.begin_load(PendingLoad::resolved(
            "tower.glb".into(),
            Ok(animated_model()),
        ));
        stage
    }

    #[test]
    fn builds_lights_ground_and_panel() {
        let stage = Stage::new(Options::default(), 800, 600);
        let lights = stage.scene().lights();
        assert_eq!(lights.len(), 2);
        assert!(stage.ground().is_some());
        assert_eq!(stage.panel_field("intensity"), Some(1.0));
        assert!(matches!(stage.model(), ModelSlot::Absent));
        // Helper marker rides on the point light.
        let helper = stage.scene().children(stage.point_light());
        assert_eq!(helper.len(), 1);
    }

    #[test]
    fn ground_faces_up_below_origin() {
        let stage = Stage::new(Options::default(), 800, 600);
        let ground = stage.ground().unwrap();
        let world = stage.scene().world_matrix(ground);
        let normal = world.transform_vector3(Vec3::Z);
        assert!((normal - Vec3::Y).length() < 1e-5);
        assert!((world.w_axis.y + 0.6).abs() < 1e-6);
        let instance = stage.scene().get(ground).unwrap().mesh().unwrap();
        assert!(instance.receive_shadow);
        assert!(!instance.material.depth_write);
    }

    #[test]
    fn failed_load_keeps_rendering() {
        let mut stage = Stage::new(Options::default(), 800, 600);
        stage.begin_load(PendingLoad::resolved(
            "missing.glb".into(),
            Err(LoadError::NoScene),
        ));
        for _ in 0..10 {
            stage.advance(1.0 / 60.0);
        }
        assert_eq!(stage.frame_count(), 10);
        assert!(matches!(stage.model(), ModelSlot::Failed(_)));
        assert!(stage.mixer().is_none());
        assert_eq!(model_roots(&stage), 0);
        assert_eq!(stage.scene().lights().len(), 2);
    }

    #[test]
    fn model_is_attached_exactly_once() {
        let mut stage = loaded_stage();
        stage.advance(0.0);
        assert!(matches!(stage.model(), ModelSlot::Loaded { .. }));
        assert_eq!(model_roots(&stage), 1);

        let again = PendingLoad::resolved("tower.glb".into(), Ok(animated_model()));
        assert!(!stage.begin_load(again));
        for _ in 0..5 {
            stage.advance(0.1);
        }
        assert_eq!(model_roots(&stage), 1);
    }

    #[test]
    fn attached_model_is_placed_and_casts_shadows() {
        let mut stage = loaded_stage();
        stage.advance(0.0);
        let ModelSlot::Loaded { root } = *stage.model() else {
            panic!("model not loaded");
        };
        let transform = stage.scene().get(root).unwrap().transform;
        assert_eq!(transform.position, Vec3::new(-0.2, 1.3, -0.3));
        assert_eq!(transform.scale, Vec3::splat(0.01));
        assert!(transform.rotation.abs_diff_eq(Quat::from_rotation_y(1.99), 1e-6));

        let casters = stage
            .scene()
            .drawables()
            .iter()
            .filter(|d| d.instance.cast_shadow)
            .count();
        assert_eq!(casters, 1);
    }

    #[test]
    fn two_seconds_of_frames_advance_the_clip_two_seconds() {
        let mut stage = loaded_stage();
        for _ in 0..120 {
            stage.advance(1.0 / 60.0);
        }
        let action = stage.mixer().unwrap().existing_action(0).unwrap();
        assert!(action.is_running());
        assert!((action.time() - 2.0).abs() < 1e-4);
    }

    #[test]
    fn no_animation_before_model_arrives() {
        let mut stage = Stage::new(Options::default(), 800, 600);
        stage.advance(1.0);
        assert!(stage.mixer().is_none());
    }

    #[test]
    fn resize_updates_aspect() {
        let mut stage = Stage::new(Options::default(), 800, 600);
        stage.resize(1920, 1080);
        assert_eq!(stage.camera().aspect, 1920.0 / 1080.0);
        stage.resize(0, 0);
        assert_eq!(stage.camera().aspect, 1920.0 / 1080.0);
    }

    #[test]
    fn repeated_resize_changes_nothing() {
        let mut stage = Stage::new(Options::default(), 800, 600);
        stage.advance(0.0);
        stage.resize(1280, 720);
        let camera = *stage.camera();
        let state = stage.controller().state();
        stage.resize(1280, 720);
        assert_eq!(stage.camera(), &camera);
        assert_eq!(stage.controller().state(), state);
        assert_eq!(stage.camera().aspect, 1280.0 / 720.0);
    }

    #[test]
    fn static_model_gets_no_mixer() {
        let mut stage = Stage::new(Options::default(), 800, 600);
        let model = LoadedModel {
            clips: Vec::new(),
            ..animated_model()
        };
        stage.begin_load(PendingLoad::resolved("static.glb".into(), Ok(model)));
        stage.advance(0.0);
        assert!(matches!(stage.model(), ModelSlot::Loaded { .. }));
        assert!(stage.mixer().is_none());
        stage.advance(1.0);
        assert_eq!(stage.frame_count(), 2);
    }

    #[test]
    fn nan_orbit_bound_in_options_file_does_not_panic() {
        let options =
            Options::from_toml("[controls]\nmax_distance = nan").unwrap();
        let mut stage = Stage::new(options, 800, 600);
        stage.advance(0.0);
        let (min, max) = stage.controller().distance_bounds();
        assert!(min.is_finite() && max.is_finite());
        assert!(stage.camera().eye.is_finite());
    }

    #[test]
    fn tick_counts_frames() {
        let mut stage = Stage::new(Options::default(), 800, 600);
        assert_eq!(stage.tick(), 0.0);
        let delta = stage.tick();
        assert!(delta >= 0.0);
        assert_eq!(stage.frame_count(), 2);
    }

    #[test]
    fn camera_settles_inside_distance_bounds() {
        let mut stage = Stage::new(Options::default(), 800, 600);
        stage.advance(0.0);
        let distance = stage.camera().distance();
        let (min, max) = stage.controller().distance_bounds();
        assert!(distance >= min - 1e-4 && distance <= max + 1e-4);
    }

    #[test]
    fn drag_rotates_the_camera() {
        let mut stage = Stage::new(Options::default(), 800, 600);
        stage.advance(0.0);
        let before = stage.camera().eye;
        stage.handle_input(InputEvent::CursorMoved { x: 100.0, y: 100.0 });
        stage.handle_input(InputEvent::MouseButton {
            button: MouseButton::Left,
            pressed: true,
        });
        stage.handle_input(InputEvent::CursorMoved { x: 160.0, y: 100.0 });
        stage.advance(0.0);
        assert!(stage.camera().eye.distance(before) > 1e-3);
    }

    #[test]
    fn panel_edits_reach_the_point_light() {
        let mut stage = Stage::new(Options::default(), 800, 600);
        assert!(stage.set_panel_field("x", 2.0));
        assert!(stage.set_panel_field("intensity", -3.0));
        let node = stage.scene().get(stage.point_light()).unwrap();
        assert_eq!(node.transform.position.x, 2.0);
        assert_eq!(node.light().unwrap().intensity(), -3.0);
        let snapshot = stage.panel_snapshot();
        assert_eq!(snapshot.folders.len(), 2);
    }
}
