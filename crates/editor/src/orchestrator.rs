use crate::{
    CameraController, EditorConfig, EditorMode, EditorRequest, EditorRequests, EditorUi,
    FrameClock, FrameError, FrameStats, NullUi, SceneCamera, Window,
};
use bubble_assets::{HotReload, HotReloader};
use bubble_ecs::{ComponentSet, EntityStore, Model, Script, Shader, ShaderHandle, Transform};
use bubble_render::{ClearValue, FlyCamera, ObjectId, RenderBackend, TargetKind};
use bubble_script::{NativeScriptRunner, ScriptRunner};
use glam::Vec3;

/// Entities drawn by the scene pass.
pub const SCENE_VIEW: ComponentSet = ComponentSet::MODEL
    .union(ComponentSet::SHADER)
    .union(ComponentSet::TRANSFORM);

/// Entities drawn by the pick pass. Their own shader is ignored.
pub const PICK_VIEW: ComponentSet = ComponentSet::MODEL.union(ComponentSet::TRANSFORM);

/// Per-frame control loop of the editor.
///
/// Owns the renderer, the entity store and every collaborator for the whole
/// session. Each [`tick`](Self::tick) runs, in order: event polling, clock
/// advance, request handling, the mode's pipeline, and presentation.
pub struct FrameOrchestrator<R, S> {
    renderer: R,
    scene: S,
    camera: Box<dyn CameraController>,
    scripts: Box<dyn ScriptRunner>,
    hot_reload: Box<dyn HotReload>,
    ui: Box<dyn EditorUi>,
    requests: EditorRequests,
    mode: EditorMode,
    clock: FrameClock,
    pick_shader: ShaderHandle,
    background: [f32; 4],
    stats: FrameStats,
}

impl<R: RenderBackend, S: EntityStore> FrameOrchestrator<R, S> {
    /// Orchestrator with default collaborators: a [`SceneCamera`] sized to
    /// the renderer, an empty [`NativeScriptRunner`], a [`HotReloader`]
    /// watching nothing and a [`NullUi`].
    pub fn new(renderer: R, scene: S, pick_shader: ShaderHandle, config: &EditorConfig) -> Self {
        let aspect = renderer.extent().aspect();
        let camera = FlyCamera::looking_at(Vec3::new(0.0, 3.0, 6.0), Vec3::ZERO, aspect);
        Self {
            renderer,
            scene,
            camera: Box::new(SceneCamera::new(camera)),
            scripts: Box::new(NativeScriptRunner::new()),
            hot_reload: Box::new(HotReloader::new(config.hot_reload_interval())),
            ui: Box::new(NullUi::default()),
            requests: EditorRequests::new(),
            mode: config.initial_mode,
            clock: FrameClock::monotonic(config.max_frame_delta),
            pick_shader,
            background: config.background,
            stats: FrameStats::default(),
        }
    }

    pub fn with_camera(mut self, camera: impl CameraController + 'static) -> Self {
        self.camera = Box::new(camera);
        self
    }

    pub fn with_script_runner(mut self, scripts: impl ScriptRunner + 'static) -> Self {
        self.scripts = Box::new(scripts);
        self
    }

    pub fn with_hot_reload(mut self, hot_reload: impl HotReload + 'static) -> Self {
        self.hot_reload = Box::new(hot_reload);
        self
    }

    pub fn with_ui(mut self, ui: impl EditorUi + 'static) -> Self {
        self.ui = Box::new(ui);
        self
    }

    pub fn with_clock(mut self, clock: FrameClock) -> Self {
        self.clock = clock;
        self
    }

    /// Use a queue shared with the window or UI.
    pub fn with_requests(mut self, requests: EditorRequests) -> Self {
        self.requests = requests;
        self
    }

    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    /// Handle for queueing requests; clones share the queue.
    pub fn requests(&self) -> EditorRequests {
        self.requests.clone()
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    /// Tick until the window asks to close. The first failing tick ends the
    /// loop and its error is returned.
    pub fn run(&mut self, window: &mut dyn Window) -> Result<(), FrameError> {
        tracing::info!(mode = %self.mode, "frame loop started");
        while !window.should_close() {
            self.tick(window)?;
        }
        tracing::info!(ticks = self.stats.ticks, "frame loop finished");
        Ok(())
    }

    /// Run one complete frame.
    pub fn tick(&mut self, window: &mut dyn Window) -> Result<(), FrameError> {
        window.poll_events();
        let dt = self.clock.tick();
        self.apply_requests();

        match self.mode {
            EditorMode::Editing => self.edit_frame(dt, window)?,
            EditorMode::Running => {
                // Play mode has no pipeline yet; the frame only presents.
            }
        }

        window.on_update();
        self.stats.ticks += 1;
        tracing::debug!(tick = self.stats.ticks, mode = %self.mode, dt, "tick");
        Ok(())
    }

    fn edit_frame(&mut self, dt: f32, window: &mut dyn Window) -> Result<(), FrameError> {
        self.camera.on_update(dt, window.input());
        self.hot_reload.on_update(&mut self.renderer);
        self.ui.on_update(dt);
        self.dispatch_scripts()?;
        self.draw_scene()?;

        window.bind_surface();
        window.ui_begin();
        self.ui.on_draw(dt);
        window.ui_end();

        self.stats.editing_ticks += 1;
        Ok(())
    }

    /// Single transition point for the editor mode.
    fn apply_requests(&mut self) {
        for request in self.requests.drain() {
            self.stats.requests += 1;
            match request {
                EditorRequest::EnterPlayMode => self.set_mode(EditorMode::Running),
                EditorRequest::ExitPlayMode => self.set_mode(EditorMode::Editing),
                EditorRequest::OpenProject(path) => self.ui.on_open_project(&path),
            }
        }
    }

    fn set_mode(&mut self, mode: EditorMode) {
        if self.mode == mode {
            return;
        }
        tracing::info!(from = %self.mode, to = %mode, "editor mode changed");
        self.mode = mode;
        self.ui.on_mode_changed(mode);
    }

    /// Invoke the script runner once for every entity carrying a script.
    /// Returns the number of invocations.
    pub fn dispatch_scripts(&mut self) -> Result<usize, FrameError> {
        let mut dispatched = 0;
        for entity in self.scene.view(ComponentSet::SCRIPT) {
            let script = self.scene.get::<Script>(entity)?;
            self.scripts.on_update(script.0);
            dispatched += 1;
        }
        self.stats.script_dispatches += dispatched as u64;
        Ok(dispatched)
    }

    /// Upload the camera and run the scene pass, then the pick pass.
    pub fn draw_scene(&mut self) -> Result<(), FrameError> {
        self.renderer.set_frame_uniforms(&self.camera.uniforms());

        self.renderer
            .begin_pass(TargetKind::Scene, ClearValue::Color(self.background))?;
        for entity in self.scene.view(SCENE_VIEW) {
            let model = self.scene.get::<Model>(entity)?;
            let shader = self.scene.get::<Shader>(entity)?;
            let world = self.scene.get::<Transform>(entity)?.matrix();
            self.renderer.draw_model(model, world, shader.0)?;
            self.stats.draws += 1;
        }
        self.renderer.end_pass()?;
        self.stats.scene_passes += 1;

        self.renderer
            .begin_pass(TargetKind::Pick, ClearValue::ObjectId(ObjectId::NONE))?;
        for entity in self.scene.view(PICK_VIEW) {
            let model = self.scene.get::<Model>(entity)?;
            let world = self.scene.get::<Transform>(entity)?.matrix();
            self.renderer
                .set_object_id(self.pick_shader, ObjectId::from_entity(entity))?;
            self.renderer.draw_model(model, world, self.pick_shader)?;
            self.stats.draws += 1;
        }
        self.renderer.end_pass()?;
        self.stats.pick_passes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HeadlessWindow, load_editor_shaders};
    use bubble_assets::ResourceLoader;
    use bubble_common::Extent;
    use bubble_ecs::{Component, ComponentStore, EcsError, EntityId, MeshHandle, ScriptHandle};
    use bubble_input::InputState;
    use bubble_render::{
        FrameUniforms, RenderCall, RenderError, ShaderReloader, ShaderSource, SoftwareRenderer,
        shaders,
    };
    use std::cell::RefCell;
    use std::path::PathBuf;
    use std::rc::Rc;
    use std::time::Duration;

    const VIEWPORT: Extent = Extent::new(800, 640);

    /// Store wrapper recording every view query.
    #[derive(Default)]
    struct CountingStore {
        inner: ComponentStore,
        queries: RefCell<Vec<ComponentSet>>,
    }

    impl CountingStore {
        fn queries_for(&self, set: ComponentSet) -> usize {
            self.queries.borrow().iter().filter(|q| **q == set).count()
        }
    }

    impl EntityStore for CountingStore {
        fn view(&self, required: ComponentSet) -> impl Iterator<Item = EntityId> + '_ {
            self.queries.borrow_mut().push(required);
            self.inner.view(required)
        }

        fn get<C: Component>(&self, entity: EntityId) -> Result<&C, EcsError> {
            self.inner.get(entity)
        }
    }

    /// Script runner recording the handles it was given.
    #[derive(Clone, Default)]
    struct RecordingRunner(Rc<RefCell<Vec<ScriptHandle>>>);

    impl ScriptRunner for RecordingRunner {
        fn on_update(&mut self, script: ScriptHandle) {
            self.0.borrow_mut().push(script);
        }
    }

    #[derive(Clone, Default)]
    struct RecordingUi(Rc<RefCell<Vec<String>>>);

    impl EditorUi for RecordingUi {
        fn on_update(&mut self, _dt: f32) {
            self.0.borrow_mut().push("update".into());
        }

        fn on_draw(&mut self, _dt: f32) {
            self.0.borrow_mut().push("draw".into());
        }

        fn on_open_project(&mut self, path: &std::path::Path) {
            self.0.borrow_mut().push(format!("open {}", path.display()));
        }

        fn on_mode_changed(&mut self, mode: EditorMode) {
            self.0.borrow_mut().push(format!("mode {mode}"));
        }
    }

    struct CountingHotReload(Rc<RefCell<u32>>);

    impl HotReload for CountingHotReload {
        fn on_update(&mut self, _reloader: &mut dyn ShaderReloader) {
            *self.0.borrow_mut() += 1;
        }
    }

    type Editor = FrameOrchestrator<SoftwareRenderer, CountingStore>;

    fn editor_with(store: ComponentStore, config: &EditorConfig) -> Editor {
        let mut renderer = SoftwareRenderer::new(config.viewport);
        let mut hot = HotReloader::new(Duration::ZERO);
        let shaders =
            load_editor_shaders(&mut renderer, &ResourceLoader::builtin(), &mut hot).unwrap();
        let store = CountingStore {
            inner: store,
            ..Default::default()
        };
        let camera = FlyCamera::looking_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, VIEWPORT.aspect());
        FrameOrchestrator::new(renderer, store, shaders.pick, config)
            .with_camera(SceneCamera::new(camera))
            .with_clock(FrameClock::fixed(1.0 / 60.0))
    }

    fn editor(store: ComponentStore) -> Editor {
        editor_with(store, &EditorConfig::default())
    }

    /// Scene shader handle loaded by `editor_with`.
    const SCENE_SHADER: ShaderHandle = ShaderHandle(0);

    fn spawn_cube(store: &mut ComponentStore, position: Vec3) -> EntityId {
        let e = store.spawn().unwrap();
        store.insert(e, Transform::from_position(position)).unwrap();
        store.insert(e, Model::new(MeshHandle::CUBE)).unwrap();
        store.insert(e, Shader(SCENE_SHADER)).unwrap();
        e
    }

    /// Store whose next spawned entity gets handle `n`.
    fn store_at_handle(n: u32) -> ComponentStore {
        let mut store = ComponentStore::new();
        for _ in 1..n {
            let e = store.spawn().unwrap();
            store.despawn(e).unwrap();
        }
        store
    }

    #[test]
    fn editing_tick_runs_both_passes_after_clears() {
        let mut store = ComponentStore::new();
        spawn_cube(&mut store, Vec3::ZERO);
        let mut editor = editor(store);
        let mut window = HeadlessWindow::new();

        editor.tick(&mut window).unwrap();

        let calls = editor.renderer_mut().take_calls();
        let passes: Vec<_> = calls
            .iter()
            .filter_map(|c| match c {
                RenderCall::BeginPass { target, clear } => Some((*target, *clear)),
                _ => None,
            })
            .collect();
        assert_eq!(
            passes,
            vec![
                (TargetKind::Scene, ClearValue::Color([0.2, 0.3, 0.3, 1.0])),
                (TargetKind::Pick, ClearValue::ObjectId(ObjectId::NONE)),
            ]
        );
        assert_eq!(calls.first(), Some(&RenderCall::FrameUniforms));
        assert_eq!(
            calls.last(),
            Some(&RenderCall::EndPass {
                target: TargetKind::Pick
            })
        );

        let stats = editor.stats();
        assert_eq!((stats.scene_passes, stats.pick_passes), (1, 1));
        assert_eq!(stats.draws, 2);
        assert_eq!(window.polls, 1);
        assert_eq!(window.surface_binds, 1);
        assert_eq!(window.ui_frames, 1);
        assert_eq!(window.presents, 1);
    }

    #[test]
    fn pick_target_holds_entity_handle_at_cube_centre() {
        let mut store = store_at_handle(7);
        let cube = spawn_cube(&mut store, Vec3::ZERO);
        assert_eq!(cube.get(), 7);
        let mut editor = editor(store);

        editor.tick(&mut HeadlessWindow::new()).unwrap();

        let renderer = editor.renderer();
        let centre = renderer.read_object_id(VIEWPORT.width / 2, VIEWPORT.height / 2);
        assert_eq!(centre, ObjectId(7));
        assert_eq!(centre.entity(), Some(cube));
        assert_eq!(renderer.read_object_id(0, 0), ObjectId::NONE);
        assert_eq!(renderer.read_object_id(0, 0).entity(), None);
    }

    #[test]
    fn nearer_entity_wins_the_pick_pixel() {
        let mut store = store_at_handle(3);
        let near = spawn_cube(&mut store, Vec3::new(0.0, 0.0, 1.0));
        for _ in 4..9 {
            let e = store.spawn().unwrap();
            store.despawn(e).unwrap();
        }
        let far = spawn_cube(&mut store, Vec3::new(0.0, 0.0, -2.0));
        assert_eq!((near.get(), far.get()), (3, 9));
        let mut editor = editor(store);

        editor.tick(&mut HeadlessWindow::new()).unwrap();

        let pixel = editor.renderer().read_object_id(400, 320);
        assert_eq!(pixel, ObjectId(3));
    }

    #[test]
    fn pick_pass_ignores_entity_shader() {
        let mut store = ComponentStore::new();
        // No Shader component: skipped by the scene pass, still pickable.
        let e = store.spawn().unwrap();
        store.insert(e, Transform::default()).unwrap();
        store.insert(e, Model::new(MeshHandle::CUBE)).unwrap();
        let mut editor = editor(store);

        editor.tick(&mut HeadlessWindow::new()).unwrap();

        let draws: Vec<_> = editor
            .renderer()
            .calls()
            .iter()
            .filter(|c| matches!(c, RenderCall::Draw { .. }))
            .cloned()
            .collect();
        assert_eq!(
            draws,
            vec![RenderCall::Draw {
                target: TargetKind::Pick,
                shader: ShaderHandle(1)
            }]
        );
        assert_eq!(editor.renderer().read_object_id(400, 320).entity(), Some(e));
    }

    #[test]
    fn running_mode_only_polls_and_presents() {
        let mut store = ComponentStore::new();
        let cube = spawn_cube(&mut store, Vec3::ZERO);
        store.insert(cube, Script(ScriptHandle(0))).unwrap();
        let config = EditorConfig {
            initial_mode: EditorMode::Running,
            ..EditorConfig::default()
        };
        let runner = RecordingRunner::default();
        let mut editor = editor_with(store, &config).with_script_runner(runner.clone());
        let mut window = HeadlessWindow::closing_after(5);

        editor.run(&mut window).unwrap();

        assert_eq!(window.polls, 5);
        assert_eq!(window.presents, 5);
        assert_eq!(window.surface_binds, 0);
        assert_eq!(editor.scene().queries_for(ComponentSet::SCRIPT), 0);
        assert!(runner.0.borrow().is_empty());
        let renderer = editor.renderer();
        assert_eq!(renderer.bind_count(TargetKind::Scene), 0);
        assert_eq!(renderer.bind_count(TargetKind::Pick), 0);
        assert!(renderer.object_ids().iter().all(|&id| id == 0));
        assert_eq!(editor.stats().ticks, 5);
        assert_eq!(editor.stats().editing_ticks, 0);
    }

    #[test]
    fn play_request_before_first_tick_skips_editing() {
        let mut editor = editor(ComponentStore::new());
        editor.requests().push(EditorRequest::EnterPlayMode);

        editor.tick(&mut HeadlessWindow::new()).unwrap();

        assert_eq!(editor.mode(), EditorMode::Running);
        assert_eq!(editor.renderer().bind_count(TargetKind::Scene), 0);
    }

    #[test]
    fn scripts_dispatch_once_per_editing_tick() {
        let mut store = ComponentStore::new();
        for handle in [10, 11] {
            let e = store.spawn().unwrap();
            store.insert(e, Script(ScriptHandle(handle))).unwrap();
        }
        let runner = RecordingRunner::default();
        let mut editor = editor(store).with_script_runner(runner.clone());

        editor.tick(&mut HeadlessWindow::new()).unwrap();

        let mut seen = runner.0.borrow().clone();
        seen.sort();
        assert_eq!(seen, vec![ScriptHandle(10), ScriptHandle(11)]);
        assert_eq!(editor.scene().queries_for(ComponentSet::SCRIPT), 1);
    }

    #[test]
    fn repeated_dispatch_is_not_deduplicated() {
        let mut store = ComponentStore::new();
        for handle in [1, 2, 3] {
            let e = store.spawn().unwrap();
            store.insert(e, Script(ScriptHandle(handle))).unwrap();
        }
        let runner = RecordingRunner::default();
        let mut editor = editor(store).with_script_runner(runner.clone());

        assert_eq!(editor.dispatch_scripts().unwrap(), 3);
        assert_eq!(editor.dispatch_scripts().unwrap(), 3);

        let calls = runner.0.borrow();
        assert_eq!(calls.len(), 6);
        for handle in [1, 2, 3] {
            assert_eq!(calls.iter().filter(|h| h.0 == handle).count(), 2);
        }
    }

    #[test]
    fn failing_native_script_does_not_stop_the_frame() {
        let mut store = ComponentStore::new();
        let mut runner = NativeScriptRunner::new();
        let handle = runner.register(|_| panic!("script bug"));
        let e = store.spawn().unwrap();
        store.insert(e, Script(handle)).unwrap();
        let mut editor = editor(store).with_script_runner(runner);

        editor.tick(&mut HeadlessWindow::new()).unwrap();
        assert_eq!(editor.stats().scene_passes, 1);
    }

    /// Store that reports an entity its components do not back.
    struct LyingStore(ComponentStore, EntityId);

    impl EntityStore for LyingStore {
        fn view(&self, required: ComponentSet) -> impl Iterator<Item = EntityId> + '_ {
            self.0.view(required).chain(std::iter::once(self.1))
        }

        fn get<C: Component>(&self, entity: EntityId) -> Result<&C, EcsError> {
            self.0.get(entity)
        }
    }

    #[test]
    fn missing_component_propagates_and_stops_the_loop() {
        let ghost = EntityId::new(99).unwrap();
        let mut renderer = SoftwareRenderer::new(VIEWPORT);
        let mut hot = HotReloader::new(Duration::ZERO);
        let shaders =
            load_editor_shaders(&mut renderer, &ResourceLoader::builtin(), &mut hot).unwrap();
        let mut editor = FrameOrchestrator::new(
            renderer,
            LyingStore(ComponentStore::new(), ghost),
            shaders.pick,
            &EditorConfig::default(),
        );
        let mut window = HeadlessWindow::closing_after(3);

        let err = editor.run(&mut window).unwrap_err();
        assert!(matches!(
            err,
            FrameError::Ecs(EcsError::MissingComponent { entity, kind: "Script" })
                if entity == ghost
        ));
        assert_eq!(window.presents, 0);
    }

    #[test]
    fn unknown_entity_shader_is_a_render_error() {
        let mut store = ComponentStore::new();
        let e = spawn_cube(&mut store, Vec3::ZERO);
        store.insert(e, Shader(ShaderHandle(42))).unwrap();
        let mut editor = editor(store);

        let err = editor.tick(&mut HeadlessWindow::new()).unwrap_err();
        assert!(matches!(
            err,
            FrameError::Render(RenderError::UnknownShader(ShaderHandle(42)))
        ));
    }

    #[test]
    fn requests_are_applied_before_mode_dispatch() {
        let ui = RecordingUi::default();
        let mut editor = editor(ComponentStore::new()).with_ui(ui.clone());
        let requests = editor.requests();
        let mut window = HeadlessWindow::new();

        requests.push(EditorRequest::OpenProject(PathBuf::from("demo.bubble")));
        requests.push(EditorRequest::ExitPlayMode);
        editor.tick(&mut window).unwrap();
        requests.push(EditorRequest::EnterPlayMode);
        requests.push(EditorRequest::EnterPlayMode);
        editor.tick(&mut window).unwrap();
        requests.push(EditorRequest::ExitPlayMode);
        editor.tick(&mut window).unwrap();

        assert_eq!(
            *ui.0.borrow(),
            vec![
                "open demo.bubble",
                "update",
                "draw",
                "mode running",
                "mode editing",
                "update",
                "draw",
            ]
        );
        assert_eq!(editor.stats().editing_ticks, 2);
        assert_eq!(editor.stats().requests, 5);
    }

    #[test]
    fn hot_reload_polls_only_while_editing() {
        let polls = Rc::new(RefCell::new(0));
        let mut editor =
            editor(ComponentStore::new()).with_hot_reload(CountingHotReload(polls.clone()));
        let mut window = HeadlessWindow::new();

        editor.tick(&mut window).unwrap();
        editor.requests().push(EditorRequest::EnterPlayMode);
        editor.tick(&mut window).unwrap();
        assert_eq!(*polls.borrow(), 1);
    }

    #[test]
    fn camera_input_moves_the_view_before_rendering() {
        let mut store = ComponentStore::new();
        spawn_cube(&mut store, Vec3::ZERO);
        // One second at the default speed moves the camera 5 units right,
        // taking the cube out of the centre pixel.
        let mut editor = editor(store).with_clock(FrameClock::fixed(1.0));
        let mut window = HeadlessWindow::new();
        window.script_frame(|input| {
            input.set_button(bubble_input::MouseButton::Right, true);
            input.set_key(bubble_input::Key::D, true);
        });

        editor.tick(&mut window).unwrap();
        assert_eq!(editor.renderer().read_object_id(400, 320), ObjectId::NONE);
    }

    type Log = Rc<RefCell<Vec<String>>>;

    fn push(log: &Log, entry: &str) {
        log.borrow_mut().push(entry.to_string());
    }

    /// Software renderer logging each call, plus the shader source seen by
    /// every draw.
    struct LoggingRenderer {
        inner: SoftwareRenderer,
        log: Log,
        drawn_sources: Vec<String>,
    }

    impl ShaderReloader for LoggingRenderer {
        fn reload_shader(
            &mut self,
            shader: ShaderHandle,
            source: &ShaderSource,
        ) -> Result<(), RenderError> {
            push(&self.log, "reload");
            self.inner.reload_shader(shader, source)
        }
    }

    impl RenderBackend for LoggingRenderer {
        fn extent(&self) -> Extent {
            self.inner.extent()
        }

        fn load_shader(&mut self, source: &ShaderSource) -> Result<ShaderHandle, RenderError> {
            self.inner.load_shader(source)
        }

        fn set_frame_uniforms(&mut self, uniforms: &FrameUniforms) {
            push(&self.log, "uniforms");
            self.inner.set_frame_uniforms(uniforms);
        }

        fn begin_pass(&mut self, target: TargetKind, clear: ClearValue) -> Result<(), RenderError> {
            push(&self.log, &format!("begin {}", target.label()));
            self.inner.begin_pass(target, clear)
        }

        fn set_object_id(&mut self, shader: ShaderHandle, id: ObjectId) -> Result<(), RenderError> {
            push(&self.log, "object_id");
            self.inner.set_object_id(shader, id)
        }

        fn draw_model(
            &mut self,
            model: &Model,
            world: glam::Mat4,
            shader: ShaderHandle,
        ) -> Result<(), RenderError> {
            push(&self.log, "draw");
            if let Some(source) = self.inner.shader_source(shader) {
                self.drawn_sources.push(source.wgsl.clone());
            }
            self.inner.draw_model(model, world, shader)
        }

        fn end_pass(&mut self) -> Result<(), RenderError> {
            push(&self.log, "end");
            self.inner.end_pass()
        }
    }

    struct LoggingWindow {
        input: InputState,
        log: Log,
    }

    impl Window for LoggingWindow {
        fn poll_events(&mut self) {
            push(&self.log, "poll");
        }

        fn should_close(&self) -> bool {
            false
        }

        fn input(&self) -> &InputState {
            &self.input
        }

        fn bind_surface(&mut self) {
            push(&self.log, "bind_surface");
        }

        fn ui_begin(&mut self) {
            push(&self.log, "ui_begin");
        }

        fn ui_end(&mut self) {
            push(&self.log, "ui_end");
        }

        fn on_update(&mut self) {
            push(&self.log, "present");
        }
    }

    struct LoggingCamera(SceneCamera, Log);

    impl CameraController for LoggingCamera {
        fn on_update(&mut self, dt: f32, input: &InputState) {
            push(&self.1, "camera");
            self.0.on_update(dt, input);
        }

        fn view(&self) -> glam::Mat4 {
            self.0.view()
        }

        fn projection(&self) -> glam::Mat4 {
            self.0.projection()
        }
    }

    struct LoggingHotReload(HotReloader, Log);

    impl HotReload for LoggingHotReload {
        fn on_update(&mut self, reloader: &mut dyn ShaderReloader) {
            push(&self.1, "hot_reload");
            self.0.on_update(reloader);
        }
    }

    struct LoggingUi(Log);

    impl EditorUi for LoggingUi {
        fn on_update(&mut self, _dt: f32) {
            push(&self.0, "ui_update");
        }

        fn on_draw(&mut self, _dt: f32) {
            push(&self.0, "ui_draw");
        }
    }

    struct LoggingRunner(Log);

    impl ScriptRunner for LoggingRunner {
        fn on_update(&mut self, _script: ScriptHandle) {
            push(&self.0, "script");
        }
    }

    #[test]
    fn editing_tick_follows_the_fixed_step_order() {
        let log = Log::default();
        let dir = tempfile::tempdir().unwrap();
        let scene_path = dir.path().join(shaders::SCENE_FILE);
        std::fs::write(&scene_path, shaders::SCENE_WGSL).unwrap();
        std::fs::write(dir.path().join(shaders::OBJECT_ID_FILE), shaders::OBJECT_ID_WGSL).unwrap();

        let mut renderer = LoggingRenderer {
            inner: SoftwareRenderer::new(VIEWPORT),
            log: log.clone(),
            drawn_sources: Vec::new(),
        };
        let mut hot = HotReloader::new(Duration::ZERO);
        let loader = ResourceLoader::from_dir(dir.path());
        let loaded = load_editor_shaders(&mut renderer, &loader, &mut hot).unwrap();

        let mut store = ComponentStore::new();
        let e = store.spawn().unwrap();
        store.insert(e, Transform::default()).unwrap();
        store.insert(e, Model::new(MeshHandle::CUBE)).unwrap();
        store.insert(e, Shader(loaded.scene)).unwrap();
        store.insert(e, Script(ScriptHandle(0))).unwrap();

        let camera = FlyCamera::looking_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, VIEWPORT.aspect());
        let mut editor =
            FrameOrchestrator::new(renderer, store, loaded.pick, &EditorConfig::default())
                .with_camera(LoggingCamera(SceneCamera::new(camera), log.clone()))
                .with_hot_reload(LoggingHotReload(hot, log.clone()))
                .with_ui(LoggingUi(log.clone()))
                .with_script_runner(LoggingRunner(log.clone()))
                .with_clock(FrameClock::fixed(1.0 / 60.0));

        // Edited on disk before the tick: the poller must reload it before
        // this tick's scene draw.
        let edited = format!("{}\n// tinted\n", shaders::SCENE_WGSL);
        std::fs::write(&scene_path, &edited).unwrap();
        let mut window = LoggingWindow {
            input: InputState::new(),
            log: log.clone(),
        };

        editor.tick(&mut window).unwrap();

        assert_eq!(
            *log.borrow(),
            vec![
                "poll",
                "camera",
                "hot_reload",
                "reload",
                "ui_update",
                "script",
                "uniforms",
                "begin scene_target",
                "draw",
                "end",
                "begin pick_target",
                "object_id",
                "draw",
                "end",
                "bind_surface",
                "ui_begin",
                "ui_draw",
                "ui_end",
                "present",
            ]
        );
        assert_eq!(editor.renderer().drawn_sources.first(), Some(&edited));
    }
}
