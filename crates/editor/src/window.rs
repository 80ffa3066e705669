use bubble_input::InputState;
use std::collections::VecDeque;

/// Platform window driven by the frame orchestrator.
pub trait Window {
    /// Non-blocking; updates [`Window::input`] for this tick.
    fn poll_events(&mut self);

    fn should_close(&self) -> bool;

    fn input(&self) -> &InputState;

    /// Bind the window's own surface as the render target for UI drawing.
    fn bind_surface(&mut self);

    fn ui_begin(&mut self);

    /// Composite the UI frame onto the surface.
    fn ui_end(&mut self);

    /// Present the frame.
    fn on_update(&mut self);
}

type InputScript = Box<dyn FnOnce(&mut InputState)>;

/// Window without a platform surface. Closes after a fixed number of frames.
pub struct HeadlessWindow {
    input: InputState,
    scripted: VecDeque<InputScript>,
    close_after: Option<u64>,
    pub polls: u64,
    pub presents: u64,
    pub surface_binds: u64,
    pub ui_frames: u64,
    ui_open: bool,
}

impl HeadlessWindow {
    /// Window that never requests close on its own.
    pub fn new() -> Self {
        Self {
            input: InputState::new(),
            scripted: VecDeque::new(),
            close_after: None,
            polls: 0,
            presents: 0,
            surface_binds: 0,
            ui_frames: 0,
            ui_open: false,
        }
    }

    /// Window that requests close once `frames` frames have been presented.
    pub fn closing_after(frames: u64) -> Self {
        Self {
            close_after: Some(frames),
            ..Self::new()
        }
    }

    /// Queue input applied by one future `poll_events`, one closure per poll.
    pub fn script_frame(&mut self, frame: impl FnOnce(&mut InputState) + 'static) {
        self.scripted.push_back(Box::new(frame));
    }
}

impl Default for HeadlessWindow {
    fn default() -> Self {
        Self::new()
    }
}

impl Window for HeadlessWindow {
    fn poll_events(&mut self) {
        self.polls += 1;
        self.input.begin_frame();
        if let Some(frame) = self.scripted.pop_front() {
            frame(&mut self.input);
        }
    }

    fn should_close(&self) -> bool {
        self.close_after.is_some_and(|n| self.presents >= n)
    }

    fn input(&self) -> &InputState {
        &self.input
    }

    fn bind_surface(&mut self) {
        self.surface_binds += 1;
    }

    fn ui_begin(&mut self) {
        self.ui_open = true;
    }

    fn ui_end(&mut self) {
        if std::mem::take(&mut self.ui_open) {
            self.ui_frames += 1;
        }
    }

    fn on_update(&mut self) {
        self.presents += 1;
    }
}
