use crate::scene::camera::Camera;
use crate::scene::transform::ModelTransform;
use minifb::{KeyRepeat, MouseButton, MouseMode, Window};

/// Keys the viewer reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    W,
    A,
    S,
    D,
    Space,
    LeftShift,
    R,
    E,
    Up,
    Down,
    Left,
    Right,
    PageUp,
    PageDown,
    Plus,
    Minus,
    Escape,
    F12,
}

impl Key {
    fn from_minifb(key: minifb::Key) -> Option<Self> {
        use minifb::Key as K;
        Some(match key {
            K::W => Key::W,
            K::A => Key::A,
            K::S => Key::S,
            K::D => Key::D,
            K::Space => Key::Space,
            K::LeftShift => Key::LeftShift,
            K::R => Key::R,
            K::E => Key::E,
            K::Up => Key::Up,
            K::Down => Key::Down,
            K::Left => Key::Left,
            K::Right => Key::Right,
            K::PageUp => Key::PageUp,
            K::PageDown => Key::PageDown,
            K::Equal | K::NumPadPlus => Key::Plus,
            K::Minus | K::NumPadMinus => Key::Minus,
            K::Escape => Key::Escape,
            K::F12 => Key::F12,
            _ => return None,
        })
    }
}

/// Input as polled once per frame.
pub trait InputState {
    fn is_key_down(&self, key: Key) -> bool;

    /// True only on the frame the key went down.
    fn was_key_pressed(&self, key: Key) -> bool;

    /// Cursor movement since last frame while the left button is held.
    fn drag_delta(&self) -> (f32, f32);

    /// Vertical scroll since last frame.
    fn scroll_delta(&self) -> f32;
}

/// Snapshot of a minifb window's input, refreshed by [`MinifbInput::poll`].
#[derive(Debug, Default)]
pub struct MinifbInput {
    down: Vec<Key>,
    pressed: Vec<Key>,
    drag: (f32, f32),
    scroll: f32,
    last_mouse_pos: Option<(f32, f32)>,
}

impl MinifbInput {
    pub fn poll(&mut self, window: &Window) {
        self.down = window.get_keys().into_iter().filter_map(Key::from_minifb).collect();
        self.pressed = window
            .get_keys_pressed(KeyRepeat::No)
            .into_iter()
            .filter_map(Key::from_minifb)
            .collect();

        self.scroll = window.get_scroll_wheel().map_or(0.0, |(_, y)| y);

        self.drag = (0.0, 0.0);
        if window.get_mouse_down(MouseButton::Left) {
            if let Some((x, y)) = window.get_mouse_pos(MouseMode::Pass) {
                if let Some((last_x, last_y)) = self.last_mouse_pos {
                    self.drag = (x - last_x, y - last_y);
                }
                self.last_mouse_pos = Some((x, y));
            }
        } else {
            self.last_mouse_pos = None;
        }
    }
}

impl InputState for MinifbInput {
    fn is_key_down(&self, key: Key) -> bool {
        self.down.contains(&key)
    }

    fn was_key_pressed(&self, key: Key) -> bool {
        self.pressed.contains(&key)
    }

    fn drag_delta(&self) -> (f32, f32) {
        self.drag
    }

    fn scroll_delta(&self) -> f32 {
        self.scroll
    }
}

/// Maps held keys, mouse drag and scroll onto the camera and the model
/// transform. Holds no per-frame state of its own.
pub struct ViewerController {
    /// World units per second.
    pub speed: f32,
    /// Degrees per pixel of drag.
    pub sensitivity: f32,
    /// Degrees of fov per scroll step.
    pub zoom_speed: f32,
}

impl Default for ViewerController {
    fn default() -> Self {
        Self {
            speed: 1.5,
            sensitivity: 0.2,
            zoom_speed: 1.0,
        }
    }
}

impl ViewerController {
    pub fn new(speed: f32, sensitivity: f32, zoom_speed: f32) -> Self {
        Self {
            speed,
            sensitivity,
            zoom_speed,
        }
    }

    pub fn update<I: InputState + ?Sized>(
        &self,
        input: &I,
        camera: &mut Camera,
        model: &mut ModelTransform,
        dt: f32,
    ) {
        // --- Camera movement ---
        let step = self.speed * dt;
        if input.is_key_down(Key::W) {
            camera.position += camera.front() * step;
        }
        if input.is_key_down(Key::S) {
            camera.position -= camera.front() * step;
        }
        if input.is_key_down(Key::A) {
            camera.position -= camera.right() * step;
        }
        if input.is_key_down(Key::D) {
            camera.position += camera.right() * step;
        }
        if input.is_key_down(Key::Space) {
            camera.position += camera.up() * step;
        }
        if input.is_key_down(Key::LeftShift) {
            camera.position -= camera.up() * step;
        }

        // --- Look around ---
        let (dx, dy) = input.drag_delta();
        if dx != 0.0 || dy != 0.0 {
            camera.set_yaw(camera.yaw() + dx * self.sensitivity);
            camera.set_pitch(camera.pitch() - dy * self.sensitivity);
        }

        let scroll = input.scroll_delta();
        if scroll != 0.0 {
            camera.set_fov(camera.fov() - scroll * self.zoom_speed);
        }

        // --- Model transform ---
        if input.is_key_down(Key::R) {
            model.rotate_y(dt);
        }
        if input.is_key_down(Key::E) {
            model.rotate_y_reverse(dt);
        }
        if input.is_key_down(Key::Up) {
            model.translate_up(dt);
        }
        if input.is_key_down(Key::Down) {
            model.translate_down(dt);
        }
        if input.is_key_down(Key::Left) {
            model.translate_left(dt);
        }
        if input.is_key_down(Key::Right) {
            model.translate_right(dt);
        }
        if input.is_key_down(Key::PageUp) {
            model.translate_forward(dt);
        }
        if input.is_key_down(Key::PageDown) {
            model.translate_backward(dt);
        }
        if input.is_key_down(Key::Plus) {
            model.scale_up(dt);
        }
        if input.is_key_down(Key::Minus) {
            model.scale_down(dt);
        }
    }
}
