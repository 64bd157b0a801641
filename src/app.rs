use crate::io::config::Config;
use crate::io::image::save_framebuffer_png;
use crate::pipeline::device::{DeviceScope, GraphicsDevice};
use crate::pipeline::mesh_buffer::MeshBuffer;
use crate::pipeline::renderer::Renderer;
use crate::pipeline::shaders::gouraud;
use crate::pipeline::software::SoftwareDevice;
use crate::scene::mesh::Mesh;
use crate::scene::utils::fit_to_unit;
use crate::ui::input::{InputState, Key, MinifbInput, ViewerController};
use anyhow::{Context, Result, bail};
use log::{info, warn};
use minifb::{Window, WindowOptions};
use nalgebra::Vector3;
use std::path::Path;
use std::time::Instant;

/// Loads the configured model and applies the optional fit-to-unit pass.
fn load_mesh(config: &Config) -> Result<Mesh> {
    let path = config
        .model
        .path
        .as_deref()
        .context("No model given; pass a geometry file or set [model].path")?;
    let mut mesh = Mesh::load(path).with_context(|| format!("Failed to load model '{path}'"))?;

    if !mesh.is_ready() {
        bail!("Model '{path}' has no vertices");
    }
    if config.model.fit_to_unit {
        let (center, factor) = fit_to_unit(&mut mesh, 2.0);
        info!(
            "Model normalized. Center: {:?}, Scale: {:.4}",
            center, factor
        );
    }
    Ok(mesh)
}

fn aspect(width: usize, height: usize) -> f32 {
    width as f32 / height as f32
}

/// Device, uploaded mesh and render state shared by both modes.
struct Viewer {
    device: DeviceScope<SoftwareDevice>,
    mesh: MeshBuffer,
    renderer: Renderer,
}

impl Viewer {
    fn new(config: &Config, mesh: &Mesh, width: usize, height: usize) -> Result<Self> {
        let mut device = DeviceScope::new(SoftwareDevice::new(
            width,
            height,
            config.render.cull_mode(),
        ));
        let program = device
            .create_program(gouraud::NAME)
            .context("Failed to link shader program")?;
        let buffer =
            MeshBuffer::from_mesh(&mut device, mesh).context("Failed to upload mesh")?;

        let mut renderer = Renderer::new(
            program,
            config.material.to_material(),
            config.light.light_at(0.0),
        );
        renderer.clear_color = Vector3::from(config.render.background);

        Ok(Self {
            device,
            mesh: buffer,
            renderer,
        })
    }
}

/// Runs the interactive viewer until the window closes or Escape is pressed.
pub fn run_window(config: Config) -> Result<()> {
    let mesh = load_mesh(&config)?;
    let (mut width, mut height) = (config.window.width.max(1), config.window.height.max(1));

    let mut window = Window::new(
        &config.window.title,
        width,
        height,
        WindowOptions {
            resize: true,
            ..WindowOptions::default()
        },
    )
    .context("Failed to create window")?;
    window.set_target_fps(config.window.target_fps);

    let mut viewer = Viewer::new(&config, &mesh, width, height)?;
    let mut camera = config.camera.to_camera(aspect(width, height));
    let mut model = config.model.to_transform();
    let controller = ViewerController::new(
        config.camera.speed,
        config.camera.sensitivity,
        config.camera.zoom_speed,
    );
    let mut input = MinifbInput::default();

    info!("Starting viewer ({}x{})...", width, height);
    info!(
        "Controls: WASD/Space/LeftShift=Move, LeftDrag=Look, Scroll=FOV, R/E=Rotate, \
         Arrows/PageUp/PageDown=Translate, +/-=Scale, F12=Screenshot, Esc=Quit"
    );

    let start = Instant::now();
    let mut last_frame = start;
    let mut frame_count = 0u32;
    let mut last_fps_update = start;
    let mut buffer = Vec::with_capacity(width * height);

    while window.is_open() {
        let now = Instant::now();
        let dt = (now - last_frame).as_secs_f32();
        last_frame = now;

        input.poll(&window);
        if input.is_key_down(Key::Escape) {
            break;
        }

        let (w, h) = window.get_size();
        if w > 0 && h > 0 && (w, h) != (width, height) {
            (width, height) = (w, h);
            viewer.device.resize(width, height);
            camera.set_aspect_ratio(aspect(width, height));
            info!("Viewport resized to {}x{}", width, height);
        }

        controller.update(&input, &mut camera, &mut model, dt);
        viewer.renderer.light = config.light.light_at((now - start).as_secs_f32());

        viewer
            .renderer
            .render_frame(&mut viewer.device, &viewer.mesh, &model.compose(), &camera)
            .context("Render failed")?;

        if input.was_key_pressed(Key::F12) {
            let path = format!("screenshot_{}.png", chrono::Utc::now().timestamp_millis());
            if let Err(e) = save_framebuffer_png(viewer.device.framebuffer(), &path) {
                warn!("Screenshot failed: {}", e);
            }
        }

        viewer.device.present(&mut buffer);
        window
            .update_with_buffer(&buffer, width, height)
            .context("Failed to present frame")?;

        frame_count += 1;
        let elapsed = last_fps_update.elapsed().as_secs_f32();
        if elapsed >= 2.0 {
            info!("Average FPS: {:.1}", frame_count as f32 / elapsed);
            frame_count = 0;
            last_fps_update = Instant::now();
        }
    }

    viewer.mesh.release(&mut viewer.device);
    info!("Viewer closed");
    Ok(())
}

/// Renders a single frame without a window and writes it as PNG.
pub fn render_to_file(config: Config, output: &Path) -> Result<()> {
    let mesh = load_mesh(&config)?;
    let (width, height) = (config.window.width.max(1), config.window.height.max(1));
    let start = Instant::now();

    let mut viewer = Viewer::new(&config, &mesh, width, height)?;
    let camera = config.camera.to_camera(aspect(width, height));
    let model = config.model.to_transform();

    viewer
        .renderer
        .render_frame(&mut viewer.device, &viewer.mesh, &model.compose(), &camera)
        .context("Render failed")?;
    info!("Render completed in {:.2?}", start.elapsed());

    save_framebuffer_png(viewer.device.framebuffer(), output)
        .with_context(|| format!("Failed to save '{}'", output.display()))?;
    Ok(())
}

