//! The showcase window: event loop, state wiring and frame rendering.
//!
//! [`run`] starts in [`AppState::Pending`] and moves to `Running` once winit
//! reports the window can be created. From then on every scroll, resize and
//! model-load completion re-drives the animation from the page geometry, and
//! pointer input is routed through the slider dispatcher.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, trace, warn};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::animation::AnimationMixer;
use crate::camera::{PerspectiveCamera, ResizeParams};
use crate::config::{SectionConfig, ShowcaseConfig};
use crate::dispatcher::SliderDispatcher;
use crate::draw2d::{Color, Draw2d, ImageId, UvRect, clip_left, cover_uv};
use crate::error::AppError;
use crate::gpu::GpuContext;
use crate::import::LoadedScene;
use crate::input::{InputAction, PointerAction, PointerTracker, ScrollCommand};
use crate::lighting::{LightRig, LightUniforms};
use crate::loader::{AssetLoader, LoadEvent, LoadHandle};
use crate::mesh_pass::{GpuScene, MeshPass, collect_draws};
use crate::page::{HANDLE_SIZE, LINE_WIDTH, Page, Rect, SectionKind};
use crate::scroll_driver::{PlaybackHandle, ScrollAnimationDriver};
use crate::slider::{ContainerId, SliderPresentation};
use crate::texture::{ImageData, Texture};

/// Fill shown in place of a comparison image that failed to load.
const PLACEHOLDER_BEFORE: Color = Color::rgb(0.16, 0.16, 0.2);
const PLACEHOLDER_AFTER: Color = Color::rgb(0.32, 0.3, 0.42);
/// Extra size of the shadow ring around the handle.
const HANDLE_RING_WIDTH: f32 = 4.0;

/// Run the showcase until the window is closed.
pub fn run(config: ShowcaseConfig) -> Result<(), AppError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = ShowcaseApp {
        state: AppState::Pending { config },
        fatal: None,
    };
    event_loop.run_app(&mut app)?;

    match app.fatal {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

struct ShowcaseApp {
    state: AppState,
    fatal: Option<AppError>,
}

enum AppState {
    Pending { config: ShowcaseConfig },
    Running(Box<Showcase>),
    Exited,
}

impl ApplicationHandler for ShowcaseApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let AppState::Pending { config } = std::mem::replace(&mut self.state, AppState::Exited)
        else {
            return;
        };

        match Showcase::new(event_loop, config) {
            Ok(showcase) => self.state = AppState::Running(Box::new(showcase)),
            Err(error) => {
                error!(%error, "Failed to start showcase");
                self.fatal = Some(error);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let AppState::Running(showcase) = &mut self.state else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                info!("Window closed");
                event_loop.exit();
            }
            WindowEvent::Resized(_) => showcase.resize(),
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                showcase.pointer.set_scale_factor(scale_factor);
                showcase.resize();
            }
            WindowEvent::RedrawRequested => showcase.frame(),
            event => showcase.handle_input(&event),
        }
    }
}

/// Decoded before/after pair registered with [`Draw2d`].
struct ComparisonImages {
    before: Option<(ImageId, f32)>,
    after: Option<(ImageId, f32)>,
    _textures: Vec<Texture>,
}

/// A loaded model with its GPU copy and animation state.
struct ShowcaseModel {
    scene: LoadedScene,
    gpu_scene: GpuScene,
    mixer: AnimationMixer,
}

struct Showcase {
    window: Arc<Window>,
    gpu: GpuContext,
    config: ShowcaseConfig,
    draw_2d: Draw2d,
    mesh_pass: MeshPass,
    camera: PerspectiveCamera,
    lights: LightUniforms,
    page: Page,
    dispatcher: SliderDispatcher,
    pointer: PointerTracker,
    driver: ScrollAnimationDriver,
    loader: Option<LoadHandle>,
    model: Option<ShowcaseModel>,
    comparisons: BTreeMap<ContainerId, ComparisonImages>,
    resize: Option<ResizeParams>,
    last_frame: Instant,
}

impl Showcase {
    fn new(event_loop: &ActiveEventLoop, config: ShowcaseConfig) -> Result<Self, AppError> {
        let attributes = WindowAttributes::default()
            .with_title(&config.window.title)
            .with_inner_size(LogicalSize::new(config.window.width, config.window.height));
        let window = Arc::new(event_loop.create_window(attributes)?);
        let gpu = GpuContext::new(window.clone())?;

        let scale_factor = window.scale_factor();
        let logical: LogicalSize<f32> = window.inner_size().to_logical(scale_factor);

        let mut draw_2d = Draw2d::new(&gpu);
        let mesh_pass = MeshPass::new(&gpu);
        let camera = PerspectiveCamera::from_config(
            &config.camera,
            logical.width / logical.height.max(1.0),
        );
        let lights = LightRig::new(config.lights.clone())
            .uniforms(config.renderer.exposure, config.renderer.tone_mapping);

        let page = Page::from_config(&config.sections, logical.width, logical.height);
        let mut dispatcher = SliderDispatcher::new();
        for id in page.containers() {
            dispatcher.register(id);
        }
        debug!(containers = dispatcher.len(), "Sliders registered");

        let comparisons = load_comparisons(&gpu, &mut draw_2d, &config.sections, &page);
        let pointer = PointerTracker::new(scale_factor, config.scroll.line_height, logical.height);
        let driver = ScrollAnimationDriver::new().with_lead_in(config.scroll.lead_in);
        let loader = Some(AssetLoader::new().load(&config.model.path));

        let mut showcase = Self {
            window,
            gpu,
            config,
            draw_2d,
            mesh_pass,
            camera,
            lights,
            page,
            dispatcher,
            pointer,
            driver,
            loader,
            model: None,
            comparisons,
            resize: None,
            last_frame: Instant::now(),
        };
        showcase.resize();
        showcase.drive_animation();
        showcase.window.request_redraw();
        info!("Showcase ready");
        Ok(showcase)
    }

    /// Recompute everything derived from the window size.
    fn resize(&mut self) {
        let scale_factor = self.window.scale_factor();
        let logical: LogicalSize<f32> = self.window.inner_size().to_logical(scale_factor);
        let Some(params) = ResizeParams::compute(
            logical.width,
            logical.height,
            scale_factor as f32,
            self.config.renderer.max_pixel_ratio,
        ) else {
            return;
        };

        if self.resize != Some(params) {
            debug!(?params, "Resized");
        }
        self.gpu.resize(params.surface_width, params.surface_height);
        self.mesh_pass.ensure_target_size(&self.gpu, &params);
        self.camera.set_aspect(params.aspect);
        self.page.set_viewport(logical.width, logical.height);
        self.pointer.set_viewport_height(logical.height);
        self.resize = Some(params);

        self.drive_animation();
        self.window.request_redraw();
    }

    /// Scrub the first clip to the showcase section's scroll position.
    fn drive_animation(&mut self) {
        if self.config.model.autoplay {
            return;
        }
        let Some(model) = &mut self.model else {
            return;
        };
        let state = self.page.showcase_scroll_state();
        if let Some(mapped) = self.driver.drive(state, model.mixer.clip_action(0)) {
            trace!(progress = mapped.progress, time = mapped.target_time, "Animation scrubbed");
            model.mixer.apply(&mut model.scene.graph);
        }
    }

    fn handle_input(&mut self, event: &WindowEvent) {
        let actions = self
            .pointer
            .handle_event(event, |x, y| self.page.container_at(x, y));
        if actions.is_empty() {
            return;
        }

        for action in actions {
            match action {
                InputAction::Pointer(pointer) => self.apply_pointer(pointer),
                InputAction::Scroll(command) => {
                    let changed = match command {
                        ScrollCommand::By(delta) => self.page.scroll_by(delta),
                        ScrollCommand::ToTop => self.page.scroll_to(0.0),
                        ScrollCommand::ToBottom => self.page.scroll_to(self.page.max_scroll()),
                    };
                    if changed {
                        self.drive_animation();
                    }
                }
            }
        }
        self.window.request_redraw();
    }

    fn apply_pointer(&mut self, action: PointerAction) {
        match action {
            PointerAction::Press { container, x, .. } => {
                self.dispatcher.press(container, x, &mut self.page);
            }
            PointerAction::Move { x, .. } => {
                self.dispatcher.pointer_move(x, &mut self.page);
            }
            PointerAction::Release { .. } => {
                self.dispatcher.release();
            }
            PointerAction::Click { container, x, y } => {
                let on_handle = self.page.handle_hit(container, x, y);
                self.dispatcher.click(container, x, on_handle, &mut self.page);
            }
        }
    }

    /// Deliver pending load events; installs the model on success.
    fn poll_loader(&mut self) {
        let Some(handle) = &mut self.loader else {
            return;
        };

        let mut outcome = None;
        handle.drain(|event| {
            if let Some(percent) = event.percent() {
                info!("Loading model: {percent:.2}%");
            }
            match event {
                LoadEvent::Progress { .. } => {}
                LoadEvent::Success(scene) => outcome = Some(Ok(scene)),
                LoadEvent::Failure(error) => outcome = Some(Err(error)),
            }
        });
        if handle.is_finished() {
            self.loader = None;
        }

        match outcome {
            Some(Ok(scene)) => self.install_model(*scene),
            Some(Err(error)) => error!(%error, path = %self.config.model.path.display(), "Failed to load model"),
            None => {}
        }
    }

    fn install_model(&mut self, scene: LoadedScene) {
        let gpu_scene = self.mesh_pass.upload_scene(&self.gpu, &scene);
        self.camera
            .place_for_model(&scene.cameras, scene.bounds, &self.config.camera);

        let mut mixer = AnimationMixer::new(scene.animations.clone());
        if let Some(action) = mixer.clip_action(0) {
            action.play();
            info!(clip = %action.clip().name, duration = action.duration(), "Animation ready");
        } else {
            info!("Model has no animations");
        }

        info!(
            nodes = scene.graph.len(),
            primitives = gpu_scene.primitive_count(),
            materials = scene.materials.len(),
            "Model loaded"
        );
        self.model = Some(ShowcaseModel {
            scene,
            gpu_scene,
            mixer,
        });
        self.drive_animation();
    }

    fn frame(&mut self) {
        let now = Instant::now();
        let dt = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;

        self.poll_loader();

        let autoplay = self.config.model.autoplay;
        if let Some(model) = self.model.as_mut().filter(|_| autoplay) {
            model.mixer.update(dt);
            model.mixer.apply(&mut model.scene.graph);
        }

        let draws = self
            .model
            .as_ref()
            .map(|m| collect_draws(&m.scene.graph))
            .unwrap_or_default();
        self.mesh_pass
            .prepare(&self.gpu, &self.camera, &self.lights, &draws);

        self.draw_2d.clear();
        self.draw_page();

        let output = match self.gpu.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                debug!("Surface lost; reconfiguring");
                self.gpu.reconfigure();
                self.window.request_redraw();
                return;
            }
            Err(error) => {
                warn!(%error, "Skipping frame");
                return;
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        self.mesh_pass.render_scene(
            &mut encoder,
            self.model.as_ref().map(|m| &m.gpu_scene),
            &draws,
        );

        {
            let background = Color::from_rgba_array(self.config.renderer.background);
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Page Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(background.to_wgpu()),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.mesh_pass.composite(&mut render_pass);
            self.draw_2d.render(
                &self.gpu,
                &mut render_pass,
                [self.page.viewport_width(), self.page.viewport_height()],
            );
        }

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        // Keep frames coming while something changes without input.
        if self.loader.is_some() || (autoplay && self.model.is_some()) {
            self.window.request_redraw();
        }
    }

    fn draw_page(&mut self) {
        let viewport_height = self.page.viewport_height();
        for (index, section) in self.page.sections().iter().enumerate() {
            let Some(rect) = self.page.section_rect(index) else {
                continue;
            };
            if !rect.intersects_viewport(viewport_height) {
                continue;
            }
            if section.background.a > 0.0 {
                self.draw_2d.rect(rect, section.background);
            }

            let SectionKind::Comparison(id) = section.kind else {
                continue;
            };
            let (Some(bounds), Some(presentation)) =
                (self.page.container_bounds(id), self.page.presentation(id))
            else {
                continue;
            };
            let images = self.comparisons.get(&id);
            draw_comparison(
                &mut self.draw_2d,
                &ComparisonLayout::new(
                    bounds,
                    presentation,
                    images.and_then(|i| i.before).map(|(_, aspect)| aspect),
                    images.and_then(|i| i.after).map(|(_, aspect)| aspect),
                ),
                images,
            );
        }
    }
}

fn load_comparisons(
    gpu: &GpuContext,
    draw_2d: &mut Draw2d,
    sections: &[SectionConfig],
    page: &Page,
) -> BTreeMap<ContainerId, ComparisonImages> {
    let pairs = sections.iter().filter_map(|section| match section {
        SectionConfig::Comparison { before, after, .. } => Some((before, after)),
        _ => None,
    });

    page.containers()
        .zip(pairs)
        .map(|(id, (before, after))| {
            let mut textures = Vec::new();
            let mut register = |path: &std::path::Path, label: &str| match ImageData::open(path) {
                Ok(image) => {
                    let texture = Texture::from_image(gpu, &image, label);
                    let registered = (draw_2d.add_texture(gpu, &texture), image.aspect());
                    textures.push(texture);
                    Some(registered)
                }
                Err(error) => {
                    warn!(path = %path.display(), %error, "Failed to load comparison image");
                    None
                }
            };
            let before = register(before, "Comparison Before");
            let after = register(after, "Comparison After");
            (
                id,
                ComparisonImages {
                    before,
                    after,
                    _textures: textures,
                },
            )
        })
        .collect()
}

/// Screen-space quads of one comparison widget.
#[derive(Clone, Copy, Debug, PartialEq)]
struct ComparisonLayout {
    before: (Rect, UvRect),
    after: (Rect, UvRect),
    line: Rect,
    handle: Rect,
}

impl ComparisonLayout {
    fn new(
        bounds: Rect,
        presentation: SliderPresentation,
        before_aspect: Option<f32>,
        after_aspect: Option<f32>,
    ) -> Self {
        let uv = |aspect: Option<f32>| aspect.map_or(crate::draw2d::FULL_UV, |a| cover_uv(bounds, a));
        let reveal = 100.0 - presentation.clip_inset_right;
        let line_x = bounds.left + bounds.width * presentation.line_left / 100.0;
        let handle_x = bounds.left + bounds.width * presentation.handle_left / 100.0;
        let center_y = bounds.top + bounds.height * 0.5;

        Self {
            before: (bounds, uv(before_aspect)),
            after: clip_left(bounds, uv(after_aspect), reveal),
            line: Rect::new(line_x - LINE_WIDTH * 0.5, bounds.top, LINE_WIDTH, bounds.height),
            handle: Rect::new(
                handle_x - HANDLE_SIZE * 0.5,
                center_y - HANDLE_SIZE * 0.5,
                HANDLE_SIZE,
                HANDLE_SIZE,
            ),
        }
    }
}

fn draw_comparison(
    draw_2d: &mut Draw2d,
    layout: &ComparisonLayout,
    images: Option<&ComparisonImages>,
) {
    let (before_rect, before_uv) = layout.before;
    match images.and_then(|i| i.before) {
        Some((id, _)) => draw_2d.image(id, before_rect, before_uv, Color::WHITE),
        None => draw_2d.rect(before_rect, PLACEHOLDER_BEFORE),
    }

    let (after_rect, after_uv) = layout.after;
    match images.and_then(|i| i.after) {
        Some((id, _)) => draw_2d.image(id, after_rect, after_uv, Color::WHITE),
        None => draw_2d.rect(after_rect, PLACEHOLDER_AFTER),
    }

    draw_2d.rect(layout.line, Color::WHITE);
    let ring = Rect::new(
        layout.handle.left - HANDLE_RING_WIDTH,
        layout.handle.top - HANDLE_RING_WIDTH,
        layout.handle.width + HANDLE_RING_WIDTH * 2.0,
        layout.handle.height + HANDLE_RING_WIDTH * 2.0,
    );
    draw_2d.rect(ring, Color::HANDLE_RING);
    draw_2d.rect(layout.handle, Color::WHITE);
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn layout_tracks_presentation() {
        let bounds = Rect::new(100.0, 200.0, 400.0, 300.0);
        let layout =
            ComparisonLayout::new(bounds, SliderPresentation::from_percentage(25.0), None, None);

        assert_eq!(layout.before.0, bounds);
        assert_relative_eq!(layout.after.0.width, 100.0);
        assert_relative_eq!(layout.after.1[2], 0.25);
        assert_relative_eq!(layout.line.left + LINE_WIDTH * 0.5, 200.0);
        assert_relative_eq!(layout.handle.left + HANDLE_SIZE * 0.5, 200.0);
        assert_relative_eq!(layout.handle.top + HANDLE_SIZE * 0.5, 350.0);
    }

    #[test]
    fn layout_matches_page_handle_rect() {
        let config = ShowcaseConfig::default();
        let page = Page::from_config(&config.sections, 1280.0, 800.0);
        let id = page.containers().next().unwrap();

        let layout = ComparisonLayout::new(
            page.container_bounds(id).unwrap(),
            page.presentation(id).unwrap(),
            Some(1.5),
            Some(1.5),
        );
        assert_eq!(Some(layout.handle), page.handle_rect(id));
    }

    #[test]
    fn fully_revealed_after_image_covers_container() {
        let bounds = Rect::new(0.0, 0.0, 300.0, 100.0);
        let layout =
            ComparisonLayout::new(bounds, SliderPresentation::from_percentage(100.0), Some(3.0), Some(3.0));
        assert_eq!(layout.after, layout.before);
    }
}
