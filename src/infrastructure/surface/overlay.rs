//! Full-screen banner on the Wayland overlay layer
//!
//! Uses smithay-client-toolkit to create a layer-shell surface that:
//! - Covers the whole output (anchored to all four edges)
//! - Renders on the overlay layer, above every window
//! - Has no keyboard interactivity and no exclusive zone (click-through)
//! - Fades the banner in and out over the banner's lifetime
//!
//! Each banner runs its own Wayland connection on a dedicated thread. When
//! the compositor has no layer-shell support the factory falls back to a
//! desktop notification.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, TryRecvError};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use smithay_client_toolkit::{
    compositor::{CompositorHandler, CompositorState},
    delegate_compositor, delegate_layer, delegate_output, delegate_registry, delegate_shm,
    output::{OutputHandler, OutputState},
    registry::{ProvidesRegistryState, RegistryState},
    registry_handlers,
    shell::{
        wlr_layer::{
            Anchor, KeyboardInteractivity, Layer, LayerShell, LayerShellHandler, LayerSurface,
            LayerSurfaceConfigure,
        },
        WaylandSurface,
    },
    shm::{
        slot::{Buffer, SlotPool},
        Shm, ShmHandler,
    },
};
use tiny_skia::{
    Color, GradientStop, LinearGradient, Paint, Pixmap, Point, PremultipliedColorU8, Rect,
    SpreadMode, Transform,
};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};
use wayland_client::{
    globals::registry_queue_init,
    protocol::{wl_output, wl_shm, wl_surface},
    Connection, EventQueue, QueueHandle,
};

use super::desktop::DesktopSurfaceFactory;
use crate::application::ports::{CloseSignal, Surface, SurfaceError, SurfaceFactory};
use crate::domain::banner::PushBanner;

/// Redraw interval while the banner fades
const FRAME_INTERVAL: Duration = Duration::from_millis(33);

/// Title height relative to the output width (matches the page's 9vw)
const TITLE_SCALE: f32 = 0.09;
const SUBTITLE_SCALE: f32 = 0.016;

/// Bold sans fonts commonly shipped by distributions
const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Bold.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Bold.ttf",
    "/usr/share/fonts/noto/NotoSans-Bold.ttf",
];

fn title_color() -> Color {
    Color::from_rgba8(200, 162, 90, 255)
}

fn subtitle_color() -> Color {
    Color::from_rgba8(191, 184, 165, 255)
}

/// Error type for the overlay surface
#[derive(Debug, thiserror::Error)]
pub enum OverlayError {
    #[error("Failed to connect to Wayland: {0}")]
    Connection(#[from] wayland_client::ConnectError),
    #[error("Failed to initialize registry: {0}")]
    Registry(#[from] wayland_client::globals::GlobalError),
    #[error("Layer shell not available (compositor doesn't support wlr-layer-shell)")]
    LayerShellNotAvailable,
    #[error("Wayland dispatch error: {0}")]
    Dispatch(#[from] wayland_client::DispatchError),
    #[error("Wayland error: {0}")]
    Wayland(#[from] wayland_client::backend::WaylandError),
    #[error("Failed to create buffer: {0}")]
    Buffer(String),
    #[error("Failed to start overlay thread: {0}")]
    Thread(#[from] std::io::Error),
}

/// Close signal shared between the surface and its Wayland thread.
/// Whoever takes it first decides whether it fires.
type SharedSignal = Arc<Mutex<Option<CloseSignal>>>;

fn take_signal(signal: &SharedSignal) -> Option<CloseSignal> {
    signal.lock().unwrap_or_else(|e| e.into_inner()).take()
}

/// Opens a full-screen overlay per banner, or a desktop notification when
/// the session has no layer-shell compositor
pub struct OverlaySurfaceFactory {
    fallback: DesktopSurfaceFactory,
    unavailable: AtomicBool,
}

impl OverlaySurfaceFactory {
    pub fn new() -> Self {
        Self {
            fallback: DesktopSurfaceFactory::new(),
            unavailable: AtomicBool::new(false),
        }
    }

    async fn open_overlay(
        &self,
        banner: &PushBanner,
        signal: SharedSignal,
    ) -> Result<OverlaySurface, OverlayError> {
        let (stop_tx, stop_rx) = mpsc::channel();
        let (ready_tx, ready_rx) = oneshot::channel();
        let banner = banner.clone();
        let thread_signal = Arc::clone(&signal);

        let thread = std::thread::Builder::new()
            .name("you-pushed-overlay".to_string())
            .spawn(move || run_overlay(banner, stop_rx, thread_signal, ready_tx))?;

        match ready_rx.await {
            Ok(Ok(())) => Ok(OverlaySurface {
                stop: Mutex::new(Some(stop_tx)),
                thread: Mutex::new(Some(thread)),
                signal,
            }),
            Ok(Err(e)) => Err(e),
            // Thread died before reporting
            Err(_) => Err(OverlayError::LayerShellNotAvailable),
        }
    }
}

impl Default for OverlaySurfaceFactory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SurfaceFactory for OverlaySurfaceFactory {
    fn name(&self) -> &'static str {
        "overlay"
    }

    async fn open(
        &self,
        banner: &PushBanner,
        on_close: CloseSignal,
    ) -> Result<Box<dyn Surface>, SurfaceError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return self.fallback.open(banner, on_close).await;
        }

        let signal: SharedSignal = Arc::new(Mutex::new(Some(on_close)));
        match self.open_overlay(banner, Arc::clone(&signal)).await {
            Ok(surface) => {
                info!("overlay banner shown");
                Ok(Box::new(surface))
            }
            Err(e) => {
                warn!(error = %e, "overlay unavailable, using desktop notifications");
                self.unavailable.store(true, Ordering::SeqCst);
                let on_close = take_signal(&signal).unwrap_or_else(CloseSignal::noop);
                self.fallback.open(banner, on_close).await
            }
        }
    }
}

/// A banner shown on its own Wayland thread
struct OverlaySurface {
    /// Dropping the sender stops the thread
    stop: Mutex<Option<mpsc::Sender<()>>>,
    thread: Mutex<Option<JoinHandle<()>>>,
    signal: SharedSignal,
}

#[async_trait]
impl Surface for OverlaySurface {
    async fn dispose(&self) -> Result<(), SurfaceError> {
        // Taking the signal first keeps our own teardown from reporting a close
        drop(take_signal(&self.signal));
        drop(self.stop.lock().unwrap_or_else(|e| e.into_inner()).take());

        let thread = self.thread.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(thread) = thread {
            tokio::task::spawn_blocking(move || thread.join())
                .await
                .map_err(|e| SurfaceError::DisposeFailed(format!("Task join error: {}", e)))?
                .map_err(|_| SurfaceError::DisposeFailed("overlay thread panicked".into()))?;
            debug!("overlay banner removed");
        }
        Ok(())
    }
}

/// How the event loop ended
enum Exit {
    Stopped,
    Closed,
}

fn run_overlay(
    banner: PushBanner,
    stop: mpsc::Receiver<()>,
    signal: SharedSignal,
    ready: oneshot::Sender<Result<(), OverlayError>>,
) {
    let connected = Connection::connect_to_env()
        .map_err(OverlayError::from)
        .and_then(|conn| BannerOverlay::connect(&conn, banner).map(|app| (conn, app)));
    let (_conn, (mut event_queue, mut app)) = match connected {
        Ok(connected) => connected,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };
    if ready.send(Ok(())).is_err() {
        return;
    }

    let external_close = match run_loop(&mut event_queue, &mut app, &stop) {
        Ok(Exit::Stopped) => false,
        Ok(Exit::Closed) => {
            debug!("overlay closed by the compositor");
            true
        }
        Err(e) => {
            warn!(error = %e, "overlay lost its display connection");
            true
        }
    };

    if external_close {
        if let Some(signal) = take_signal(&signal) {
            signal.fire();
        }
    }
}

fn run_loop(
    event_queue: &mut EventQueue<BannerOverlay>,
    app: &mut BannerOverlay,
    stop: &mpsc::Receiver<()>,
) -> Result<Exit, OverlayError> {
    loop {
        match stop.try_recv() {
            Err(TryRecvError::Empty) => {}
            Ok(()) | Err(TryRecvError::Disconnected) => return Ok(Exit::Stopped),
        }
        if app.closed {
            return Ok(Exit::Closed);
        }

        if let Err(e) = app.draw() {
            warn!(error = %e, "overlay draw error");
        }

        // Dispatch Wayland events, waking up for the next frame
        event_queue.flush()?;
        if let Some(guard) = event_queue.prepare_read() {
            let fd = guard.connection_fd();
            let mut poll_fds = [nix::poll::PollFd::new(fd, nix::poll::PollFlags::POLLIN)];
            let timeout = nix::poll::PollTimeout::from(FRAME_INTERVAL.as_millis() as u16);
            let _ = nix::poll::poll(&mut poll_fds, timeout);
            if let Err(e) = guard.read() {
                let would_block = matches!(
                    &e,
                    wayland_client::backend::WaylandError::Io(io) if io.kind() == std::io::ErrorKind::WouldBlock
                );
                if !would_block {
                    return Err(OverlayError::Wayland(e));
                }
            }
        }
        event_queue.dispatch_pending(app)?;
    }
}

/// Layer-shell state for one banner
struct BannerOverlay {
    registry_state: RegistryState,
    output_state: OutputState,
    _compositor_state: CompositorState,
    shm: Shm,
    _layer_shell: LayerShell,
    layer: LayerSurface,

    pool: SlotPool,
    buffer: Option<Buffer>,
    font: Option<fontdue::Font>,

    banner: PushBanner,
    size: Option<(u32, u32)>,
    base: Option<Pixmap>,
    shown_at: Option<Instant>,
    faded: bool,
    closed: bool,
}

impl BannerOverlay {
    /// Bind the globals and map the full-screen layer surface
    fn connect(
        conn: &Connection,
        banner: PushBanner,
    ) -> Result<(EventQueue<Self>, Self), OverlayError> {
        let (globals, mut event_queue) = registry_queue_init(conn)?;
        let qh = event_queue.handle();

        let registry_state = RegistryState::new(&globals);
        let output_state = OutputState::new(&globals, &qh);
        let compositor_state =
            CompositorState::bind(&globals, &qh).map_err(|_| OverlayError::LayerShellNotAvailable)?;
        let shm = Shm::bind(&globals, &qh).map_err(|_| OverlayError::LayerShellNotAvailable)?;
        let layer_shell =
            LayerShell::bind(&globals, &qh).map_err(|_| OverlayError::LayerShellNotAvailable)?;

        // Grows on the first full-screen buffer
        let pool =
            SlotPool::new(4 * 1024 * 1024, &shm).map_err(|e| OverlayError::Buffer(e.to_string()))?;

        let surface = compositor_state.create_surface(&qh);
        let layer = layer_shell.create_layer_surface(
            &qh,
            surface,
            Layer::Overlay,
            Some("you-pushed"),
            None,
        );
        layer.set_anchor(Anchor::TOP | Anchor::BOTTOM | Anchor::LEFT | Anchor::RIGHT);
        // Zero size lets the compositor stretch the surface over the output
        layer.set_size(0, 0);
        layer.set_keyboard_interactivity(KeyboardInteractivity::None);
        layer.set_exclusive_zone(-1);
        layer.commit();

        let mut app = Self {
            registry_state,
            output_state,
            _compositor_state: compositor_state,
            shm,
            _layer_shell: layer_shell,
            layer,
            pool,
            buffer: None,
            font: load_font(FONT_CANDIDATES.iter().map(Path::new)),
            banner,
            size: None,
            base: None,
            shown_at: None,
            faded: false,
            closed: false,
        };
        if app.font.is_none() {
            warn!("no system font found, overlay shows the band without text");
        }

        event_queue.roundtrip(&mut app)?;
        Ok((event_queue, app))
    }

    /// Draw the next frame of the fade
    fn draw(&mut self) -> Result<(), OverlayError> {
        if self.faded {
            return Ok(());
        }
        let (Some((width, height)), Some(shown_at)) = (self.size, self.shown_at) else {
            return Ok(());
        };

        if self.base.is_none() {
            self.base = Some(render_banner(&self.banner, self.font.as_ref(), width, height)?);
        }
        let Some(base) = self.base.as_ref() else {
            return Ok(());
        };

        let elapsed = shown_at.elapsed();
        let opacity = self.banner.opacity_at(elapsed);
        // The last frame is fully transparent; nothing changes after it
        self.faded = elapsed >= self.banner.lifetime;

        let (buffer, canvas) = self
            .pool
            .create_buffer(
                width as i32,
                height as i32,
                (width * 4) as i32,
                wl_shm::Format::Argb8888,
            )
            .map_err(|e| OverlayError::Buffer(e.to_string()))?;
        write_bgra(base.data(), canvas, opacity);

        buffer
            .attach_to(self.layer.wl_surface())
            .map_err(|e| OverlayError::Buffer(format!("Failed to attach buffer: {}", e)))?;
        self.layer
            .wl_surface()
            .damage_buffer(0, 0, width as i32, height as i32);
        self.layer.commit();

        // Keep the buffer alive until the next frame replaces it
        self.buffer = Some(buffer);
        Ok(())
    }
}

/// First font among `candidates` that exists and parses
fn load_font<'a>(candidates: impl IntoIterator<Item = &'a Path>) -> Option<fontdue::Font> {
    candidates.into_iter().find_map(|path| {
        let data = std::fs::read(path).ok()?;
        match fontdue::Font::from_bytes(data, fontdue::FontSettings::default()) {
            Ok(font) => {
                debug!(path = %path.display(), "overlay font loaded");
                Some(font)
            }
            Err(e) => {
                debug!(path = %path.display(), error = e, "unusable font");
                None
            }
        }
    })
}

/// Fully opaque banner: a dark band through the middle of the screen with
/// the title and subtitle centered on it
fn render_banner(
    banner: &PushBanner,
    font: Option<&fontdue::Font>,
    width: u32,
    height: u32,
) -> Result<Pixmap, OverlayError> {
    let mut pixmap = Pixmap::new(width, height)
        .ok_or_else(|| OverlayError::Buffer(format!("invalid size {}x{}", width, height)))?;
    pixmap.fill(Color::TRANSPARENT);

    let band = Color::from_rgba8(0, 0, 0, 217);
    let stops = vec![
        GradientStop::new(0.0, Color::TRANSPARENT),
        GradientStop::new(0.35, band),
        GradientStop::new(0.65, band),
        GradientStop::new(1.0, Color::TRANSPARENT),
    ];
    let shader = LinearGradient::new(
        Point::from_xy(0.0, 0.0),
        Point::from_xy(0.0, height as f32),
        stops,
        SpreadMode::Pad,
        Transform::identity(),
    );
    let rect = Rect::from_xywh(0.0, 0.0, width as f32, height as f32);
    if let (Some(shader), Some(rect)) = (shader, rect) {
        let mut paint = Paint::default();
        paint.shader = shader;
        pixmap.fill_rect(rect, &paint, Transform::identity(), None);
    }

    if let Some(font) = font {
        let title_size = width as f32 * TITLE_SCALE;
        let subtitle_size = (width as f32 * SUBTITLE_SCALE).max(12.0);
        let center = height as f32 / 2.0;
        draw_text(&mut pixmap, font, banner.title, title_size, center, title_color());
        draw_text(
            &mut pixmap,
            font,
            banner.subtitle,
            subtitle_size,
            center + title_size * 0.6 + subtitle_size,
            subtitle_color(),
        );
    }

    Ok(pixmap)
}

/// Draw `text` centered horizontally with its baseline placed so the glyphs
/// sit around `center_y`
fn draw_text(
    pixmap: &mut Pixmap,
    font: &fontdue::Font,
    text: &str,
    size: f32,
    center_y: f32,
    color: Color,
) {
    let width = pixmap.width();
    let height = pixmap.height();
    let glyphs: Vec<_> = text.chars().map(|ch| font.rasterize(ch, size)).collect();

    let text_width: f32 = glyphs.iter().map(|(m, _)| m.advance_width).sum();
    let cap_height = glyphs.iter().map(|(m, _)| m.height).max().unwrap_or(0) as f32;
    let baseline = center_y + cap_height / 2.0;
    let mut x = (width as f32 - text_width) / 2.0;

    for (metrics, bitmap) in &glyphs {
        let glyph_x = x + metrics.xmin as f32;
        let glyph_y = baseline - metrics.height as f32 - metrics.ymin as f32;

        for gy in 0..metrics.height {
            for gx in 0..metrics.width {
                let coverage = bitmap[gy * metrics.width + gx];
                if coverage == 0 {
                    continue;
                }
                let px = (glyph_x + gx as f32) as i32;
                let py = (glyph_y + gy as f32) as i32;
                if px < 0 || py < 0 || px >= width as i32 || py >= height as i32 {
                    continue;
                }

                let index = (py as u32 * width + px as u32) as usize;
                let existing = pixmap.pixels()[index];
                let alpha = coverage as f32 / 255.0 * color.alpha();
                pixmap.pixels_mut()[index] = blend_over(existing, color, alpha);
            }
        }
        x += metrics.advance_width;
    }
}

/// Source-over blend of `color` at `alpha` onto a premultiplied pixel
fn blend_over(dst: PremultipliedColorU8, color: Color, alpha: f32) -> PremultipliedColorU8 {
    let inv = 1.0 - alpha;
    let channel = |src: f32, dst: u8| (src * alpha * 255.0 + dst as f32 * inv).round();

    let a = channel(1.0, dst.alpha()).clamp(0.0, 255.0) as u8;
    let r = channel(color.red(), dst.red()).clamp(0.0, a as f32) as u8;
    let g = channel(color.green(), dst.green()).clamp(0.0, a as f32) as u8;
    let b = channel(color.blue(), dst.blue()).clamp(0.0, a as f32) as u8;
    PremultipliedColorU8::from_rgba(r, g, b, a).unwrap_or(dst)
}

/// Copy premultiplied RGBA into a little-endian ARGB8888 buffer, scaling
/// every channel by `opacity`
fn write_bgra(src: &[u8], dst: &mut [u8], opacity: f32) {
    let opacity = opacity.clamp(0.0, 1.0);
    let scale = |c: u8| (c as f32 * opacity).round() as u8;
    for (out, px) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        out[0] = scale(px[2]);
        out[1] = scale(px[1]);
        out[2] = scale(px[0]);
        out[3] = scale(px[3]);
    }
}

// SCTK delegate implementations

impl CompositorHandler for BannerOverlay {
    fn scale_factor_changed(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _surface: &wl_surface::WlSurface,
        _new_factor: i32,
    ) {
    }

    fn transform_changed(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _surface: &wl_surface::WlSurface,
        _new_transform: wl_output::Transform,
    ) {
    }

    fn frame(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _surface: &wl_surface::WlSurface,
        _time: u32,
    ) {
    }

    fn surface_enter(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _surface: &wl_surface::WlSurface,
        _output: &wl_output::WlOutput,
    ) {
    }

    fn surface_leave(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _surface: &wl_surface::WlSurface,
        _output: &wl_output::WlOutput,
    ) {
    }
}

impl OutputHandler for BannerOverlay {
    fn output_state(&mut self) -> &mut OutputState {
        &mut self.output_state
    }

    fn new_output(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _output: wl_output::WlOutput,
    ) {
    }

    fn update_output(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _output: wl_output::WlOutput,
    ) {
    }

    fn output_destroyed(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _output: wl_output::WlOutput,
    ) {
    }
}

impl LayerShellHandler for BannerOverlay {
    fn closed(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _layer: &LayerSurface) {
        self.closed = true;
    }

    fn configure(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _layer: &LayerSurface,
        configure: LayerSurfaceConfigure,
        _serial: u32,
    ) {
        let (width, height) = configure.new_size;
        if width == 0 || height == 0 {
            return;
        }
        if self.size != Some((width, height)) {
            self.size = Some((width, height));
            self.base = None;
        }
        // The fade starts with the first frame the compositor lets us draw
        self.shown_at.get_or_insert_with(Instant::now);
    }
}

impl ShmHandler for BannerOverlay {
    fn shm_state(&mut self) -> &mut Shm {
        &mut self.shm
    }
}

impl ProvidesRegistryState for BannerOverlay {
    fn registry(&mut self) -> &mut RegistryState {
        &mut self.registry_state
    }

    registry_handlers![OutputState];
}

delegate_compositor!(BannerOverlay);
delegate_output!(BannerOverlay);
delegate_shm!(BannerOverlay);
delegate_layer!(BannerOverlay);
delegate_registry!(BannerOverlay);
