use crate::interaction::PointerInput;
use crate::render::Render;
use crate::simulation::Simulation;
use crate::surface::{draw_particles, PixelBuffer};
use crate::{Result, SimError, SimParams};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use winit::event::{ElementState, MouseButton};
use winit::keyboard::*;
use winit::{
  dpi::PhysicalSize,
  event::{Event, KeyEvent, WindowEvent},
  event_loop::{EventLoop, EventLoopWindowTarget},
  window::Window,
};

const WINDOW_TITLE: &str = "Particle Sim";

/// Fixed-step run without a window.
#[derive(Copy, Clone, Debug)]
pub struct HeadlessRun {
  pub ticks: u64,
  pub dt: f32,
}

struct EventLoopWrapper {
  event_loop: EventLoop<()>,
  window: Arc<Window>,
}

impl EventLoopWrapper {
  pub fn new(title: &str, size: PhysicalSize<u32>) -> Result<Self> {
    let event_loop = EventLoop::new()?;
    let builder = winit::window::WindowBuilder::new()
      .with_title(title)
      .with_inner_size(size)
      .with_resizable(false);
    let window = Arc::new(builder.build(&event_loop)?);

    Ok(Self { event_loop, window })
  }
}

struct SurfaceWrapper {
  surface: wgpu::Surface<'static>,
  config: wgpu::SurfaceConfiguration,
}

impl SurfaceWrapper {
  fn configure(context: &GpuContext, surface: wgpu::Surface<'static>, window: &Window) -> Result<Self> {
    let window_size = window.inner_size();
    let width = window_size.width.max(1);
    let height = window_size.height.max(1);
    let mut config = surface
      .get_default_config(&context.adapter, width, height)
      .ok_or_else(|| SimError::Surface("surface is not supported by the adapter".into()))?;
    let view_format = config.format.add_srgb_suffix();
    config.view_formats.push(view_format);
    surface.configure(&context.device, &config);
    Ok(Self { surface, config })
  }

  /// Next frame to draw into, or `None` if this frame should be skipped.
  fn acquire(&mut self, context: &GpuContext) -> Result<Option<wgpu::SurfaceTexture>> {
    match self.surface.get_current_texture() {
      Ok(frame) => Ok(Some(frame)),
      Err(wgpu::SurfaceError::Timeout) => Ok(None),
      Err(err @ (wgpu::SurfaceError::Outdated | wgpu::SurfaceError::Lost)) => {
        log::warn!("surface {err}, reconfiguring");
        self.surface.configure(&context.device, &self.config);
        Ok(self.surface.get_current_texture().ok())
      }
      Err(err @ wgpu::SurfaceError::OutOfMemory) => Err(SimError::Surface(err.to_string())),
    }
  }
}

struct GpuContext {
  adapter: wgpu::Adapter,
  device: wgpu::Device,
  queue: wgpu::Queue,
}

impl GpuContext {
  async fn init(window: Arc<Window>) -> Result<(Self, wgpu::Surface<'static>)> {
    let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
      #[cfg(not(target_arch = "wasm32"))]
      backends: wgpu::Backends::PRIMARY,
      ..Default::default()
    });
    let surface = instance
      .create_surface(window)
      .map_err(|err| SimError::Surface(err.to_string()))?;

    let adapter = instance
      .request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::default(),
        compatible_surface: Some(&surface),
        force_fallback_adapter: false,
      })
      .await
      .ok_or(SimError::Adapter)?;
    log::info!("using adapter {:?}", adapter.get_info().name);

    let (device, queue) = adapter
      .request_device(
        &wgpu::DeviceDescriptor {
          label: None,
          required_features: wgpu::Features::empty(),
          required_limits: wgpu::Limits::default(),
          memory_hints: Default::default(),
        },
        None,
      )
      .await?;

    Ok((
      Self {
        adapter,
        device,
        queue,
      },
      surface,
    ))
  }
}

/// Pointer state as seen through window events.
#[derive(Default)]
struct PointerTracker {
  held: bool,
  position: (i32, i32),
}

impl PointerTracker {
  fn process_events(&mut self, event: &WindowEvent) -> bool {
    match event {
      WindowEvent::CursorMoved { position, .. } => {
        self.position = (position.x as i32, position.y as i32);
        true
      }
      WindowEvent::MouseInput {
        state,
        button: MouseButton::Left,
        ..
      } => {
        self.held = *state == ElementState::Pressed;
        true
      }
      WindowEvent::CursorLeft { .. } => {
        self.held = false;
        true
      }
      _ => false,
    }
  }

  fn snapshot(&self, window_size: PhysicalSize<u32>) -> Option<PointerInput> {
    self.held.then_some(PointerInput {
      held: true,
      position: self.position,
      window_size: (window_size.width, window_size.height),
    })
  }
}

/// Frame time reporting about once a second.
struct FrameReport {
  last_report: Instant,
  frames: u32,
}

impl FrameReport {
  fn new() -> Self {
    Self {
      last_report: Instant::now(),
      frames: 0,
    }
  }

  fn frame(&mut self, window: &Window, sim: &Simulation) {
    self.frames += 1;
    if self.last_report.elapsed().as_secs_f32() < 1.0 {
      return;
    }
    let ms = sim.avg_frame_time() * 1000.0;
    log::info!("frame-time {ms:.1} ms ({} frames)", self.frames);
    window.set_title(&format!("{WINDOW_TITLE} - {ms:.1} ms"));
    self.last_report = Instant::now();
    self.frames = 0;
  }
}

async fn start(mut sim: Simulation) -> Result<()> {
  let params = *sim.params();
  let window_loop = EventLoopWrapper::new(
    WINDOW_TITLE,
    PhysicalSize::new(params.render_width, params.render_height),
  )?;
  let (context, surface) = GpuContext::init(window_loop.window.clone()).await?;
  let mut surface = SurfaceWrapper::configure(&context, surface, &window_loop.window)?;
  let render = Render::init(
    &surface.config,
    &context.device,
    params.render_width,
    params.render_height,
  );

  let mut frame = PixelBuffer::new(params.render_width, params.render_height);
  let mut pointer = PointerTracker::default();
  let mut report = FrameReport::new();
  let mut last_tick = Instant::now();
  let window = window_loop.window.clone();

  window_loop.event_loop.run(move |event, target: &EventLoopWindowTarget<()>| match event {
    Event::WindowEvent { event, window_id } if window_id == window.id() => {
      if pointer.process_events(&event) {
        return;
      }
      match event {
        WindowEvent::CloseRequested
        | WindowEvent::KeyboardInput {
          event:
            KeyEvent {
              state: ElementState::Pressed,
              physical_key: PhysicalKey::Code(KeyCode::Escape),
              ..
            },
          ..
        } => target.exit(),
        WindowEvent::RedrawRequested => {
          window.request_redraw();

          let dt = last_tick.elapsed().as_secs_f32().min(params.max_dt);
          last_tick = Instant::now();
          sim.tick(dt, pointer.snapshot(window.inner_size()));
          draw_particles(&mut frame, sim.particles());
          report.frame(&window, &sim);

          let texture = match surface.acquire(&context) {
            Ok(Some(texture)) => texture,
            Ok(None) => return,
            Err(err) => {
              log::error!("{err}");
              target.exit();
              return;
            }
          };
          let view = texture.texture.create_view(&wgpu::TextureViewDescriptor {
            format: Some(surface.config.view_formats[0]),
            ..wgpu::TextureViewDescriptor::default()
          });
          render.upload(&context.queue, &mut frame);
          render.render(&view, &context.device, &context.queue);
          texture.present();
        }
        _ => {}
      }
    }
    _ => {}
  })?;
  Ok(())
}

fn run_headless(mut sim: Simulation, run: HeadlessRun) -> Result<()> {
  let stop = Arc::new(AtomicBool::new(false));
  let handler_stop = stop.clone();
  if let Err(err) = ctrlc::set_handler(move || handler_stop.store(true, Ordering::SeqCst)) {
    log::warn!("could not install Ctrl-C handler: {err}");
  }

  let started = Instant::now();
  let mut out_of_bounds = 0u64;
  let mut overflowed = 0u64;
  let mut resolved = 0u64;
  while sim.tick_count() < run.ticks && !stop.load(Ordering::SeqCst) {
    let stats = sim.tick(run.dt, None);
    out_of_bounds += u64::from(stats.grid.out_of_bounds);
    overflowed += u64::from(stats.grid.overflowed);
    resolved += u64::from(stats.collisions.resolved);
  }
  if stop.load(Ordering::SeqCst) {
    log::warn!("interrupted after {} ticks", sim.tick_count());
  }

  let elapsed = started.elapsed().as_secs_f64();
  log::info!(
    "ran {} ticks in {elapsed:.2}s ({:.2} ms/tick)",
    sim.tick_count(),
    elapsed * 1000.0 / sim.tick_count().max(1) as f64
  );
  log::info!(
    "kinetic energy {:.1}, {resolved} collisions resolved, {out_of_bounds} out of bounds, {overflowed} cell overflows",
    sim.kinetic_energy()
  );
  Ok(())
}

/// Builds the simulation and runs it either in a window or headless.
pub fn run(params: SimParams, headless: Option<HeadlessRun>) -> Result<()> {
  let sim = Simulation::new(params)?;
  match headless {
    Some(run) => run_headless(sim, run),
    None => pollster::block_on(start(sim)),
  }
}
