use anyhow::Result;
use serde_json::json;
use std::borrow::Cow;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tessel_sdk::prelude::*;

// --- Drawables ---

/// A 3D object that owns a small uniform buffer, created on its first frame.
struct Mesh {
    index: u32,
    uniforms: OnceLock<BufferId>,
    frame: AtomicU32,
    viewport: Arc<Viewport>,
}

impl PrepareDraw for Mesh {
    fn before_draw(&self, renderer: &mut dyn Renderer) -> Result<()> {
        let frame = self.frame.fetch_add(1, Ordering::Relaxed);
        let uniforms = match self.uniforms.get() {
            Some(id) => *id,
            None => {
                let id = renderer.create_buffer(&BufferDescriptor {
                    label: Some(Cow::Owned(format!("mesh-{}-uniforms", self.index))),
                    size: 16,
                    usage: BufferUsage::Uniform,
                })?;
                let _ = self.uniforms.set(id);
                id
            }
        };
        // Animate every 30 frames.
        if frame % 30 == 0 {
            renderer.update_buffer(uniforms, 0, &frame.to_le_bytes())?;
        }
        Ok(())
    }
}

impl Draw3D for Mesh {
    fn on_draw_3d(&self, renderer: &mut dyn Renderer) -> Result<()> {
        renderer.draw(DrawCommand {
            vertex_buffer: BufferId(0),
            index_buffer: None,
            resource_set: None,
            element_count: 36,
            instance_count: 1,
        })?;
        Ok(())
    }
}

impl Drawable for Mesh {
    fn name(&self) -> &str {
        "mesh"
    }

    fn viewport(&self) -> Option<&Viewport> {
        Some(self.viewport.as_ref())
    }

    fn as_prepare(&self) -> Option<&dyn PrepareDraw> {
        Some(self)
    }

    fn as_draw_3d(&self) -> Option<&dyn Draw3D> {
        Some(self)
    }
}

/// A HUD element drawn in 2D.
struct Label {
    viewport: Arc<Viewport>,
}

impl Draw2D for Label {
    fn on_draw_2d(&self, renderer: &mut dyn Renderer) -> Result<()> {
        let size = self.viewport.size();
        renderer.record(RecordedCommand::SetScissor(Rect {
            x: 0,
            y: 0,
            width: size.width,
            height: 32,
        }))?;
        renderer.draw(DrawCommand {
            vertex_buffer: BufferId(1),
            index_buffer: None,
            resource_set: None,
            element_count: 6,
            instance_count: 1,
        })?;
        Ok(())
    }
}

impl Drawable for Label {
    fn name(&self) -> &str {
        "label"
    }

    fn viewport(&self) -> Option<&Viewport> {
        Some(self.viewport.as_ref())
    }

    fn as_draw_2d(&self) -> Option<&dyn Draw2D> {
        Some(self)
    }
}

struct DemoScene {
    drawables: Vec<Arc<dyn Drawable>>,
    viewport: Arc<Viewport>,
}

impl DemoScene {
    fn new(meshes: u32) -> Self {
        let viewport = Arc::new(Viewport::new("main", ViewportSize::new(1280, 720)));
        let mut drawables: Vec<Arc<dyn Drawable>> = (0..meshes)
            .map(|index| {
                Arc::new(Mesh {
                    index,
                    uniforms: OnceLock::new(),
                    frame: AtomicU32::new(0),
                    viewport: Arc::clone(&viewport),
                }) as Arc<dyn Drawable>
            })
            .collect();
        drawables.push(Arc::new(Label {
            viewport: Arc::clone(&viewport),
        }));
        Self {
            drawables,
            viewport,
        }
    }
}

impl FrameSource for DemoScene {
    fn visible_drawables(&mut self) -> Vec<Arc<dyn Drawable>> {
        self.drawables.clone()
    }

    fn viewports(&self) -> Vec<Arc<Viewport>> {
        vec![Arc::clone(&self.viewport)]
    }
}

// --- Workers ---

/// Integrates a falling body once per update tick.
#[derive(Default)]
struct Physics {
    height: f64,
    velocity: f64,
}

impl Worker for Physics {
    fn name(&self) -> &str {
        "physics"
    }

    fn setup(&mut self) -> Result<()> {
        self.height = 100.0;
        Ok(())
    }

    fn step(&mut self) -> Result<()> {
        const DT: f64 = 1.0 / 60.0;
        self.velocity -= 9.81 * DT;
        self.height = (self.height + self.velocity * DT).max(0.0);
        Ok(())
    }

    fn register_commands(table: &mut CommandTable<Self>) -> Result<(), CommandError> {
        table
            .register("Height", |physics: &mut Physics, _| Ok(json!(physics.height)))?
            .register("Impulse", |physics: &mut Physics, cmd| {
                physics.velocity += cmd.arg_f64(0)?;
                Ok(json!(physics.velocity))
            })?;
        Ok(())
    }
}

/// Pretends to stream assets in the background.
#[derive(Default)]
struct Streaming {
    loaded: u64,
}

impl Worker for Streaming {
    fn name(&self) -> &str {
        "streaming"
    }

    fn step(&mut self) -> Result<()> {
        self.loaded += 1;
        Ok(())
    }

    fn async_interval(&self) -> Option<Duration> {
        Some(Duration::from_millis(5))
    }

    fn teardown(&mut self) {
        log::info!("streaming: {} chunk(s) loaded.", self.loaded);
    }

    fn register_commands(table: &mut CommandTable<Self>) -> Result<(), CommandError> {
        table.register("Loaded", |s: &mut Streaming, _| Ok(json!(s.loaded)))?;
        Ok(())
    }
}

/// Counts presented frames on the render tick.
#[derive(Default)]
struct Present {
    frames: u64,
}

impl Worker for Present {
    fn name(&self) -> &str {
        "present"
    }

    fn step(&mut self) -> Result<()> {
        self.frames += 1;
        Ok(())
    }

    fn teardown(&mut self) {
        log::info!("present: {} frame(s).", self.frames);
    }
}

/// Configured once, never ticks.
struct Audio;

impl Worker for Audio {
    fn name(&self) -> &str {
        "audio"
    }

    fn setup(&mut self) -> Result<()> {
        log::info!("audio: mixer configured.");
        Ok(())
    }

    fn step(&mut self) -> Result<()> {
        Ok(())
    }
}

fn main() -> Result<()> {
    tessel_sdk::init_logging();

    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    let host = HeadlessHost::from_config(&config.host)
        .resize_before(60, ViewportSize::new(1920, 1080));

    let device = Arc::new(HeadlessDevice::new());
    let mut engine = Engine::new(
        config,
        Arc::clone(&device) as Arc<dyn GraphicsDevice>,
        Box::new(DemoScene::new(64)),
    )?;

    let physics = engine.register_worker(Physics::default(), SchedulingPolicy::SyncService, 1.0)?;
    let streaming =
        engine.register_worker(Streaming::default(), SchedulingPolicy::AsyncService, 0.5)?;
    engine.register_worker(Present::default(), SchedulingPolicy::SyncRenderService, 0.5)?;
    engine.register_worker(Audio, SchedulingPolicy::None, 0.1)?;

    physics.send(CommandRecord::new("Impulse", vec![json!(5.0)]))?;
    physics.call(CommandRecord::named("Height"), |result| {
        log::info!("physics: height after first tick = {}", result.payload);
    })?;
    streaming.call(CommandRecord::named("Loaded"), |result| {
        log::info!("streaming: {} chunk(s) loaded so far", result.payload);
    })?;

    let summary = host.run(&mut engine, 120)?;

    let submissions = device.submissions();
    let draws: usize = submissions.iter().map(|s| s.draw_count()).sum();
    log::info!(
        "sandbox: {} frame(s), {} submission(s), {} draw call(s), {} idle wait(s), {:.2?}",
        summary.frames,
        submissions.len(),
        draws,
        device.idle_waits(),
        summary.elapsed
    );
    for status in engine.orchestrator().statuses() {
        log::info!(
            "sandbox: worker '{}' {:?} ended {} after {} cycle(s)",
            status.name,
            status.policy,
            status.state,
            status.cycles
        );
    }
    Ok(())
}
