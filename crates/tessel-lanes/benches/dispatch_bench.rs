use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::sync::Arc;
use tessel_core::renderer::{BufferId, DrawCommand, GraphicsDevice, Renderer};
use tessel_core::scene::{Draw3D, Drawable};
use tessel_infra::HeadlessDevice;
use tessel_lanes::{partition, DispatchConfig, FrameViews, RenderDispatcher};

struct Quad(u32);

impl Draw3D for Quad {
    fn on_draw_3d(&self, renderer: &mut dyn Renderer) -> anyhow::Result<()> {
        renderer.draw(DrawCommand {
            vertex_buffer: BufferId(0),
            index_buffer: None,
            resource_set: None,
            element_count: 6,
            instance_count: self.0,
        })?;
        Ok(())
    }
}

impl Drawable for Quad {
    fn name(&self) -> &str {
        "quad"
    }

    fn as_draw_3d(&self) -> Option<&dyn Draw3D> {
        Some(self)
    }
}

fn bench_dispatch(c: &mut Criterion) {
    // Setup 10,000 drawables
    let drawables: Vec<Arc<dyn Drawable>> = (0..10_000)
        .map(|i| Arc::new(Quad(i % 4 + 1)) as Arc<dyn Drawable>)
        .collect();

    let mut group = c.benchmark_group("Render Dispatch");

    group.bench_function("Classify + Chunk (10k)", |b| {
        b.iter(|| {
            let views = FrameViews::classify(black_box(&drawables));
            let view = views.view(tessel_core::renderer::PassKind::Draw3D);
            black_box(partition::chunks(view, 512).count());
        });
    });

    let device = Arc::new(HeadlessDevice::new());
    let mut dispatcher = RenderDispatcher::new(
        Arc::clone(&device) as Arc<dyn GraphicsDevice>,
        DispatchConfig::default(),
    )
    .expect("headless dispatcher");

    group.bench_function("Headless Dispatch (10k)", |b| {
        b.iter(|| {
            let report = dispatcher.dispatch(black_box(&drawables)).unwrap();
            black_box(report.recorded());
            // The journal would otherwise grow with every iteration.
            device.clear_journal();
        });
    });

    group.finish();
}

criterion_group!(benches, bench_dispatch);
criterion_main!(benches);
