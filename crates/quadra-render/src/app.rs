use ash::vk;
use quadra_crate_tools::init_log::init_log;
use quadra_rhi::rhi::Rhi;
use raw_window_handle::HasDisplayHandle;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::ActiveEventLoop,
    window::WindowId,
};

use crate::{
    platform::timer::Timer,
    renderer::{
        frame_targets::FrameTargets,
        mesh::QuadMesh,
        object_data::ObjectArena,
        orchestrator::FrameOrchestrator,
        pipeline::QuadPipeline,
        texture::QuadTexture,
    },
};

pub fn panic_handler(info: &std::panic::PanicHookInfo) {
    log::error!("{}", info);
}

pub struct AppSettings {
    pub window_title: String,
    pub window_extent: vk::Extent2D,
    /// 每帧绘制的 object 数量
    pub object_num: u32,
    /// 并行录制的 body recorder 数量，必须整除 object_num
    pub body_recorder_num: usize,
}

/// 窗口创建之后才能初始化的渲染状态
///
/// 字段顺序就是 drop 顺序：先销毁各类 vk 资源，然后是 Rhi（device/instance），
/// 最后才是 surface 依赖的原生窗口
struct RenderCtx {
    orchestrator: FrameOrchestrator,
    pipeline: QuadPipeline,
    mesh: QuadMesh,
    texture: QuadTexture,
    arena: ObjectArena,
    targets: FrameTargets,
    rhi: Rhi,
    window: winit::window::Window,

    timer: Timer,
    /// 距离上次输出帧耗时以来的帧数
    frames_since_report: u32,
    last_report_time_s: f32,
}

/// 应用外壳：消息循环 + 每帧驱动一次帧编排器
///
/// populate 回调负责生成 per-object 数据，在窗口创建之后调用一次
pub struct QuadApp<F: FnMut(&mut ObjectArena, f32)> {
    settings: AppSettings,
    populate: F,

    /// 需要等待窗口创建事件之后才能初始化
    ctx: Option<RenderCtx>,
}

impl<F: FnMut(&mut ObjectArena, f32)> QuadApp<F> {
    /// 整个程序的入口
    pub fn run(settings: AppSettings, populate: F) {
        std::panic::set_hook(Box::new(panic_handler));

        init_log();
        log::info!("application start");

        let event_loop = winit::event_loop::EventLoop::new().unwrap();

        let mut app = Self {
            settings,
            populate,
            ctx: None,
        };
        event_loop.run_app(&mut app).unwrap();

        log::info!("end run.");
    }

    /// 在 window 创建之后调用，初始化所有渲染资源
    fn init_after_window(&mut self, event_loop: &ActiveEventLoop) {
        let window_attr = winit::window::Window::default_attributes()
            .with_title(self.settings.window_title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.settings.window_extent.width as f64,
                self.settings.window_extent.height as f64,
            ));
        let window = event_loop.create_window(window_attr).unwrap();

        // 追加 window system 需要的 instance extension，在 windows 下也就是 khr::Surface
        let extra_instance_ext =
            ash_window::enumerate_required_extensions(event_loop.display_handle().unwrap().as_raw())
                .unwrap()
                .iter()
                .map(|ext| unsafe { std::ffi::CStr::from_ptr(*ext) })
                .collect();

        let rhi = Rhi::new(self.settings.window_title.clone(), extra_instance_ext);

        let targets = FrameTargets::new(&rhi, &window);
        let extent = targets.extent();
        let aspect = extent.width as f32 / extent.height as f32;

        let mut arena = ObjectArena::new(&rhi, self.settings.object_num);
        (self.populate)(&mut arena, aspect);

        let mesh = QuadMesh::new(&rhi);
        let texture = QuadTexture::new(&rhi);
        let pipeline = QuadPipeline::new(
            &rhi,
            targets.color_format(),
            vec![arena.descriptor_set_layout(), texture.descriptor_set_layout()],
        );

        let orchestrator = FrameOrchestrator::new(&rhi, self.settings.object_num, self.settings.body_recorder_num);

        self.ctx = Some(RenderCtx {
            orchestrator,
            pipeline,
            mesh,
            texture,
            arena,
            targets,
            rhi,
            window,
            timer: Timer::default(),
            frames_since_report: 0,
            last_report_time_s: 0.0,
        });
    }

    fn update(&mut self) {
        let Some(ctx) = self.ctx.as_mut() else {
            return;
        };

        ctx.orchestrator.draw_frame(&ctx.rhi, &mut ctx.targets, &ctx.pipeline, &ctx.mesh, &ctx.texture, &ctx.arena);

        // 帧耗时统计，每秒输出一次
        ctx.timer.tick();
        ctx.frames_since_report += 1;
        let now_s = ctx.timer.total_time_s();
        if now_s - ctx.last_report_time_s >= 1.0 {
            let avg_ms = (now_s - ctx.last_report_time_s) * 1000.0 / ctx.frames_since_report as f32;
            log::info!(
                "frame {}: {:.2} ms/frame ({:.0} fps)",
                ctx.orchestrator.finished_frame_id(),
                avg_ms,
                1000.0 / avg_ms
            );
            ctx.frames_since_report = 0;
            ctx.last_report_time_s = now_s;
        }
    }
}

impl<F: FnMut(&mut ObjectArena, f32)> ApplicationHandler for QuadApp<F> {
    // 建议在这里创建 window 和渲染资源
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        log::info!("winit event: resumed");
        if self.ctx.is_none() {
            self.init_after_window(event_loop);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                // 不提交任何不完整的帧：等 GPU 消费完已提交的工作再退出循环
                if let Some(ctx) = self.ctx.as_ref() {
                    ctx.rhi.wait_idle();
                }
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => {
                self.update();
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(ctx) = self.ctx.as_ref() {
            ctx.window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        log::info!("loop exiting");
    }
}
