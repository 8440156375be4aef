use ash::vk;
use itertools::Itertools;
use quadra_rhi::{
    core::{
        rendering_info::RhiRenderingInfo,
        swapchain::RhiSwapchain,
        synchronize::{RhiImageBarrier, RhiSemaphore},
    },
    rhi::Rhi,
};

use crate::renderer::{frame_cursor::FrameCursor, recorder::FrameRecorder};

/// 清屏颜色
const CLEAR_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// frame buffer 抽象：presentation engine 轮换的一组 surface + 当前可写入的游标
///
/// 不变式：任意时刻只有游标指向的 surface 可写；
/// presentation engine 和这里的游标对"当前 surface"的认知必须一致
pub struct FrameTargets {
    swapchain: RhiSwapchain,
    cursor: FrameCursor,

    /// acquire 完成时 signal；被当前帧的 submit 等待
    ///
    /// 整帧的 fence 屏障保证了单个信号量就足够：下一次 acquire 之前，
    /// 上一次的 wait 操作一定已经在 GPU 上完成
    image_acquired: RhiSemaphore,

    /// 渲染完成时 signal；被 present 等待。数量和 swapchain 的 image 数量相同
    render_finished: Vec<RhiSemaphore>,
}

impl FrameTargets {
    /// 创建 swapchain（期望双缓冲），并 acquire 第一张 image 来初始化游标
    pub fn new(rhi: &Rhi, window: &winit::window::Window) -> Self {
        let swapchain = RhiSwapchain::new(rhi, window, 2, vk::PresentModeKHR::FIFO);

        let image_acquired = RhiSemaphore::new(rhi.device_arc(), "frame-targets-image-acquired");
        let render_finished = (0..swapchain.image_count())
            .map(|i| RhiSemaphore::new(rhi.device_arc(), &format!("frame-targets-render-finished-{}", i)))
            .collect_vec();

        let initial_index = swapchain.acquire_next_image(&image_acquired) as usize;
        let cursor = FrameCursor::new(swapchain.image_count(), initial_index);

        Self {
            swapchain,
            cursor,
            image_acquired,
            render_finished,
        }
    }

    fn render_area(&self) -> vk::Rect2D {
        vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent: self.swapchain.extent(),
        }
    }

    fn current_image(&self) -> vk::Image {
        self.swapchain.image(self.cursor.current())
    }

    fn current_image_view(&self) -> vk::ImageView {
        self.swapchain.image_view(self.cursor.current())
    }
}

// 录制接口，按一帧内的调用顺序排列
impl FrameTargets {
    /// 录制帧的第一个操作：当前 surface 从可呈现状态转为 render target，并清屏
    ///
    /// 必须录制在专门的 begin recorder 中，保证在所有 body 录制之前执行
    pub fn start_rendering(&self, recorder: &FrameRecorder) {
        let cmd = recorder.cmd();

        // PRESENT/UNDEFINED -> COLOR_ATTACHMENT；内容会被清掉，不需要保留，
        // 因此 old_layout 统一用 UNDEFINED
        cmd.image_memory_barrier(
            vk::DependencyFlags::empty(),
            &[RhiImageBarrier::new()
                .image(self.current_image())
                .image_aspect_flag(vk::ImageAspectFlags::COLOR)
                .layout_transfer(vk::ImageLayout::UNDEFINED, vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
                .src_mask(vk::PipelineStageFlags2::COLOR_ATTACHMENT_OUTPUT, vk::AccessFlags2::empty())
                .dst_mask(
                    vk::PipelineStageFlags2::COLOR_ATTACHMENT_OUTPUT,
                    vk::AccessFlags2::COLOR_ATTACHMENT_WRITE | vk::AccessFlags2::COLOR_ATTACHMENT_READ,
                )],
        );

        // 空的 rendering pass，只为执行 CLEAR load op
        let rendering_info = RhiRenderingInfo::new_clear(self.current_image_view(), self.render_area(), CLEAR_COLOR);
        cmd.cmd_begin_rendering(&rendering_info.rendering_info());
        cmd.end_rendering();
    }

    /// 将当前 surface 绑定为 recorder 后续 draw 的输出目标
    ///
    /// 一帧内幂等：所有 body recorder 都向同一个 surface 绘制，
    /// 每个 recorder 重复调用得到的绑定结果相同（load op 保留已有内容）
    pub fn set_to_render_target(&self, recorder: &FrameRecorder) {
        let rendering_info = RhiRenderingInfo::new_load(self.current_image_view(), self.render_area());
        recorder.cmd().cmd_begin_rendering(&rendering_info.rendering_info());
    }

    /// 录制帧的最后一个操作：当前 surface 转回可呈现状态
    ///
    /// 必须录制在专门的 end recorder 中，保证在所有 body 录制之后执行
    pub fn finish_rendering(&self, recorder: &FrameRecorder) {
        recorder.cmd().image_memory_barrier(
            vk::DependencyFlags::empty(),
            &[RhiImageBarrier::new()
                .image(self.current_image())
                .image_aspect_flag(vk::ImageAspectFlags::COLOR)
                .layout_transfer(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL, vk::ImageLayout::PRESENT_SRC_KHR)
                .src_mask(
                    vk::PipelineStageFlags2::COLOR_ATTACHMENT_OUTPUT,
                    vk::AccessFlags2::COLOR_ATTACHMENT_WRITE,
                )
                .dst_mask(vk::PipelineStageFlags2::BOTTOM_OF_PIPE, vk::AccessFlags2::empty())],
        );
    }
}

// 提交/呈现接口
impl FrameTargets {
    /// 当前帧 submit 需要等待的信号量（image 可用）
    #[inline]
    pub fn image_acquired_semaphore(&self) -> &RhiSemaphore {
        &self.image_acquired
    }

    /// 当前帧 submit 需要 signal 的信号量（渲染完成，present 等待它）
    #[inline]
    pub fn render_finished_semaphore(&self) -> &RhiSemaphore {
        &self.render_finished[self.cursor.current()]
    }

    /// 呈现当前 surface
    pub fn present(&self, rhi: &Rhi) {
        self.swapchain.present(rhi.graphics_queue(), self.cursor.current() as u32, self.render_finished_semaphore());
    }

    /// 向 presentation engine 索要下一个 surface，返回其下标
    ///
    /// 必须在整帧的 fence 等待返回之后调用，此时 image_acquired 信号量才可以复用
    pub fn acquire_next_image(&self) -> u32 {
        self.swapchain.acquire_next_image(&self.image_acquired)
    }

    /// 将游标推进到 presentation engine 报告的下标
    pub fn update_buffer_index(&mut self, new_index: u32) {
        self.cursor.update(new_index as usize);
    }

    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.swapchain.extent()
    }

    #[inline]
    pub fn color_format(&self) -> vk::Format {
        self.swapchain.color_format()
    }

    #[inline]
    pub fn current_index(&self) -> usize {
        self.cursor.current()
    }
}
