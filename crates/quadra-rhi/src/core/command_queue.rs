use std::sync::Arc;

use ash::vk;
use itertools::Itertools;

use crate::core::{
    command_buffer::RhiCommandBuffer,
    device::RhiDevice,
    synchronize::{RhiSemaphore, RhiTimelineSemaphore},
};

#[derive(Clone, Debug)]
pub struct RhiQueueFamily {
    pub name: String,
    pub queue_family_index: u32,
    pub queue_flags: vk::QueueFlags,
    pub queue_count: u32,
}

/// # destroy
///
/// queue 在 device 销毁时会被销毁
pub struct RhiQueue {
    pub(crate) handle: vk::Queue,
    pub(crate) queue_family: RhiQueueFamily,

    pub(crate) device: Arc<RhiDevice>,
}

impl RhiQueue {
    pub fn new(device: Arc<RhiDevice>, queue_family: RhiQueueFamily) -> Self {
        let handle = unsafe { device.get_device_queue(queue_family.queue_family_index, 0) };
        device.debug_utils.set_object_debug_name(handle, &queue_family.name);
        Self {
            handle,
            queue_family,
            device,
        }
    }

    #[inline]
    pub fn handle(&self) -> vk::Queue {
        self.handle
    }

    #[inline]
    pub fn queue_family(&self) -> &RhiQueueFamily {
        &self.queue_family
    }

    /// 将若干 batch 按顺序提交到 queue 上
    ///
    /// 同一个 batch 内的 command buffer 按数组顺序开始执行；
    /// 该调用立刻返回，不等待 GPU 完成
    pub fn submit(&self, batches: Vec<RhiSubmitInfo>) {
        unsafe {
            // batches 的存在是有必要的，submit_infos 引用的 batches 的内存
            let submit_infos = batches.iter().map(|b| b.submit_info()).collect_vec();
            self.device.queue_submit2(self.handle, &submit_infos, vk::Fence::null()).unwrap()
        }
    }

    /// 根据 specification，vkQueueWaitIdle 应该和 Fence 效率相同
    #[inline]
    pub fn wait_idle(&self) {
        unsafe { self.device.queue_wait_idle(self.handle).unwrap() }
    }
}

/// RHI 关于 SubmitInfo 的封装，更易用
///
/// wait/signal 都支持 timeline 信号量：value 为 None 表示二元信号量
#[derive(Default)]
pub struct RhiSubmitInfo {
    command_buffers: Vec<vk::CommandBufferSubmitInfo<'static>>,
    wait_infos: Vec<vk::SemaphoreSubmitInfo<'static>>,
    signal_infos: Vec<vk::SemaphoreSubmitInfo<'static>>,
}

impl RhiSubmitInfo {
    pub fn new(commands: &[RhiCommandBuffer]) -> Self {
        Self::new_raw(&commands.iter().map(|cmd| cmd.handle()).collect_vec())
    }

    /// 从裸 handle 构建，command buffer 的 GPU 执行顺序就是数组顺序
    pub fn new_raw(commands: &[vk::CommandBuffer]) -> Self {
        let command_buffers =
            commands.iter().map(|cmd| vk::CommandBufferSubmitInfo::default().command_buffer(*cmd)).collect_vec();

        Self {
            command_buffers,
            wait_infos: vec![],
            signal_infos: vec![],
        }
    }

    /// builder
    #[inline]
    pub fn wait(mut self, semaphore: &RhiSemaphore, stage: vk::PipelineStageFlags2) -> Self {
        self.wait_infos.push(vk::SemaphoreSubmitInfo::default().semaphore(semaphore.handle()).stage_mask(stage));
        self
    }

    /// builder
    #[inline]
    pub fn signal(mut self, semaphore: &RhiSemaphore, stage: vk::PipelineStageFlags2) -> Self {
        self.signal_infos.push(vk::SemaphoreSubmitInfo::default().semaphore(semaphore.handle()).stage_mask(stage));
        self
    }

    /// builder
    ///
    /// 在 batch 内所有 command buffer 之后，将 timeline 信号量推进到 value
    #[inline]
    pub fn signal_timeline(mut self, semaphore: &RhiTimelineSemaphore, value: u64) -> Self {
        self.signal_infos.push(
            vk::SemaphoreSubmitInfo::default()
                .semaphore(semaphore.handle())
                .stage_mask(vk::PipelineStageFlags2::ALL_COMMANDS)
                .value(value),
        );
        self
    }

    pub(crate) fn submit_info(&self) -> vk::SubmitInfo2<'_> {
        vk::SubmitInfo2::default()
            .command_buffer_infos(&self.command_buffers)
            .wait_semaphore_infos(&self.wait_infos)
            .signal_semaphore_infos(&self.signal_infos)
    }
}
