//! 各种同步原语

use std::sync::Arc;

use ash::vk;

use crate::core::device::RhiDevice;

/// 二元信号量，用于 queue 内部的同步（acquire/present）
pub struct RhiSemaphore {
    semaphore: vk::Semaphore,
    device: Arc<RhiDevice>,
}

impl RhiSemaphore {
    pub fn new(device: Arc<RhiDevice>, debug_name: &str) -> Self {
        let semaphore = unsafe { device.create_semaphore(&vk::SemaphoreCreateInfo::default(), None).unwrap() };

        device.debug_utils.set_object_debug_name(semaphore, debug_name);
        Self { semaphore, device }
    }

    #[inline]
    pub fn handle(&self) -> vk::Semaphore {
        self.semaphore
    }
}

impl Drop for RhiSemaphore {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_semaphore(self.semaphore, None);
        }
    }
}

/// timeline 信号量：一个单调递增的 u64 计数器，CPU 和 GPU 都可以观察到
///
/// GPU 侧通过 submit batch 中的 signal 操作推进计数器；
/// CPU 侧通过 [`Self::wait_timeline`] 阻塞等待计数器到达目标值
pub struct RhiTimelineSemaphore {
    semaphore: vk::Semaphore,
    device: Arc<RhiDevice>,
}

impl RhiTimelineSemaphore {
    pub fn new(device: Arc<RhiDevice>, initial_value: u64, debug_name: &str) -> Self {
        let mut timeline_type_ci = vk::SemaphoreTypeCreateInfo::default()
            .semaphore_type(vk::SemaphoreType::TIMELINE)
            .initial_value(initial_value);
        let timeline_semaphore_ci = vk::SemaphoreCreateInfo::default().push_next(&mut timeline_type_ci);
        let semaphore = unsafe { device.create_semaphore(&timeline_semaphore_ci, None).unwrap() };

        device.debug_utils.set_object_debug_name(semaphore, debug_name);
        Self { semaphore, device }
    }

    #[inline]
    pub fn handle(&self) -> vk::Semaphore {
        self.semaphore
    }

    /// 阻塞当前线程，直到计数器到达 timeline_value
    ///
    /// 等待失败或超时是致命错误：GPU 可能还在读取 CPU 即将复用的资源，
    /// 此时继续执行没有任何安全性可言
    #[inline]
    pub fn wait_timeline(&self, timeline_value: u64, timeout_ns: u64) {
        unsafe {
            let wait_semaphore = [self.semaphore];
            let wait_info = vk::SemaphoreWaitInfo::default()
                .semaphores(&wait_semaphore)
                .values(std::slice::from_ref(&timeline_value));
            self.device
                .wait_semaphores(&wait_info, timeout_ns)
                .expect("timeline semaphore wait failed, GPU-owned resources cannot be reused safely");
        }
    }

    /// 读取 GPU 侧当前的计数器值
    #[inline]
    pub fn current_value(&self) -> u64 {
        unsafe { self.device.get_semaphore_counter_value(self.semaphore).unwrap() }
    }
}

impl Drop for RhiTimelineSemaphore {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_semaphore(self.semaphore, None);
        }
    }
}

/// 便捷创建 image memory barrier 的结构体
pub struct RhiImageBarrier {
    inner: vk::ImageMemoryBarrier2<'static>,
}

impl Default for RhiImageBarrier {
    fn default() -> Self {
        Self {
            inner: vk::ImageMemoryBarrier2 {
                old_layout: vk::ImageLayout::UNDEFINED,
                new_layout: vk::ImageLayout::UNDEFINED,
                src_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
                dst_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
                subresource_range: vk::ImageSubresourceRange {
                    aspect_mask: vk::ImageAspectFlags::empty(),
                    base_array_layer: 0,
                    layer_count: 1,
                    base_mip_level: 0,
                    level_count: 1,
                },
                ..Default::default()
            },
        }
    }
}

impl RhiImageBarrier {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn inner(&self) -> &vk::ImageMemoryBarrier2 {
        &self.inner
    }

    /// builder
    #[inline]
    pub fn layout_transfer(mut self, old_layout: vk::ImageLayout, new_layout: vk::ImageLayout) -> Self {
        self.inner.old_layout = old_layout;
        self.inner.new_layout = new_layout;
        self
    }

    /// builder
    #[inline]
    pub fn src_mask(mut self, src_stage_mask: vk::PipelineStageFlags2, src_access_mask: vk::AccessFlags2) -> Self {
        self.inner.src_stage_mask = src_stage_mask;
        self.inner.src_access_mask = src_access_mask;
        self
    }

    /// builder
    #[inline]
    pub fn dst_mask(mut self, dst_stage_mask: vk::PipelineStageFlags2, dst_access_mask: vk::AccessFlags2) -> Self {
        self.inner.dst_stage_mask = dst_stage_mask;
        self.inner.dst_access_mask = dst_access_mask;
        self
    }

    /// builder
    /// layer 和 miplevel 都使用默认值
    #[inline]
    pub fn image_aspect_flag(mut self, aspect_mask: vk::ImageAspectFlags) -> Self {
        self.inner.subresource_range.aspect_mask = aspect_mask;
        self
    }

    /// builder
    #[inline]
    pub fn image(mut self, image: vk::Image) -> Self {
        self.inner.image = image;
        self
    }
}
