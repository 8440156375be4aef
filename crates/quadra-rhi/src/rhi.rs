use std::{ffi::CStr, sync::Arc};

use ash::vk;

use crate::core::{
    command_buffer::RhiCommandBuffer,
    command_pool::RhiCommandPool,
    command_queue::{RhiQueue, RhiSubmitInfo},
    device::RhiDevice,
    instance::RhiInstance,
    physical_device::RhiPhysicalDevice,
};

/// Vulkan 设备上下文：instance、device、graphics queue、内存分配器
///
/// 假定在渲染核心启动之前就已经初始化完成；任何创建失败都是致命错误
pub struct Rhi {
    graphics_queue: RhiQueue,
    temp_graphics_command_pool: RhiCommandPool,

    // 字段顺序就是 drop 顺序：allocator 必须先于 device 销毁，
    // device（最后一个 Arc 引用）必须先于 instance 销毁
    allocator: Arc<vk_mem::Allocator>,
    device: Arc<RhiDevice>,
    physical_device: Arc<RhiPhysicalDevice>,
    instance: RhiInstance,

    /// vk 基础函数的接口
    ///
    /// 在 drop 之后，会卸载 dll，因此需要确保该字段最后 drop
    pub(crate) vk_entry: ash::Entry,
}

/// 创建与销毁
impl Rhi {
    const ENGINE_NAME: &'static str = "Quadra";

    pub fn new(app_name: String, instance_extra_exts: Vec<&'static CStr>) -> Self {
        let vk_entry = unsafe { ash::Entry::load() }.expect("failed to load vulkan entry");
        let instance = RhiInstance::new(&vk_entry, app_name, Self::ENGINE_NAME.to_string(), instance_extra_exts);
        let physical_device = Arc::new(RhiPhysicalDevice::new_discrete_physical_device(instance.handle()));

        let device = Arc::new(RhiDevice::new(&vk_entry, &instance, physical_device.clone()));
        let graphics_queue = RhiQueue::new(device.clone(), physical_device.graphics_queue_family.clone());
        log::info!("graphics queue's queue family:\n{:#?}", graphics_queue.queue_family());

        let allocator = {
            // vma 的生命周期设定：需要引用 Instance 以及 Device，
            // 并确保在其生命周期之内这两个的引用是有效的
            let mut vma_ci = vk_mem::AllocatorCreateInfo::new(instance.handle(), &device.handle, physical_device.handle);
            vma_ci.vulkan_api_version = vk::API_VERSION_1_3;

            Arc::new(unsafe { vk_mem::Allocator::new(vma_ci).unwrap() })
        };

        let temp_graphics_command_pool = RhiCommandPool::new(
            device.clone(),
            physical_device.graphics_queue_family.clone(),
            vk::CommandPoolCreateFlags::TRANSIENT,
            "rhi-temp-graphics",
        );

        Self {
            graphics_queue,
            temp_graphics_command_pool,
            allocator,
            device,
            physical_device,
            instance,
            vk_entry,
        }
    }
}

/// getter
impl Rhi {
    #[inline]
    pub fn instance(&self) -> &RhiInstance {
        &self.instance
    }

    #[inline]
    pub fn device(&self) -> &RhiDevice {
        &self.device
    }

    #[inline]
    pub fn device_arc(&self) -> Arc<RhiDevice> {
        self.device.clone()
    }

    #[inline]
    pub fn physical_device(&self) -> &RhiPhysicalDevice {
        &self.physical_device
    }

    #[inline]
    pub fn graphics_queue(&self) -> &RhiQueue {
        &self.graphics_queue
    }

    #[inline]
    pub fn allocator_arc(&self) -> Arc<vk_mem::Allocator> {
        self.allocator.clone()
    }
}

/// tools
impl Rhi {
    /// 立即执行某个 command，并同步等待执行结果
    ///
    /// 只用于初始化阶段的资源上传，不要在渲染循环中使用
    pub fn one_time_exec<F, R>(&self, func: F, name: &str) -> R
    where
        F: FnOnce(&RhiCommandBuffer) -> R,
    {
        let command_buffer =
            RhiCommandBuffer::new(self.device.clone(), &self.temp_graphics_command_pool, &format!("one-time-{}", name));

        command_buffer.begin(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT, name);
        let result = func(&command_buffer);
        command_buffer.end();

        self.graphics_queue.submit(vec![RhiSubmitInfo::new(std::slice::from_ref(&command_buffer))]);
        self.graphics_queue.wait_idle();

        // 释放 command buffer 在 pool 中占用的内存
        unsafe {
            self.device.free_command_buffers(
                self.temp_graphics_command_pool.handle(),
                std::slice::from_ref(&command_buffer.handle()),
            );
        }

        result
    }

    /// 等待 device 上所有 queue 都空闲
    pub fn wait_idle(&self) {
        unsafe {
            self.device.device_wait_idle().unwrap();
        }
    }
}
