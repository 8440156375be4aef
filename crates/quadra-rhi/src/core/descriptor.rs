use std::sync::Arc;

use ash::vk;

use crate::core::device::RhiDevice;

/// descriptor pool，所有 set 在 pool 销毁时一并回收
pub struct RhiDescriptorPool {
    handle: vk::DescriptorPool,
    device: Arc<RhiDevice>,
}

impl RhiDescriptorPool {
    pub fn new(device: Arc<RhiDevice>, pool_sizes: &[vk::DescriptorPoolSize], max_sets: u32, debug_name: &str) -> Self {
        let pool_ci = vk::DescriptorPoolCreateInfo::default().pool_sizes(pool_sizes).max_sets(max_sets);
        let handle = unsafe { device.create_descriptor_pool(&pool_ci, None).unwrap() };
        device.debug_utils.set_object_debug_name(handle, debug_name);
        Self { handle, device }
    }

    pub fn alloc_set(&self, layout: vk::DescriptorSetLayout, debug_name: &str) -> vk::DescriptorSet {
        let layouts = [layout];
        let alloc_info = vk::DescriptorSetAllocateInfo::default().descriptor_pool(self.handle).set_layouts(&layouts);
        let set = unsafe { self.device.allocate_descriptor_sets(&alloc_info).unwrap()[0] };
        self.device.debug_utils.set_object_debug_name(set, debug_name);
        set
    }
}

impl Drop for RhiDescriptorPool {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_descriptor_pool(self.handle, None);
        }
    }
}
