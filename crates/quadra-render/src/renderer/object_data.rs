use std::sync::Arc;

use ash::vk;
use quadra_rhi::{
    core::{buffer::RhiBuffer, descriptor::RhiDescriptorPool, device::RhiDevice},
    rhi::Rhi,
};

use crate::renderer::recorder::FrameRecorder;

/// 每个 object 的 shader 输入：世界矩阵、视图投影矩阵、颜色
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectRecord {
    pub world: glam::Mat4,
    pub view_proj: glam::Mat4,
    pub color: glam::Vec4,
}

/// 将 record 尺寸对齐到 min_align 的整数倍
///
/// min_align 来自 device limits，一定是 power of 2
pub(crate) fn aligned_stride(record_size: u32, min_align: u32) -> u32 {
    (record_size + min_align - 1) & !(min_align - 1)
}

/// 固定容量的 per-object 数据 arena：一块连续 buffer + 整数下标
///
/// 容量在启动时确定，不支持动态增长；
/// 启动阶段一次性填充，之后在渲染循环中只读（GPU 按下标读取）
pub struct ObjectArena {
    buffer: RhiBuffer,

    capacity: u32,
    /// 相邻两条 record 在 buffer 中的间距，满足 dynamic offset 的对齐要求
    stride: u32,

    descriptor_set_layout: vk::DescriptorSetLayout,
    descriptor_set: vk::DescriptorSet,
    _descriptor_pool: RhiDescriptorPool,

    device: Arc<RhiDevice>,
}

impl ObjectArena {
    pub fn new(rhi: &Rhi, capacity: u32) -> Self {
        let device = rhi.device_arc();
        let stride = aligned_stride(size_of::<ObjectRecord>() as u32, device.min_ubo_offset_align() as u32);

        let buffer = RhiBuffer::new(
            rhi,
            capacity as vk::DeviceSize * stride as vk::DeviceSize,
            vk::BufferUsageFlags::UNIFORM_BUFFER,
            None,
            true,
            "object-arena",
        );

        // binding 0: dynamic uniform buffer，每次绑定时通过 dynamic offset 选中一条 record
        let layout_bindings = [vk::DescriptorSetLayoutBinding::default()
            .binding(0)
            .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER_DYNAMIC)
            .descriptor_count(1)
            .stage_flags(vk::ShaderStageFlags::VERTEX)];
        let descriptor_set_layout = unsafe {
            device
                .create_descriptor_set_layout(
                    &vk::DescriptorSetLayoutCreateInfo::default().bindings(&layout_bindings),
                    None,
                )
                .unwrap()
        };

        let descriptor_pool = RhiDescriptorPool::new(
            device.clone(),
            &[vk::DescriptorPoolSize::default()
                .ty(vk::DescriptorType::UNIFORM_BUFFER_DYNAMIC)
                .descriptor_count(1)],
            1,
            "object-arena",
        );
        let descriptor_set = descriptor_pool.alloc_set(descriptor_set_layout, "object-arena");

        let buffer_info = [vk::DescriptorBufferInfo::default()
            .buffer(buffer.handle())
            .offset(0)
            .range(size_of::<ObjectRecord>() as vk::DeviceSize)];
        let writes = [vk::WriteDescriptorSet::default()
            .dst_set(descriptor_set)
            .dst_binding(0)
            .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER_DYNAMIC)
            .buffer_info(&buffer_info)];
        unsafe {
            device.update_descriptor_sets(&writes, &[]);
        }

        Self {
            buffer,
            capacity,
            stride,
            descriptor_set_layout,
            descriptor_set,
            _descriptor_pool: descriptor_pool,
            device,
        }
    }

    /// 一次性写入所有 record，按 stride 展开到 buffer 中
    ///
    /// 只在启动阶段调用；渲染循环运行期间 arena 是只读的
    pub fn populate(&mut self, records: &[ObjectRecord]) {
        assert_eq!(records.len() as u32, self.capacity, "record count must match arena capacity");

        let base = self.buffer.mapped_ptr();
        for (i, record) in records.iter().enumerate() {
            let bytes = bytemuck::bytes_of(record);
            unsafe {
                std::ptr::copy_nonoverlapping(bytes.as_ptr(), base.add(i * self.stride as usize), bytes.len());
            }
        }
        self.buffer.flush(0, vk::WHOLE_SIZE);
    }

    /// 将下标为 index 的 record 绑定为 shader 的 active object 输入
    ///
    /// 下标合法性在绑定时检查
    pub fn bind(&self, recorder: &FrameRecorder, pipeline_layout: vk::PipelineLayout, index: u32) {
        assert!(index < self.capacity, "object index {} out of range [0, {})", index, self.capacity);
        recorder.cmd().bind_descriptor_sets(
            vk::PipelineBindPoint::GRAPHICS,
            pipeline_layout,
            0,
            &[self.descriptor_set],
            &[index * self.stride],
        );
    }

    #[inline]
    pub fn descriptor_set_layout(&self) -> vk::DescriptorSetLayout {
        self.descriptor_set_layout
    }

    #[inline]
    pub fn capacity(&self) -> u32 {
        self.capacity
    }
}

impl Drop for ObjectArena {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_descriptor_set_layout(self.descriptor_set_layout, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aligned_stride() {
        // record 是 144 bytes（两个 mat4 + 一个 vec4）
        assert_eq!(size_of::<ObjectRecord>(), 144);
        assert_eq!(aligned_stride(144, 256), 256);
        assert_eq!(aligned_stride(144, 64), 192);
        assert_eq!(aligned_stride(256, 256), 256);
        assert_eq!(aligned_stride(1, 16), 16);
    }

    #[test]
    fn test_dynamic_offsets_do_not_overlap() {
        let stride = aligned_stride(size_of::<ObjectRecord>() as u32, 256);
        let offsets: Vec<u32> = (0..4).map(|i| i * stride).collect();
        assert_eq!(offsets, vec![0, 256, 512, 768]);
    }
}
