use std::sync::Arc;

use ash::vk;
use vk_mem::Alloc;

use crate::{
    core::{buffer::RhiBuffer, device::RhiDevice, synchronize::RhiImageBarrier},
    rhi::Rhi,
};

/// 2D image 以及其内存分配
pub struct RhiImage2D {
    handle: vk::Image,
    allocation: vk_mem::Allocation,

    extent: vk::Extent2D,
    format: vk::Format,

    allocator: Arc<vk_mem::Allocator>,
    _device: Arc<RhiDevice>,
}

// allocation 只在创建和销毁时访问，image handle 在录制阶段是只读的
unsafe impl Send for RhiImage2D {}
unsafe impl Sync for RhiImage2D {}

impl Drop for RhiImage2D {
    fn drop(&mut self) {
        unsafe {
            self.allocator.destroy_image(self.handle, &mut self.allocation);
        }
    }
}

impl RhiImage2D {
    pub fn new(
        rhi: &Rhi,
        extent: vk::Extent2D,
        format: vk::Format,
        usage: vk::ImageUsageFlags,
        debug_name: &str,
    ) -> Self {
        let image_ci = vk::ImageCreateInfo {
            image_type: vk::ImageType::TYPE_2D,
            format,
            extent: extent.into(),
            mip_levels: 1,
            array_layers: 1,
            samples: vk::SampleCountFlags::TYPE_1,
            tiling: vk::ImageTiling::OPTIMAL,
            usage,
            sharing_mode: vk::SharingMode::EXCLUSIVE,
            // spec 上面说，这里只能是 UNDEFINED 或者 PREINITIALIZED
            initial_layout: vk::ImageLayout::UNDEFINED,
            ..Default::default()
        };
        let alloc_ci = vk_mem::AllocationCreateInfo {
            usage: vk_mem::MemoryUsage::AutoPreferDevice,
            ..Default::default()
        };

        let allocator = rhi.allocator_arc();
        let (image, allocation) = unsafe { allocator.create_image(&image_ci, &alloc_ci).unwrap() };
        rhi.device().debug_utils.set_object_debug_name(image, debug_name);

        Self {
            handle: image,
            allocation,
            extent,
            format,
            allocator,
            _device: rhi.device_arc(),
        }
    }

    /// 创建 image 并通过 stage buffer 上传像素数据，
    /// 最终 layout 是 SHADER_READ_ONLY_OPTIMAL
    ///
    /// 同步等待上传完成
    pub fn new_with_rgba8(rhi: &Rhi, extent: vk::Extent2D, pixels: &[u8], debug_name: &str) -> Self {
        assert_eq!(pixels.len() as u32, extent.width * extent.height * 4);

        let image = Self::new(
            rhi,
            extent,
            vk::Format::R8G8B8A8_UNORM,
            vk::ImageUsageFlags::SAMPLED | vk::ImageUsageFlags::TRANSFER_DST,
            debug_name,
        );

        let mut stage_buffer =
            RhiBuffer::new_stage_buffer(rhi, pixels.len() as vk::DeviceSize, format!("stage-for-{}", debug_name));
        stage_buffer.transfer_data_by_mmap(pixels);

        rhi.one_time_exec(
            |cmd| {
                // UNDEFINED -> TRANSFER_DST
                cmd.image_memory_barrier(
                    vk::DependencyFlags::empty(),
                    &[RhiImageBarrier::new()
                        .image(image.handle)
                        .image_aspect_flag(vk::ImageAspectFlags::COLOR)
                        .layout_transfer(vk::ImageLayout::UNDEFINED, vk::ImageLayout::TRANSFER_DST_OPTIMAL)
                        .src_mask(vk::PipelineStageFlags2::TOP_OF_PIPE, vk::AccessFlags2::empty())
                        .dst_mask(vk::PipelineStageFlags2::TRANSFER, vk::AccessFlags2::TRANSFER_WRITE)],
                );

                let copy_region = vk::BufferImageCopy::default()
                    .image_subresource(
                        vk::ImageSubresourceLayers::default()
                            .aspect_mask(vk::ImageAspectFlags::COLOR)
                            .layer_count(1),
                    )
                    .image_extent(extent.into());
                cmd.cmd_copy_buffer_to_image(
                    stage_buffer.handle(),
                    image.handle,
                    vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                    &[copy_region],
                );

                // TRANSFER_DST -> SHADER_READ_ONLY
                cmd.image_memory_barrier(
                    vk::DependencyFlags::empty(),
                    &[RhiImageBarrier::new()
                        .image(image.handle)
                        .image_aspect_flag(vk::ImageAspectFlags::COLOR)
                        .layout_transfer(
                            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
                        )
                        .src_mask(vk::PipelineStageFlags2::TRANSFER, vk::AccessFlags2::TRANSFER_WRITE)
                        .dst_mask(vk::PipelineStageFlags2::FRAGMENT_SHADER, vk::AccessFlags2::SHADER_READ)],
                );
            },
            &format!("upload-{}", debug_name),
        );

        image
    }
}

// getter
impl RhiImage2D {
    #[inline]
    pub fn handle(&self) -> vk::Image {
        self.handle
    }

    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    #[inline]
    pub fn format(&self) -> vk::Format {
        self.format
    }
}

/// 2D image view
pub struct RhiImage2DView {
    handle: vk::ImageView,
    device: Arc<RhiDevice>,
}

impl RhiImage2DView {
    pub fn new(rhi: &Rhi, image: &RhiImage2D, aspect: vk::ImageAspectFlags, debug_name: &str) -> Self {
        let create_info = vk::ImageViewCreateInfo::default()
            .image(image.handle())
            .format(image.format())
            .view_type(vk::ImageViewType::TYPE_2D)
            .subresource_range(
                vk::ImageSubresourceRange::default().aspect_mask(aspect).layer_count(1).level_count(1),
            );

        let handle = unsafe { rhi.device().create_image_view(&create_info, None).unwrap() };
        rhi.device().debug_utils.set_object_debug_name(handle, debug_name);

        Self {
            handle,
            device: rhi.device_arc(),
        }
    }

    #[inline]
    pub fn handle(&self) -> vk::ImageView {
        self.handle
    }
}

impl Drop for RhiImage2DView {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_image_view(self.handle, None);
        }
    }
}

/// 采样器
pub struct RhiSampler {
    handle: vk::Sampler,
    device: Arc<RhiDevice>,
}

impl RhiSampler {
    pub fn new_linear(rhi: &Rhi, debug_name: &str) -> Self {
        let sampler_ci = vk::SamplerCreateInfo::default()
            .mag_filter(vk::Filter::LINEAR)
            .min_filter(vk::Filter::LINEAR)
            .mipmap_mode(vk::SamplerMipmapMode::LINEAR)
            .address_mode_u(vk::SamplerAddressMode::REPEAT)
            .address_mode_v(vk::SamplerAddressMode::REPEAT)
            .address_mode_w(vk::SamplerAddressMode::REPEAT);

        let handle = unsafe { rhi.device().create_sampler(&sampler_ci, None).unwrap() };
        rhi.device().debug_utils.set_object_debug_name(handle, debug_name);

        Self {
            handle,
            device: rhi.device_arc(),
        }
    }

    #[inline]
    pub fn handle(&self) -> vk::Sampler {
        self.handle
    }
}

impl Drop for RhiSampler {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_sampler(self.handle, None);
        }
    }
}
