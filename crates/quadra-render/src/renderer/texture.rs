use std::sync::Arc;

use ash::vk;
use quadra_rhi::{
    core::{
        descriptor::RhiDescriptorPool,
        device::RhiDevice,
        image::{RhiImage2D, RhiImage2DView, RhiSampler},
    },
    rhi::Rhi,
};

use crate::renderer::recorder::FrameRecorder;

/// 棋盘格纹理的边长（像素）
const TEXTURE_SIZE: u32 = 64;
/// 棋盘格单个格子的边长（像素）
const CELL_SIZE: u32 = 8;

/// 所有 quad 共享的纹理：程序生成的棋盘格
pub struct QuadTexture {
    _image: RhiImage2D,
    _image_view: RhiImage2DView,
    _sampler: RhiSampler,

    descriptor_set_layout: vk::DescriptorSetLayout,
    descriptor_set: vk::DescriptorSet,
    _descriptor_pool: RhiDescriptorPool,

    device: Arc<RhiDevice>,
}

impl QuadTexture {
    pub fn new(rhi: &Rhi) -> Self {
        let device = rhi.device_arc();

        let extent = vk::Extent2D {
            width: TEXTURE_SIZE,
            height: TEXTURE_SIZE,
        };
        let image = RhiImage2D::new_with_rgba8(rhi, extent, &Self::checkerboard_pixels(), "quad-texture");
        let image_view = RhiImage2DView::new(rhi, &image, vk::ImageAspectFlags::COLOR, "quad-texture");
        let sampler = RhiSampler::new_linear(rhi, "quad-texture");

        let layout_bindings = [vk::DescriptorSetLayoutBinding::default()
            .binding(0)
            .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
            .descriptor_count(1)
            .stage_flags(vk::ShaderStageFlags::FRAGMENT)];
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
                .ty(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                .descriptor_count(1)],
            1,
            "quad-texture",
        );
        let descriptor_set = descriptor_pool.alloc_set(descriptor_set_layout, "quad-texture");

        let image_info = [vk::DescriptorImageInfo::default()
            .image_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
            .image_view(image_view.handle())
            .sampler(sampler.handle())];
        let writes = [vk::WriteDescriptorSet::default()
            .dst_set(descriptor_set)
            .dst_binding(0)
            .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
            .image_info(&image_info)];
        unsafe {
            device.update_descriptor_sets(&writes, &[]);
        }

        Self {
            _image: image,
            _image_view: image_view,
            _sampler: sampler,
            descriptor_set_layout,
            descriptor_set,
            _descriptor_pool: descriptor_pool,
            device,
        }
    }

    /// 生成 rgba8 棋盘格像素
    fn checkerboard_pixels() -> Vec<u8> {
        let mut pixels = Vec::with_capacity((TEXTURE_SIZE * TEXTURE_SIZE * 4) as usize);
        for y in 0..TEXTURE_SIZE {
            for x in 0..TEXTURE_SIZE {
                let cell = (x / CELL_SIZE + y / CELL_SIZE) % 2;
                let tone = if cell == 0 { 255u8 } else { 160u8 };
                pixels.extend_from_slice(&[tone, tone, tone, 255]);
            }
        }
        pixels
    }

    /// 绑定纹理的 descriptor set（set = 1）
    pub fn bind(&self, recorder: &FrameRecorder, pipeline_layout: vk::PipelineLayout) {
        recorder.cmd().bind_descriptor_sets(
            vk::PipelineBindPoint::GRAPHICS,
            pipeline_layout,
            1,
            &[self.descriptor_set],
            &[],
        );
    }

    #[inline]
    pub fn descriptor_set_layout(&self) -> vk::DescriptorSetLayout {
        self.descriptor_set_layout
    }
}

impl Drop for QuadTexture {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_descriptor_set_layout(self.descriptor_set_layout, None);
        }
    }
}
