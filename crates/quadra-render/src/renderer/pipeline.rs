use ash::vk;
use quadra_crate_tools::resource::QuadraPath;
use quadra_rhi::{
    core::graphics_pipeline::{RhiGraphicsPipeline, RhiGraphicsPipelineCreateInfo},
    rhi::Rhi,
};

use crate::renderer::{mesh::QuadMesh, recorder::FrameRecorder};

/// quad 绘制用的 pipeline state：shader、光栅化、混合配置
///
/// 创建之后在整个运行期间不可变
pub struct QuadPipeline {
    pipeline: RhiGraphicsPipeline,
}

impl QuadPipeline {
    /// # param
    /// * set_layouts - set 0: object arena; set 1: texture
    pub fn new(rhi: &Rhi, color_format: vk::Format, set_layouts: Vec<vk::DescriptorSetLayout>) -> Self {
        let mut create_info = RhiGraphicsPipelineCreateInfo::default();
        create_info
            .attach_info(vec![color_format])
            .vertex_shader_stage(QuadraPath::shader_path("quad.vert.spv"), c"main")
            .fragment_shader_stage(QuadraPath::shader_path("quad.frag.spv"), c"main")
            .vertex_binding(QuadMesh::vertex_binding())
            .vertex_attribute(QuadMesh::vertex_attribute())
            .descriptor_set_layouts(set_layouts);

        Self {
            pipeline: RhiGraphicsPipeline::new(rhi.device_arc(), &create_info, "quad-pipeline"),
        }
    }

    /// 绑定 pipeline，并设置 viewport/scissor
    pub fn bind(&self, recorder: &FrameRecorder, extent: vk::Extent2D) {
        let cmd = recorder.cmd();
        cmd.cmd_bind_pipeline(vk::PipelineBindPoint::GRAPHICS, self.pipeline.pipeline());

        // viewport 翻转 Y 轴，让 NDC 的 +Y 朝上
        cmd.cmd_set_viewport(
            0,
            &[vk::Viewport {
                x: 0.0,
                y: extent.height as f32,
                width: extent.width as f32,
                height: -(extent.height as f32),
                min_depth: 0.0,
                max_depth: 1.0,
            }],
        );
        cmd.cmd_set_scissor(
            0,
            &[vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent,
            }],
        );
    }

    #[inline]
    pub fn layout(&self) -> vk::PipelineLayout {
        self.pipeline.layout()
    }
}
