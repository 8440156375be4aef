use std::sync::Arc;

use ash::vk;
use itertools::Itertools;

use crate::core::{
    device::RhiDevice,
    shader::{RhiShaderModule, RhiShaderStageInfo},
};

pub struct RhiGraphicsPipelineCreateInfo {
    descriptor_set_layouts: Vec<vk::DescriptorSetLayout>,

    /// dynamic render 需要的 framebuffer 信息
    color_attach_formats: Vec<vk::Format>,

    shader_stages: Vec<RhiShaderStageInfo>,

    vertex_binding_desc: Vec<vk::VertexInputBindingDescription>,
    vertex_attribute_desc: Vec<vk::VertexInputAttributeDescription>,

    primitive_topology: vk::PrimitiveTopology,

    rasterize_state_info: vk::PipelineRasterizationStateCreateInfo<'static>,

    color_attach_blend_states: Vec<vk::PipelineColorBlendAttachmentState>,

    depth_stencil_info: vk::PipelineDepthStencilStateCreateInfo<'static>,

    dynamic_states: Vec<vk::DynamicState>,
}

impl Default for RhiGraphicsPipelineCreateInfo {
    fn default() -> Self {
        Self {
            color_attach_formats: vec![],

            descriptor_set_layouts: vec![],
            shader_stages: vec![],

            vertex_binding_desc: vec![],
            vertex_attribute_desc: vec![],

            primitive_topology: vk::PrimitiveTopology::TRIANGLE_LIST,

            rasterize_state_info: vk::PipelineRasterizationStateCreateInfo::default()
                .depth_clamp_enable(false)
                .rasterizer_discard_enable(false)
                .polygon_mode(vk::PolygonMode::FILL)
                .line_width(1.0)
                .cull_mode(vk::CullModeFlags::NONE)
                .front_face(vk::FrontFace::COUNTER_CLOCKWISE)
                .depth_bias_enable(false),

            color_attach_blend_states: vec![
                vk::PipelineColorBlendAttachmentState::default()
                    .blend_enable(false)
                    .color_write_mask(vk::ColorComponentFlags::RGBA),
            ],

            // 不使用 depth attachment
            depth_stencil_info: vk::PipelineDepthStencilStateCreateInfo::default()
                .depth_test_enable(false)
                .depth_write_enable(false)
                .stencil_test_enable(false),
            dynamic_states: vec![vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR],
        }
    }
}

impl RhiGraphicsPipelineCreateInfo {
    /// builder
    #[inline]
    pub fn attach_info(&mut self, color_attach_formats: Vec<vk::Format>) -> &mut Self {
        self.color_attach_formats = color_attach_formats;
        self
    }

    /// builder
    #[inline]
    pub fn vertex_shader_stage(&mut self, path: std::path::PathBuf, entry_point: &'static std::ffi::CStr) -> &mut Self {
        self.shader_stages.push(RhiShaderStageInfo {
            stage: vk::ShaderStageFlags::VERTEX,
            entry_point,
            path,
        });
        self
    }

    /// builder
    #[inline]
    pub fn fragment_shader_stage(
        &mut self,
        path: std::path::PathBuf,
        entry_point: &'static std::ffi::CStr,
    ) -> &mut Self {
        self.shader_stages.push(RhiShaderStageInfo {
            stage: vk::ShaderStageFlags::FRAGMENT,
            entry_point,
            path,
        });
        self
    }

    /// builder
    #[inline]
    pub fn vertex_binding(&mut self, bindings: Vec<vk::VertexInputBindingDescription>) -> &mut Self {
        self.vertex_binding_desc = bindings;
        self
    }

    /// builder
    #[inline]
    pub fn vertex_attribute(&mut self, attributes: Vec<vk::VertexInputAttributeDescription>) -> &mut Self {
        self.vertex_attribute_desc = attributes;
        self
    }

    /// builder
    #[inline]
    pub fn descriptor_set_layouts(&mut self, layouts: Vec<vk::DescriptorSetLayout>) -> &mut Self {
        self.descriptor_set_layouts = layouts;
        self
    }
}

pub struct RhiGraphicsPipeline {
    pipeline: vk::Pipeline,
    pipeline_layout: vk::PipelineLayout,

    device: Arc<RhiDevice>,
}

impl Drop for RhiGraphicsPipeline {
    fn drop(&mut self) {
        unsafe {
            log::info!("destroying graphics pipeline");
            self.device.destroy_pipeline(self.pipeline, None);
            self.device.destroy_pipeline_layout(self.pipeline_layout, None);
        }
    }
}

impl RhiGraphicsPipeline {
    pub fn new(device: Arc<RhiDevice>, create_info: &RhiGraphicsPipelineCreateInfo, debug_name: &str) -> Self {
        // dynamic rendering 需要的 framebuffer 信息
        let mut attach_info =
            vk::PipelineRenderingCreateInfo::default().color_attachment_formats(&create_info.color_attach_formats);

        let pipeline_layout = {
            let pipeline_layout_create_info =
                vk::PipelineLayoutCreateInfo::default().set_layouts(&create_info.descriptor_set_layouts);
            unsafe { device.create_pipeline_layout(&pipeline_layout_create_info, None).unwrap() }
        };
        device.debug_utils().set_object_debug_name(pipeline_layout, debug_name);

        let shader_modules = create_info
            .shader_stages
            .iter()
            .map(|stage| RhiShaderModule::new(device.clone(), &stage.path))
            .collect_vec();
        let shader_stages_info = create_info
            .shader_stages
            .iter()
            .zip(shader_modules.iter())
            .map(|(stage, module)| {
                vk::PipelineShaderStageCreateInfo::default()
                    .stage(stage.stage)
                    .module(module.handle)
                    .name(stage.entry_point)
            })
            .collect_vec();

        // 顶点和 index
        let vertex_input_state_info = vk::PipelineVertexInputStateCreateInfo::default()
            .vertex_binding_descriptions(&create_info.vertex_binding_desc)
            .vertex_attribute_descriptions(&create_info.vertex_attribute_desc);

        let input_assembly_info = vk::PipelineInputAssemblyStateCreateInfo::default()
            .topology(create_info.primitive_topology)
            .primitive_restart_enable(false);

        // viewport 和 scissor 具体值由 dynamic state 决定，但是数量由该 create info 决定
        let viewport_info = vk::PipelineViewportStateCreateInfo {
            viewport_count: 1,
            scissor_count: 1,
            ..Default::default()
        };

        let msaa_info = vk::PipelineMultisampleStateCreateInfo::default()
            .sample_shading_enable(false)
            .rasterization_samples(vk::SampleCountFlags::TYPE_1);

        // 混合设置：需要为每个 color attachment 分别指定
        let color_blend_info = vk::PipelineColorBlendStateCreateInfo::default()
            .logic_op_enable(false)
            .attachments(&create_info.color_attach_blend_states);

        let dynamic_state_info =
            vk::PipelineDynamicStateCreateInfo::default().dynamic_states(&create_info.dynamic_states);

        let pipeline_info = vk::GraphicsPipelineCreateInfo::default()
            .stages(&shader_stages_info)
            .vertex_input_state(&vertex_input_state_info)
            .input_assembly_state(&input_assembly_info)
            .viewport_state(&viewport_info)
            .rasterization_state(&create_info.rasterize_state_info)
            .multisample_state(&msaa_info)
            .color_blend_state(&color_blend_info)
            .depth_stencil_state(&create_info.depth_stencil_info)
            .layout(pipeline_layout)
            .dynamic_state(&dynamic_state_info)
            .push_next(&mut attach_info);

        let pipeline = unsafe {
            device
                .create_graphics_pipelines(vk::PipelineCache::null(), std::slice::from_ref(&pipeline_info), None)
                .unwrap()[0]
        };
        device.debug_utils().set_object_debug_name(pipeline, debug_name);

        shader_modules.into_iter().for_each(|module| {
            module.destroy();
        });

        RhiGraphicsPipeline {
            pipeline,
            pipeline_layout,
            device,
        }
    }

    #[inline]
    pub fn pipeline(&self) -> vk::Pipeline {
        self.pipeline
    }

    #[inline]
    pub fn layout(&self) -> vk::PipelineLayout {
        self.pipeline_layout
    }
}
