use ash::vk;
use quadra_rhi::{
    core::buffer::{RhiIndexBuffer, RhiVertexBuffer},
    rhi::Rhi,
};

use crate::renderer::recorder::FrameRecorder;

/// 顶点格式：position + uv
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct QuadVertex {
    pub pos: [f32; 3],
    pub uv: [f32; 2],
}

/// 顶点数据
const VERTEX_DATA: [QuadVertex; 4] = [
    QuadVertex { pos: [-0.5, 0.5, 0.0], uv: [0.0, 0.0] },
    QuadVertex { pos: [0.5, 0.5, 0.0], uv: [1.0, 1.0] },
    QuadVertex { pos: [-0.5, -0.5, 0.0], uv: [0.0, 1.0] },
    QuadVertex { pos: [0.5, -0.5, 0.0], uv: [1.0, 0.0] },
];

/// 索引数据：两个三角形
const INDEX_DATA: [u16; 6] = [
    0, 1, 2, //
    2, 1, 3,
];

/// 所有 object 共享的四边形 geometry
pub struct QuadMesh {
    vertex_buffer: RhiVertexBuffer<QuadVertex>,
    index_buffer: RhiIndexBuffer,
}

impl QuadMesh {
    pub fn new(rhi: &Rhi) -> Self {
        Self {
            vertex_buffer: RhiVertexBuffer::new_with_data(rhi, &VERTEX_DATA, "quad-vertex"),
            index_buffer: RhiIndexBuffer::new_with_data(rhi, &INDEX_DATA, "quad-index"),
        }
    }

    /// 绑定 vertex/index buffer
    pub fn bind(&self, recorder: &FrameRecorder) {
        let cmd = recorder.cmd();
        cmd.cmd_bind_vertex_buffers(0, &[self.vertex_buffer.handle()], &[0]);
        cmd.cmd_bind_index_buffer(self.index_buffer.handle(), 0, RhiIndexBuffer::index_type());
    }

    /// 每个 quad 的索引数量
    #[inline]
    pub fn index_cnt(&self) -> u32 {
        self.index_buffer.index_cnt() as u32
    }

    /// 顶点格式的 binding 描述
    pub fn vertex_binding() -> Vec<vk::VertexInputBindingDescription> {
        vec![
            vk::VertexInputBindingDescription::default()
                .binding(0)
                .stride(size_of::<QuadVertex>() as u32)
                .input_rate(vk::VertexInputRate::VERTEX),
        ]
    }

    /// 顶点格式的 attribute 描述
    pub fn vertex_attribute() -> Vec<vk::VertexInputAttributeDescription> {
        vec![
            vk::VertexInputAttributeDescription::default()
                .location(0)
                .binding(0)
                .format(vk::Format::R32G32B32_SFLOAT)
                .offset(std::mem::offset_of!(QuadVertex, pos) as u32),
            vk::VertexInputAttributeDescription::default()
                .location(1)
                .binding(0)
                .format(vk::Format::R32G32_SFLOAT)
                .offset(std::mem::offset_of!(QuadVertex, uv) as u32),
        ]
    }
}
