use ash::vk;

/// dynamic rendering 所需的 attachment 信息
pub struct RhiRenderingInfo {
    color_attach_info: Vec<vk::RenderingAttachmentInfo<'static>>,
    range: vk::Rect2D,
}

impl RhiRenderingInfo {
    /// load_op = CLEAR，使用给定的清屏颜色
    pub fn new_clear(color_attach_image: vk::ImageView, range: vk::Rect2D, clear_color: [f32; 4]) -> Self {
        Self {
            color_attach_info: vec![
                Self::color_attachment(color_attach_image)
                    .load_op(vk::AttachmentLoadOp::CLEAR)
                    .clear_value(vk::ClearValue {
                        color: vk::ClearColorValue { float32: clear_color },
                    }),
            ],
            range,
        }
    }

    /// load_op = LOAD，保留 attachment 上已有的内容
    ///
    /// 多个 command buffer 向同一个 attachment 录制时，除第一个以外都应该使用 LOAD
    pub fn new_load(color_attach_image: vk::ImageView, range: vk::Rect2D) -> Self {
        Self {
            color_attach_info: vec![Self::color_attachment(color_attach_image).load_op(vk::AttachmentLoadOp::LOAD)],
            range,
        }
    }

    pub fn rendering_info(&self) -> vk::RenderingInfo<'_> {
        vk::RenderingInfo::default()
            .layer_count(1)
            .render_area(self.range)
            .color_attachments(&self.color_attach_info)
    }

    fn color_attachment(image_view: vk::ImageView) -> vk::RenderingAttachmentInfo<'static> {
        vk::RenderingAttachmentInfo::default()
            .image_layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
            .image_view(image_view)
            .store_op(vk::AttachmentStoreOp::STORE)
    }
}
