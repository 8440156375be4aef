use std::sync::Arc;

use ash::vk;

use crate::core::device::RhiDevice;

pub struct RhiShaderModule {
    pub handle: vk::ShaderModule,

    device: Arc<RhiDevice>,
}

impl RhiShaderModule {
    /// # param
    /// * path - spv shader 文件路径
    pub fn new(device: Arc<RhiDevice>, path: &std::path::Path) -> Self {
        let mut file =
            std::fs::File::open(path).unwrap_or_else(|e| panic!("failed to open shader {:?}: {}", path, e));
        let shader_code = ash::util::read_spv(&mut file).unwrap();

        let shader_module_info = vk::ShaderModuleCreateInfo::default().code(&shader_code);

        unsafe {
            let shader_module = device.create_shader_module(&shader_module_info, None).unwrap();
            device.debug_utils.set_object_debug_name(shader_module, path.to_str().unwrap());
            Self {
                handle: shader_module,
                device,
            }
        }
    }

    pub fn destroy(self) {
        unsafe {
            self.device.destroy_shader_module(self.handle, None);
        }
    }
}

/// shader stage 的描述：入口、spv 路径
pub struct RhiShaderStageInfo {
    pub stage: vk::ShaderStageFlags,
    pub entry_point: &'static std::ffi::CStr,
    pub path: std::path::PathBuf,
}
