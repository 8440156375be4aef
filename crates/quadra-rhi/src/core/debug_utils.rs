use std::ffi::{CStr, CString};

use ash::vk;

pub trait RhiDebugType {
    fn debug_type_name() -> &'static str;

    fn vk_handle(&self) -> impl vk::Handle + Copy;
}

pub struct RhiDebugUtils {
    pub vk_debug_utils_instance: ash::ext::debug_utils::Instance,
    pub vk_debug_utils_device: ash::ext::debug_utils::Device,
    pub vk_debug_utils_messenger: vk::DebugUtilsMessengerEXT,
}

impl Drop for RhiDebugUtils {
    fn drop(&mut self) {
        unsafe {
            log::info!("destroying debug utils");
            self.vk_debug_utils_instance.destroy_debug_utils_messenger(self.vk_debug_utils_messenger, None);
        }
    }
}

/// debug messenger 的回调函数
/// # Safety
unsafe extern "system" fn vk_debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _user_data: *mut std::os::raw::c_void,
) -> vk::Bool32 {
    let callback_data = unsafe { *p_callback_data };

    let msg = if callback_data.p_message.is_null() {
        std::borrow::Cow::from("")
    } else {
        unsafe { CStr::from_ptr(callback_data.p_message).to_string_lossy() }
    };

    let format_msg = format!("[{:?}]\n{}\n", message_type, msg);

    match message_severity {
        vk::DebugUtilsMessageSeverityFlagsEXT::ERROR => log::error!("{}", format_msg),
        vk::DebugUtilsMessageSeverityFlagsEXT::WARNING => log::warn!("{}", format_msg),
        _ => log::info!("{}", format_msg),
    };

    // 只有 layer developer 才需要返回 True
    vk::FALSE
}

impl RhiDebugUtils {
    pub fn new(vk_entry: &ash::Entry, instance: &ash::Instance, device: &ash::Device) -> Self {
        let loader = ash::ext::debug_utils::Instance::new(vk_entry, instance);

        let create_info = Self::debug_utils_messenger_ci();
        let debug_messenger = unsafe { loader.create_debug_utils_messenger(&create_info, None).unwrap() };

        let vk_debug_utils_device = ash::ext::debug_utils::Device::new(instance, device);

        Self {
            vk_debug_utils_instance: loader,
            vk_debug_utils_messenger: debug_messenger,
            vk_debug_utils_device,
        }
    }

    /// 用于创建 debug messenger 的结构体
    pub fn debug_utils_messenger_ci() -> vk::DebugUtilsMessengerCreateInfoEXT<'static> {
        vk::DebugUtilsMessengerCreateInfoEXT::default()
            .message_severity(
                vk::DebugUtilsMessageSeverityFlagsEXT::WARNING | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
            )
            .message_type(
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                    | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                    | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
            )
            .pfn_user_callback(Some(vk_debug_callback))
    }

    #[inline]
    pub fn set_object_debug_name(&self, handle: impl vk::Handle + Copy, name: impl AsRef<str>) {
        let name = CString::new(name.as_ref()).unwrap();
        unsafe {
            self.vk_debug_utils_device
                .set_debug_utils_object_name(
                    &vk::DebugUtilsObjectNameInfoEXT::default().object_name(name.as_c_str()).object_handle(handle),
                )
                .unwrap();
        }
    }

    #[inline]
    pub fn set_debug_name<T: RhiDebugType>(&self, obj: &T, name: impl AsRef<str>) {
        self.set_object_debug_name(obj.vk_handle(), format!("{}::{}", T::debug_type_name(), name.as_ref()));
    }

    /// - command type: state, action
    /// - supported queue type: graphics, compute
    #[inline]
    pub fn cmd_begin_debug_label(&self, command_buffer: vk::CommandBuffer, label_name: &str, label_color: glam::Vec4) {
        let name = CString::new(label_name).unwrap();
        unsafe {
            self.vk_debug_utils_device.cmd_begin_debug_utils_label(
                command_buffer,
                &vk::DebugUtilsLabelEXT::default().label_name(name.as_c_str()).color(label_color.into()),
            );
        }
    }

    /// - command type: state, action
    /// - supported queue type: graphics, compute
    #[inline]
    pub fn cmd_end_debug_label(&self, command_buffer: vk::CommandBuffer) {
        unsafe {
            self.vk_debug_utils_device.cmd_end_debug_utils_label(command_buffer);
        }
    }
}
