use std::{ffi::CStr, ops::Deref, sync::Arc};

use ash::vk;
use itertools::Itertools;

use crate::core::{debug_utils::RhiDebugUtils, instance::RhiInstance, physical_device::RhiPhysicalDevice};

pub struct RhiDevice {
    pub handle: ash::Device,

    pub pdevice: Arc<RhiPhysicalDevice>,

    pub vk_dynamic_render_pf: ash::khr::dynamic_rendering::Device,

    pub debug_utils: RhiDebugUtils,
}

impl Deref for RhiDevice {
    type Target = ash::Device;

    fn deref(&self) -> &Self::Target {
        &self.handle
    }
}

impl RhiDevice {
    pub fn new(vk_entry: &ash::Entry, instance: &RhiInstance, pdevice: Arc<RhiPhysicalDevice>) -> Self {
        // 只需要一个 graphics queue
        let queue_priorities = [1.0];
        let queue_create_infos = [vk::DeviceQueueCreateInfo::default()
            .queue_family_index(pdevice.graphics_queue_family.queue_family_index)
            .queue_priorities(&queue_priorities)];

        // device 所需的所有 extension
        let device_exts = Self::basic_device_exts().iter().map(|e| e.as_ptr()).collect_vec();
        let mut exts_str = String::new();
        for ext in &device_exts {
            exts_str.push_str(&format!("\n\t{:?}", unsafe { CStr::from_ptr(*ext) }));
        }
        log::info!("device exts: {}", exts_str);

        // device 所需的所有 features
        let mut all_features = vk::PhysicalDeviceFeatures2::default().features(Self::physical_device_basic_features());
        let mut physical_device_ext_features = Self::physical_device_extra_features();
        unsafe {
            physical_device_ext_features.iter_mut().for_each(|f| {
                let ptr = <*mut dyn vk::ExtendsPhysicalDeviceFeatures2>::cast::<vk::BaseOutStructure>(f.as_mut());
                (*ptr).p_next = all_features.p_next as _;
                all_features.p_next = ptr as _;
            });
        }

        let device_create_info = vk::DeviceCreateInfo::default()
            .queue_create_infos(&queue_create_infos)
            .enabled_extension_names(&device_exts)
            .push_next(&mut all_features);

        let device = unsafe { instance.handle.create_device(pdevice.handle, &device_create_info, None).unwrap() };

        let debug_utils = RhiDebugUtils::new(vk_entry, &instance.handle, &device);

        let vk_dynamic_render_pf = ash::khr::dynamic_rendering::Device::new(&instance.handle, &device);

        Self {
            handle: device,
            pdevice,

            vk_dynamic_render_pf,

            debug_utils,
        }
    }

    /// 必要的 physical device core features
    fn physical_device_basic_features() -> vk::PhysicalDeviceFeatures {
        vk::PhysicalDeviceFeatures::default().sampler_anisotropy(true)
    }

    /// 必要的 physical device extension features
    fn physical_device_extra_features() -> Vec<Box<dyn vk::ExtendsPhysicalDeviceFeatures2>> {
        vec![
            Box::new(vk::PhysicalDeviceDynamicRenderingFeatures::default().dynamic_rendering(true)),
            Box::new(vk::PhysicalDeviceSynchronization2Features::default().synchronization2(true)),
            Box::new(vk::PhysicalDeviceTimelineSemaphoreFeatures::default().timeline_semaphore(true)),
        ]
    }

    /// 必要的 device extensions
    fn basic_device_exts() -> Vec<&'static CStr> {
        vec![
            // swapchain
            ash::khr::swapchain::NAME,
            // dynamic rendering
            ash::khr::dynamic_rendering::NAME,
        ]
    }
}

impl RhiDevice {
    /// 当 uniform buffer 以 dynamic offset 的方式绑定时，offset 必须是这个值的整数倍
    ///
    /// 注：这个值一定是 power of 2
    #[inline]
    pub fn min_ubo_offset_align(&self) -> vk::DeviceSize {
        self.pdevice.basic_props.limits.min_uniform_buffer_offset_alignment
    }

    /// 将尺寸和 min_ubo_offset_align 对齐，使得得到的尺寸是 min_ubo_offset_align 的整数倍
    #[inline]
    pub fn aligned_ubo_size(&self, size: vk::DeviceSize) -> vk::DeviceSize {
        let min_ubo_align = self.min_ubo_offset_align();
        (size + min_ubo_align - 1) & !(min_ubo_align - 1)
    }

    #[inline]
    pub fn debug_utils(&self) -> &RhiDebugUtils {
        &self.debug_utils
    }
}

impl Drop for RhiDevice {
    fn drop(&mut self) {
        log::info!("destroying device");
        unsafe {
            self.handle.destroy_device(None);
        }
    }
}
