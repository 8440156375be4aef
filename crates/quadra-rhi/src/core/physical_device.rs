use std::ffi::CStr;

use ash::vk;
use itertools::Itertools;

use crate::core::command_queue::RhiQueueFamily;

/// 表示一张物理显卡
pub struct RhiPhysicalDevice {
    pub handle: vk::PhysicalDevice,

    /// 当前 gpu 支持的 features
    pub features: vk::PhysicalDeviceFeatures,

    /// 当前 gpu 的基础属性
    pub basic_props: vk::PhysicalDeviceProperties,

    pub memory_properties: vk::PhysicalDeviceMemoryProperties,

    pub queue_family_properties: Vec<vk::QueueFamilyProperties>,

    pub graphics_queue_family: RhiQueueFamily,
}

impl RhiPhysicalDevice {
    /// 创建一个新的物理显卡实例
    ///
    /// 优先选择独立显卡，如果没有则选择第一个可用的显卡
    pub fn new_discrete_physical_device(instance: &ash::Instance) -> Self {
        unsafe {
            instance
                .enumerate_physical_devices()
                .unwrap()
                .iter()
                .map(|pdevice| RhiPhysicalDevice::new(*pdevice, instance))
                // 优先使用独立显卡
                .find_or_first(RhiPhysicalDevice::is_discrete_gpu)
                .unwrap()
        }
    }

    pub fn new(pdevice: vk::PhysicalDevice, instance: &ash::Instance) -> Self {
        unsafe {
            let basic_props = instance.get_physical_device_properties(pdevice);
            let physical_device_name = CStr::from_ptr(basic_props.device_name.as_ptr());
            log::info!("found gpu: {:?}", physical_device_name);

            let queue_family_properties = instance.get_physical_device_queue_family_properties(pdevice);

            let graphics_queue_family = queue_family_properties
                .iter()
                .enumerate()
                .find(|(_, prop)| prop.queue_flags.contains(vk::QueueFlags::GRAPHICS))
                .map(|(index, prop)| RhiQueueFamily {
                    name: "graphics".to_string(),
                    queue_family_index: index as u32,
                    queue_flags: prop.queue_flags,
                    queue_count: prop.queue_count,
                })
                .expect("no graphics queue family found");

            Self {
                memory_properties: instance.get_physical_device_memory_properties(pdevice),
                features: instance.get_physical_device_features(pdevice),
                handle: pdevice,
                basic_props,
                queue_family_properties,
                graphics_queue_family,
            }
        }
    }

    /// 当前 gpu 是否是独立显卡
    #[inline]
    pub fn is_discrete_gpu(&self) -> bool {
        self.basic_props.device_type == vk::PhysicalDeviceType::DISCRETE_GPU
    }
}
