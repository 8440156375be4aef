use std::sync::Arc;

use ash::vk;
use itertools::Itertools;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

use crate::{
    core::{
        command_queue::RhiQueue,
        device::RhiDevice,
        synchronize::RhiSemaphore,
    },
    rhi::Rhi,
};

struct RhiSurface {
    handle: vk::SurfaceKHR,
    pf: ash::khr::surface::Instance,
}

impl RhiSurface {
    fn new(rhi: &Rhi, window: &winit::window::Window) -> Self {
        let surface_pf = ash::khr::surface::Instance::new(&rhi.vk_entry, rhi.instance().handle());

        let surface = unsafe {
            ash_window::create_surface(
                &rhi.vk_entry,
                rhi.instance().handle(),
                window.display_handle().unwrap().as_raw(),
                window.window_handle().unwrap().as_raw(),
                None,
            )
            .unwrap()
        };
        rhi.device().debug_utils.set_object_debug_name(surface, "main-surface");

        RhiSurface {
            handle: surface,
            pf: surface_pf,
        }
    }
}

impl Drop for RhiSurface {
    fn drop(&mut self) {
        log::info!("destroying surface");
        unsafe { self.pf.destroy_surface(self.handle, None) }
    }
}

/// 由 presentation engine 轮换的一组可呈现 image
pub struct RhiSwapchain {
    swapchain_pf: ash::khr::swapchain::Device,
    swapchain_handle: vk::SwapchainKHR,

    device: Arc<RhiDevice>,

    _surface: RhiSurface,

    /// 这里的 image 并非手动创建的，因此不使用 RhiImage2D 类型
    images: Vec<vk::Image>,
    image_views: Vec<vk::ImageView>,

    extent: vk::Extent2D,
    color_format: vk::Format,
}

impl RhiSwapchain {
    /// # param
    /// * image_count - 期望的 image 数量，会被 surface capabilities 截断
    pub fn new(
        rhi: &Rhi,
        window: &winit::window::Window,
        image_count: u32,
        preferred_present_mode: vk::PresentModeKHR,
    ) -> Self {
        let pdevice = rhi.physical_device().handle;
        let surface = RhiSurface::new(rhi, window);

        let present_mode = Self::init_present_mode(rhi, &surface, preferred_present_mode);
        let (format, color_space) = Self::init_format_and_colorspace(rhi, &surface);

        let surface_capabilities =
            unsafe { surface.pf.get_physical_device_surface_capabilities(pdevice, surface.handle).unwrap() };

        let extent = surface_capabilities.current_extent;
        log::info!("surface capability extent: {:?}", extent);

        // max_image_count == 0 表示不限制 image 数量
        let image_count = if surface_capabilities.max_image_count == 0 {
            u32::max(image_count, surface_capabilities.min_image_count)
        } else {
            image_count.clamp(surface_capabilities.min_image_count, surface_capabilities.max_image_count)
        };

        log::info!("swapchain image count: {}", image_count);
        log::info!("swapchain format: {:?}", format);
        log::info!("swapchain present mode: {:?}", present_mode);

        let create_info = vk::SwapchainCreateInfoKHR::default()
            .surface(surface.handle)
            .min_image_count(image_count)
            .image_format(format)
            .image_color_space(color_space)
            .image_extent(extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .pre_transform(surface_capabilities.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(present_mode)
            .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
            .clipped(true);

        let (swapchain_handle, swapchain_pf) = unsafe {
            let swapchain_pf = ash::khr::swapchain::Device::new(rhi.instance().handle(), rhi.device());
            let swapchain_handle = swapchain_pf.create_swapchain(&create_info, None).unwrap();
            rhi.device().debug_utils.set_object_debug_name(swapchain_handle, "main-swapchain");

            (swapchain_handle, swapchain_pf)
        };

        let (images, image_views) = Self::create_images_and_views(rhi, swapchain_handle, &swapchain_pf, format);

        Self {
            swapchain_pf,
            swapchain_handle,
            images,
            image_views,
            extent,
            color_format: format,
            _surface: surface,
            device: rhi.device_arc(),
        }
    }

    fn create_images_and_views(
        rhi: &Rhi,
        swapchain_handle: vk::SwapchainKHR,
        swapchain_pf: &ash::khr::swapchain::Device,
        format: vk::Format,
    ) -> (Vec<vk::Image>, Vec<vk::ImageView>) {
        let swapchain_images = unsafe { swapchain_pf.get_swapchain_images(swapchain_handle).unwrap() };

        let image_views = swapchain_images
            .iter()
            .map(|img| {
                let create_info = vk::ImageViewCreateInfo::default()
                    .image(*img)
                    .format(format)
                    .view_type(vk::ImageViewType::TYPE_2D)
                    .subresource_range(
                        vk::ImageSubresourceRange::default()
                            .aspect_mask(vk::ImageAspectFlags::COLOR)
                            .layer_count(1)
                            .level_count(1),
                    );

                unsafe { rhi.device().create_image_view(&create_info, None).unwrap() }
            })
            .collect_vec();

        // 为 images 和 image_views 设置 debug name
        for (i, (image, view)) in swapchain_images.iter().zip(image_views.iter()).enumerate() {
            rhi.device().debug_utils.set_object_debug_name(*image, format!("swapchain-image-{}", i));
            rhi.device().debug_utils.set_object_debug_name(*view, format!("swapchain-image-view-{}", i));
        }

        (swapchain_images, image_views)
    }

    /// 找到一个合适的 present mode
    ///
    /// # param
    /// * present_mode - 优先使用的 present mode
    fn init_present_mode(rhi: &Rhi, surface: &RhiSurface, present_mode: vk::PresentModeKHR) -> vk::PresentModeKHR {
        unsafe {
            surface
                .pf
                .get_physical_device_surface_present_modes(rhi.physical_device().handle, surface.handle)
                .unwrap()
                .iter()
                .find_or_first(|p| **p == present_mode)
                .copied()
                .unwrap()
        }
    }

    /// 找到合适的 format 和 colorspace
    fn init_format_and_colorspace(rhi: &Rhi, surface: &RhiSurface) -> (vk::Format, vk::ColorSpaceKHR) {
        let preferred = vk::SurfaceFormatKHR {
            format: vk::Format::B8G8R8A8_UNORM,
            color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
        };

        let surface_format = unsafe {
            surface
                .pf
                .get_physical_device_surface_formats(rhi.physical_device().handle, surface.handle)
                .unwrap()
                .into_iter()
                .find_or_first(|f| *f == preferred)
                .unwrap()
        };

        (surface_format.format, surface_format.color_space)
    }
}

// getter
impl RhiSwapchain {
    #[inline]
    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    #[inline]
    pub fn image(&self, index: usize) -> vk::Image {
        self.images[index]
    }

    #[inline]
    pub fn image_view(&self, index: usize) -> vk::ImageView {
        self.image_views[index]
    }

    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    #[inline]
    pub fn color_format(&self) -> vk::Format {
        self.color_format
    }
}

// tools
impl RhiSwapchain {
    /// 向 presentation engine 索要下一个可写入的 image，返回其 index
    ///
    /// semaphore 会在 image 真正可用时被 signal
    #[inline]
    pub fn acquire_next_image(&self, semaphore: &RhiSemaphore) -> u32 {
        let (image_index, _is_suboptimal) = unsafe {
            self.swapchain_pf
                .acquire_next_image(self.swapchain_handle, u64::MAX, semaphore.handle(), vk::Fence::null())
                .unwrap()
        };

        image_index
    }

    /// 请求呈现 image_index 对应的 image
    ///
    /// 该调用可能因为 vsync 短暂阻塞，但不会等待 GPU 渲染完成
    #[inline]
    pub fn present(&self, queue: &RhiQueue, image_index: u32, wait_semaphore: &RhiSemaphore) {
        let wait_semaphores = [wait_semaphore.handle()];
        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .image_indices(std::slice::from_ref(&image_index))
            .swapchains(std::slice::from_ref(&self.swapchain_handle));

        unsafe { self.swapchain_pf.queue_present(queue.handle(), &present_info).unwrap() };
    }
}

impl Drop for RhiSwapchain {
    fn drop(&mut self) {
        log::info!("destroying swapchain");
        unsafe {
            for view in &self.image_views {
                self.device.destroy_image_view(*view, None);
            }
            self.swapchain_pf.destroy_swapchain(self.swapchain_handle, None);
        }
    }
}
