/// Swapchain - presentable images of the window surface
///
/// `Swapchain` is owned by the device: it acquires drawables and recreates
/// the chain on resize. Each generation of the chain lives in a
/// `SwapchainImages`, shared by the drawables taken from it, so a retired
/// chain is destroyed only once the last framebuffer referencing one of its
/// images is rebuilt.

use ash::vk;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use triframe_engine::triframe::render::{ColorSpace, TextureFormat};
use triframe_engine::triframe::surface::SurfaceSize;
use triframe_engine::triframe::{Error, Result};
use triframe_engine::{engine_debug, engine_err, engine_error, engine_info, engine_trace, engine_warn};

use crate::vulkan_context::GpuContext;
use crate::vulkan_format::choose_surface_format;
use crate::vulkan_texture::{create_image_view, VulkanTexture};

/// One generation of the swapchain
pub(crate) struct SwapchainImages {
    context: Arc<GpuContext>,
    handle: vk::SwapchainKHR,
    images: Vec<vk::Image>,
    views: Vec<vk::ImageView>,
    /// One semaphore per image, signaled by the submission rendering to it
    render_finished: Vec<vk::Semaphore>,
    extent: vk::Extent2D,
    format: TextureFormat,
}

impl SwapchainImages {
    pub(crate) fn handle(&self) -> vk::SwapchainKHR {
        self.handle
    }

    pub(crate) fn image(&self, index: u32) -> vk::Image {
        self.images[index as usize]
    }

    pub(crate) fn view(&self, index: u32) -> vk::ImageView {
        self.views[index as usize]
    }

    pub(crate) fn render_finished(&self, index: u32) -> vk::Semaphore {
        self.render_finished[index as usize]
    }

    pub(crate) fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    pub(crate) fn format(&self) -> TextureFormat {
        self.format
    }

    pub(crate) fn image_count(&self) -> usize {
        self.images.len()
    }
}

impl Drop for SwapchainImages {
    fn drop(&mut self) {
        let device = &self.context.device;
        unsafe {
            // Nothing may still be rendering to or presenting these images
            device.device_wait_idle().ok();

            for &semaphore in &self.render_finished {
                device.destroy_semaphore(semaphore, None);
            }
            for &view in &self.views {
                device.destroy_image_view(view, None);
            }
            self.context.swapchain_loader.destroy_swapchain(self.handle, None);
        }
        engine_trace!("triframe::vulkan", "Swapchain {}x{} destroyed", self.extent.width, self.extent.height);
    }
}

/// Vulkan swapchain owner
///
/// Handles image acquisition and recreation on resize. Presentation is done
/// by the command queue, from the drawable attached to a command buffer.
pub(crate) struct Swapchain {
    context: Arc<GpuContext>,
    color_space: ColorSpace,
    /// None while the surface has a zero size
    current: Option<Arc<SwapchainImages>>,
}

impl Swapchain {
    /// Create the first swapchain for the surface
    pub(crate) fn new(context: Arc<GpuContext>, size: SurfaceSize, color_space: ColorSpace) -> Result<Self> {
        let mut swapchain = Self { context, color_space, current: None };
        swapchain.current = swapchain.create(size.width, size.height)?;
        Ok(swapchain)
    }

    /// Size of the current swapchain images, None while minimized
    pub(crate) fn extent(&self) -> Option<vk::Extent2D> {
        self.current.as_ref().map(|chain| chain.extent())
    }

    /// Acquire the next image as a drawable
    ///
    /// Waits for the previous frame's submission first. An out-of-date
    /// swapchain is recreated from the surface's current extent and the
    /// acquisition retried once; `Ok(None)` means there still was no image.
    pub(crate) fn acquire(&mut self) -> Result<Option<VulkanTexture>> {
        let in_flight = self.context.frame_sync.in_flight;
        let image_available = self.context.frame_sync.image_available;
        unsafe {
            self.context
                .device
                .wait_for_fences(&[in_flight], true, u64::MAX)
                .map_err(|e| engine_err!("triframe::vulkan", "Failed to wait for the frame fence: {:?}", e))?;
        }
        if self.context.frame_sync.acquire_pending.swap(false, Ordering::AcqRel) {
            self.consume_image_available()?;
        }

        for attempt in 0..2 {
            let Some(chain) = self.current.clone() else {
                return Ok(None);
            };

            let acquired = unsafe {
                self.context.swapchain_loader.acquire_next_image(
                    chain.handle,
                    u64::MAX,
                    image_available,
                    vk::Fence::null(),
                )
            };

            match acquired {
                Ok((index, suboptimal)) => {
                    if suboptimal {
                        engine_trace!("triframe::vulkan", "Swapchain image {} is suboptimal", index);
                    }
                    self.context.frame_sync.acquire_pending.store(true, Ordering::Release);
                    return Ok(Some(VulkanTexture::from_swapchain(chain, index)));
                }
                Err(vk::Result::ERROR_OUT_OF_DATE_KHR) if attempt == 0 => {
                    engine_warn!("triframe::vulkan", "Swapchain out of date during acquire, recreating");
                    let extent = chain.extent();
                    drop(chain);
                    self.recreate(extent.width, extent.height)?;
                }
                Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                    engine_warn!("triframe::vulkan", "Swapchain still out of date after recreation");
                    return Ok(None);
                }
                Err(e) => {
                    return Err(engine_err!(DrawableUnavailable, "triframe::vulkan",
                        "Failed to acquire next swapchain image: {:?}", e));
                }
            }
        }
        Ok(None)
    }

    /// Unsignal `image_available` after a drawable was acquired but never
    /// rendered to
    fn consume_image_available(&self) -> Result<()> {
        engine_debug!("triframe::vulkan", "Previous drawable was never submitted, draining its acquire semaphore");
        let wait_semaphores = [self.context.frame_sync.image_available];
        let wait_stages = [vk::PipelineStageFlags::TOP_OF_PIPE];
        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages);
        unsafe {
            let device = &self.context.device;
            device
                .queue_submit(self.context.graphics_queue, &[submit_info], vk::Fence::null())
                .map_err(|e| engine_err!("triframe::vulkan", "Failed to drain acquire semaphore: {:?}", e))?;
            device
                .queue_wait_idle(self.context.graphics_queue)
                .map_err(|e| engine_err!("triframe::vulkan", "Failed to wait for the graphics queue: {:?}", e))?;
        }
        Ok(())
    }

    /// Replace the swapchain for a new surface size
    ///
    /// A zero size keeps the current chain: nothing is rendered while the
    /// window is minimized.
    pub(crate) fn recreate(&mut self, width: u32, height: u32) -> Result<()> {
        if width == 0 || height == 0 {
            engine_debug!("triframe::vulkan", "Swapchain recreation skipped for an empty {}x{} surface", width, height);
            return Ok(());
        }

        unsafe {
            self.context
                .device
                .device_wait_idle()
                .map_err(|e| engine_err!("triframe::vulkan", "Failed to wait idle before swapchain recreate: {:?}", e))?;
        }

        if let Some(chain) = self.create(width, height)? {
            self.current = Some(chain);
        }
        Ok(())
    }

    /// Build a new generation, retiring the current one
    ///
    /// Returns None when the surface currently reports a zero extent.
    fn create(&self, width: u32, height: u32) -> Result<Option<Arc<SwapchainImages>>> {
        let context = &self.context;
        unsafe {
            let capabilities = context
                .surface_loader
                .get_physical_device_surface_capabilities(context.physical_device, context.surface)
                .map_err(|e| {
                    engine_error!("triframe::vulkan", "Failed to get surface capabilities: {:?}", e);
                    Error::InitializationFailed(format!("Failed to get surface capabilities: {:?}", e))
                })?;

            // Choose extent
            let extent = if capabilities.current_extent.width != u32::MAX {
                capabilities.current_extent
            } else {
                vk::Extent2D {
                    width: width.clamp(capabilities.min_image_extent.width, capabilities.max_image_extent.width),
                    height: height.clamp(capabilities.min_image_extent.height, capabilities.max_image_extent.height),
                }
            };
            if extent.width == 0 || extent.height == 0 {
                return Ok(None);
            }

            let surface_formats = context
                .surface_loader
                .get_physical_device_surface_formats(context.physical_device, context.surface)
                .map_err(|e| {
                    engine_error!("triframe::vulkan", "Failed to query surface formats: {:?}", e);
                    Error::InitializationFailed(format!("Failed to get surface formats: {:?}", e))
                })?;
            let Some((surface_format, format)) = choose_surface_format(&surface_formats, self.color_space) else {
                engine_error!("triframe::vulkan", "No supported surface format among {:?}", surface_formats);
                return Err(Error::InitializationFailed("No supported swapchain surface format".to_string()));
            };

            let image_count = capabilities.min_image_count + 1;
            let image_count = if capabilities.max_image_count > 0 {
                image_count.min(capabilities.max_image_count)
            } else {
                image_count
            };

            let queue_families = [context.graphics_queue_family, context.present_queue_family];
            let old_swapchain = self.current.as_ref().map_or(vk::SwapchainKHR::null(), |chain| chain.handle);

            let mut create_info = vk::SwapchainCreateInfoKHR::default()
                .surface(context.surface)
                .min_image_count(image_count)
                .image_format(surface_format.format)
                .image_color_space(surface_format.color_space)
                .image_extent(extent)
                .image_array_layers(1)
                .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
                .pre_transform(capabilities.current_transform)
                .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
                .present_mode(vk::PresentModeKHR::FIFO)
                .clipped(true)
                .old_swapchain(old_swapchain);
            create_info = if context.graphics_queue_family == context.present_queue_family {
                create_info.image_sharing_mode(vk::SharingMode::EXCLUSIVE)
            } else {
                create_info
                    .image_sharing_mode(vk::SharingMode::CONCURRENT)
                    .queue_family_indices(&queue_families)
            };

            let handle = context
                .swapchain_loader
                .create_swapchain(&create_info, None)
                .map_err(|e| {
                    engine_error!("triframe::vulkan", "Failed to create swapchain: {:?}", e);
                    Error::InitializationFailed(format!("Failed to create swapchain: {:?}", e))
                })?;

            // From here on, Drop releases whatever was created
            let mut chain = SwapchainImages {
                context: Arc::clone(context),
                handle,
                images: Vec::new(),
                views: Vec::new(),
                render_finished: Vec::new(),
                extent,
                format,
            };

            chain.images = context.swapchain_loader.get_swapchain_images(handle).map_err(|e| {
                engine_error!("triframe::vulkan", "Failed to get swapchain images: {:?}", e);
                Error::InitializationFailed(format!("Failed to get swapchain images: {:?}", e))
            })?;

            for (i, &image) in chain.images.iter().enumerate() {
                let view = create_image_view(&context.device, image, surface_format.format, vk::ImageAspectFlags::COLOR)
                    .map_err(|e| {
                        engine_error!("triframe::vulkan", "Failed to create swapchain image view: {:?}", e);
                        Error::InitializationFailed(format!("Failed to create image views: {:?}", e))
                    })?;
                chain.views.push(view);
                context.set_object_name(image, &format!("Swapchain Image {}", i));

                let semaphore = context
                    .device
                    .create_semaphore(&vk::SemaphoreCreateInfo::default(), None)
                    .map_err(|e| {
                        engine_error!("triframe::vulkan", "Failed to create render-finished semaphore: {:?}", e);
                        Error::InitializationFailed(format!("Failed to create semaphore: {:?}", e))
                    })?;
                chain.render_finished.push(semaphore);
            }

            engine_info!(
                "triframe::vulkan",
                "Swapchain created: {}x{}, {} images, {:?}",
                extent.width, extent.height, chain.image_count(), format
            );
            Ok(Some(Arc::new(chain)))
        }
    }
}
