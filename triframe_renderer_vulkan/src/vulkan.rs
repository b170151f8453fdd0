/// VulkanGraphicsDevice - Vulkan implementation of the GraphicsDevice trait

use ash::vk;
use gpu_allocator::vulkan::{Allocator, AllocatorCreateDesc};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use std::ffi::CStr;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use triframe_engine::triframe::render::{
    select_hardware_device, CommandQueue, CommandQueueDesc, DeviceConfig, Framebuffer, FramebufferDesc,
    GraphicsDevice, HwDeviceDesc, QueueType, RenderPipelineDesc, RenderPipelineState, Texture, TextureDesc,
};
use triframe_engine::triframe::surface::SurfaceSize;
use triframe_engine::triframe::{Error, Result};
use triframe_engine::{engine_debug, engine_err, engine_error, engine_info, engine_warn};

use crate::vulkan_command_queue::VulkanCommandQueue;
use crate::vulkan_context::{FrameSync, GpuContext, GpuContextParts};
use crate::vulkan_format::hw_device_type_from_vk;
use crate::vulkan_frame_buffer::VulkanFramebuffer;
use crate::vulkan_pipeline::VulkanRenderPipelineState;
use crate::vulkan_swapchain::Swapchain;
use crate::vulkan_texture::VulkanTexture;

const VALIDATION_LAYER: &CStr = c"VK_LAYER_KHRONOS_validation";

/// A GPU able to render to the window surface
struct Candidate {
    physical_device: vk::PhysicalDevice,
    desc: HwDeviceDesc,
    graphics_family: u32,
    present_family: u32,
}

/// Vulkan device implementation
///
/// Central object for creating resources. Owns the swapchain of the window
/// it was created for; everything else lives in the shared `GpuContext`.
pub struct VulkanGraphicsDevice {
    swapchain: Swapchain,
    context: Arc<GpuContext>,
    config: DeviceConfig,
}

impl VulkanGraphicsDevice {
    /// Create the instance, pick a GPU, create the device and the first swapchain
    ///
    /// `size` is the window's current size in pixels. The window must outlive
    /// the device.
    pub fn new<W: HasDisplayHandle + HasWindowHandle>(
        window: &W,
        size: SurfaceSize,
        config: DeviceConfig,
    ) -> Result<Self> {
        unsafe {
            // Create Vulkan Entry
            let entry = ash::Entry::load()
                .map_err(|e| {
                    engine_error!("triframe::vulkan", "Failed to load Vulkan library: {:?}", e);
                    Error::InitializationFailed(format!("Failed to load Vulkan library: {:?}", e))
                })?;

            let validation = Self::validation_requested(&entry, &config);

            let app_info = vk::ApplicationInfo::default()
                .application_name(c"Triframe Application")
                .application_version(vk::make_api_version(0, 1, 0, 0))
                .engine_name(c"Triframe")
                .engine_version(vk::make_api_version(0, 0, 1, 0))
                .api_version(vk::API_VERSION_1_3);

            // Get required extensions
            let display_handle = window.display_handle()
                .map_err(|e| {
                    engine_error!("triframe::vulkan", "Failed to get display handle: {}", e);
                    Error::InitializationFailed(format!("Failed to get display handle: {}", e))
                })?;
            let mut extension_names = ash_window::enumerate_required_extensions(display_handle.as_raw())
                .map_err(|e| {
                    engine_error!("triframe::vulkan", "Failed to get required extensions: {}", e);
                    Error::InitializationFailed(format!("Failed to get required extensions: {}", e))
                })?
                .to_vec();

            let layer_names = if validation {
                extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
                vec![VALIDATION_LAYER.as_ptr()]
            } else {
                vec![]
            };

            let create_info = vk::InstanceCreateInfo::default()
                .application_info(&app_info)
                .enabled_layer_names(&layer_names)
                .enabled_extension_names(&extension_names);

            let instance = entry
                .create_instance(&create_info, None)
                .map_err(|e| {
                    engine_error!("triframe::vulkan", "Failed to create Vulkan instance: {:?}", e);
                    Error::InitializationFailed(format!("Failed to create instance: {:?}", e))
                })?;

            #[cfg(feature = "vulkan-validation")]
            let debug_messenger = if validation {
                Some(crate::debug::create_debug_messenger(&entry, &instance, config.terminate_on_validation_error)?)
            } else {
                None
            };
            #[cfg(not(feature = "vulkan-validation"))]
            let debug_messenger = None;

            let window_handle = window.window_handle()
                .map_err(|e| {
                    engine_error!("triframe::vulkan", "Failed to get window handle: {}", e);
                    Error::InitializationFailed(format!("Failed to get window handle: {}", e))
                })?;
            let surface = ash_window::create_surface(
                &entry,
                &instance,
                display_handle.as_raw(),
                window_handle.as_raw(),
                None,
            )
            .map_err(|e| {
                engine_error!("triframe::vulkan", "Failed to create surface: {:?}", e);
                Error::InitializationFailed(format!("Failed to create surface: {:?}", e))
            })?;
            let surface_loader = ash::khr::surface::Instance::new(&entry, &instance);

            // Pick Physical Device
            let candidates = Self::enumerate_candidates(&instance, &surface_loader, surface, &config)?;
            let descs: Vec<HwDeviceDesc> = candidates.iter().map(|c| c.desc.clone()).collect();
            let chosen = select_hardware_device(&descs)?;
            let Some(candidate) = candidates.into_iter().nth(chosen) else {
                return Err(Error::DeviceNotFound);
            };
            engine_info!("triframe::vulkan", "Selected GPU: {} ({:?})",
                candidate.desc.name, candidate.desc.device_type);

            // Create Logical Device
            let queue_priorities = [1.0];
            let mut queue_create_infos = vec![
                vk::DeviceQueueCreateInfo::default()
                    .queue_family_index(candidate.graphics_family)
                    .queue_priorities(&queue_priorities),
            ];
            if candidate.present_family != candidate.graphics_family {
                queue_create_infos.push(
                    vk::DeviceQueueCreateInfo::default()
                        .queue_family_index(candidate.present_family)
                        .queue_priorities(&queue_priorities),
                );
            }

            let device_extension_names = [ash::khr::swapchain::NAME.as_ptr()];
            let mut vulkan13_features = vk::PhysicalDeviceVulkan13Features::default()
                .dynamic_rendering(true);

            let device_create_info = vk::DeviceCreateInfo::default()
                .queue_create_infos(&queue_create_infos)
                .enabled_extension_names(&device_extension_names)
                .push_next(&mut vulkan13_features);

            let device = instance
                .create_device(candidate.physical_device, &device_create_info, None)
                .map_err(|e| {
                    engine_error!("triframe::vulkan", "Failed to create logical device: {:?}", e);
                    Error::InitializationFailed(format!("Failed to create device: {:?}", e))
                })?;

            // Create GPU allocator
            let allocator = Allocator::new(&AllocatorCreateDesc {
                instance: instance.clone(),
                device: device.clone(),
                physical_device: candidate.physical_device,
                debug_settings: Default::default(),
                buffer_device_address: false,
                allocation_sizes: Default::default(),
            })
            .map_err(|e| {
                engine_error!("triframe::vulkan", "Failed to create GPU allocator: {:?}", e);
                Error::InitializationFailed(format!("Failed to create allocator: {:?}", e))
            })?;

            // Signaled so the first frame does not wait
            let in_flight = device
                .create_fence(&vk::FenceCreateInfo::default().flags(vk::FenceCreateFlags::SIGNALED), None)
                .map_err(|e| {
                    engine_error!("triframe::vulkan", "Failed to create frame fence: {:?}", e);
                    Error::InitializationFailed(format!("Failed to create fence: {:?}", e))
                })?;
            let image_available = device
                .create_semaphore(&vk::SemaphoreCreateInfo::default(), None)
                .map_err(|e| {
                    engine_error!("triframe::vulkan", "Failed to create acquire semaphore: {:?}", e);
                    Error::InitializationFailed(format!("Failed to create semaphore: {:?}", e))
                })?;

            let debug_labels = validation.then(|| ash::ext::debug_utils::Device::new(&instance, &device));

            // GpuContext owns device, surface, instance and debug messenger destruction
            let context = Arc::new(GpuContext::new(GpuContextParts {
                entry,
                instance,
                debug_messenger,
                surface,
                surface_loader,
                physical_device: candidate.physical_device,
                hw_device: candidate.desc,
                device,
                graphics_queue_family: candidate.graphics_family,
                present_queue_family: candidate.present_family,
                allocator,
                frame_sync: FrameSync {
                    in_flight,
                    image_available,
                    acquire_pending: AtomicBool::new(false),
                },
                debug_labels,
            }));

            let swapchain = Swapchain::new(Arc::clone(&context), size, config.swapchain_color_space)?;

            Ok(Self { swapchain, context, config })
        }
    }

    /// Configuration the device was created with
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Size of the current swapchain images, None while the surface is empty
    pub fn swapchain_size(&self) -> Option<SurfaceSize> {
        self.swapchain.extent().map(|extent| SurfaceSize::new(extent.width, extent.height))
    }

    /// Whether to load the validation layer
    ///
    /// Needs the `vulkan-validation` feature, `enable_validation` and an
    /// installed Khronos layer. A missing layer only disables validation.
    fn validation_requested(entry: &ash::Entry, config: &DeviceConfig) -> bool {
        if !cfg!(feature = "vulkan-validation") || !config.enable_validation {
            return false;
        }

        let layers = match unsafe { entry.enumerate_instance_layer_properties() } {
            Ok(layers) => layers,
            Err(e) => {
                engine_warn!("triframe::vulkan", "Failed to enumerate instance layers: {:?}", e);
                return false;
            }
        };
        let available = layers
            .iter()
            .any(|layer| layer.layer_name_as_c_str().is_ok_and(|name| name == VALIDATION_LAYER));
        if !available {
            engine_warn!("triframe::vulkan",
                "Validation requested but {:?} is not installed, continuing without it", VALIDATION_LAYER);
        }
        available
    }

    /// List the GPUs able to run the engine on this surface
    ///
    /// A GPU qualifies with Vulkan 1.3 dynamic rendering, a graphics queue,
    /// a queue able to present to `surface`, and per-stage descriptor limits
    /// covering `max_textures` and `max_samplers`.
    unsafe fn enumerate_candidates(
        instance: &ash::Instance,
        surface_loader: &ash::khr::surface::Instance,
        surface: vk::SurfaceKHR,
        config: &DeviceConfig,
    ) -> Result<Vec<Candidate>> {
        let physical_devices = instance
            .enumerate_physical_devices()
            .map_err(|e| {
                engine_error!("triframe::vulkan", "Failed to enumerate physical devices: {:?}", e);
                Error::InitializationFailed(format!("Failed to enumerate physical devices: {:?}", e))
            })?;

        let mut candidates = Vec::new();
        for physical_device in physical_devices {
            let properties = instance.get_physical_device_properties(physical_device);
            let name = properties
                .device_name_as_c_str()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|_| "Unknown GPU".to_string());

            if properties.api_version < vk::API_VERSION_1_3 {
                engine_debug!("triframe::vulkan", "Skipping {}: Vulkan 1.3 not supported", name);
                continue;
            }

            let mut vulkan13_features = vk::PhysicalDeviceVulkan13Features::default();
            let mut features = vk::PhysicalDeviceFeatures2::default().push_next(&mut vulkan13_features);
            instance.get_physical_device_features2(physical_device, &mut features);
            if vulkan13_features.dynamic_rendering == vk::FALSE {
                engine_debug!("triframe::vulkan", "Skipping {}: no dynamic rendering", name);
                continue;
            }

            let limits = &properties.limits;
            if limits.max_per_stage_descriptor_sampled_images < config.max_textures
                || limits.max_per_stage_descriptor_samplers < config.max_samplers
            {
                engine_warn!("triframe::vulkan",
                    "Skipping {}: supports {} textures / {} samplers per stage, {} / {} requested",
                    name, limits.max_per_stage_descriptor_sampled_images, limits.max_per_stage_descriptor_samplers,
                    config.max_textures, config.max_samplers);
                continue;
            }

            // Find Queue Families
            let queue_families = instance.get_physical_device_queue_family_properties(physical_device);
            let graphics_family = queue_families
                .iter()
                .position(|qf| qf.queue_flags.contains(vk::QueueFlags::GRAPHICS))
                .map(|i| i as u32);
            let supports_present = |i: u32| {
                surface_loader
                    .get_physical_device_surface_support(physical_device, i, surface)
                    .unwrap_or(false)
            };
            // Prefer a family doing both
            let present_family = graphics_family
                .filter(|&i| supports_present(i))
                .or_else(|| (0..queue_families.len() as u32).find(|&i| supports_present(i)));

            let (Some(graphics_family), Some(present_family)) = (graphics_family, present_family) else {
                engine_debug!("triframe::vulkan", "Skipping {}: no graphics or present queue", name);
                continue;
            };

            engine_debug!("triframe::vulkan", "Candidate GPU: {} (graphics family {}, present family {})",
                name, graphics_family, present_family);
            candidates.push(Candidate {
                physical_device,
                desc: HwDeviceDesc {
                    name,
                    device_type: hw_device_type_from_vk(properties.device_type),
                },
                graphics_family,
                present_family,
            });
        }
        Ok(candidates)
    }
}

impl GraphicsDevice for VulkanGraphicsDevice {
    fn hw_device(&self) -> &HwDeviceDesc {
        &self.context.hw_device
    }

    fn create_command_queue(&self, desc: &CommandQueueDesc) -> Result<Box<dyn CommandQueue>> {
        match desc.queue_type {
            QueueType::Graphics => Ok(Box::new(VulkanCommandQueue::new(Arc::clone(&self.context)))),
        }
    }

    fn create_texture(&self, desc: &TextureDesc) -> Result<Arc<dyn Texture>> {
        Ok(Arc::new(VulkanTexture::allocate(&self.context, desc)?))
    }

    fn create_framebuffer(&self, desc: FramebufferDesc) -> Result<Box<dyn Framebuffer>> {
        Ok(Box::new(VulkanFramebuffer::new(desc)?))
    }

    fn create_render_pipeline(&self, desc: &RenderPipelineDesc) -> Result<Arc<dyn RenderPipelineState>> {
        Ok(Arc::new(VulkanRenderPipelineState::new(&self.context, desc)?))
    }

    fn acquire_drawable(&mut self) -> Result<Option<Arc<dyn Texture>>> {
        Ok(self
            .swapchain
            .acquire()?
            .map(|drawable| Arc::new(drawable) as Arc<dyn Texture>))
    }

    fn init_swapchain(&mut self, width: u32, height: u32) -> Result<()> {
        self.swapchain.recreate(width, height)
    }

    fn wait_idle(&self) -> Result<()> {
        unsafe {
            self.context
                .device
                .device_wait_idle()
                .map_err(|e| engine_err!("triframe::vulkan", "Failed to wait for device idle: {:?}", e))
        }
    }
}

impl Drop for VulkanGraphicsDevice {
    fn drop(&mut self) {
        unsafe {
            self.context.device.device_wait_idle().ok();
        }
        engine_debug!("triframe::vulkan", "Graphics device dropped");
    }
}
