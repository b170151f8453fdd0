/// Texture - Vulkan implementation of the Texture trait
///
/// Two kinds of textures share this type: images allocated through
/// gpu-allocator (off-screen color and depth attachments), and swapchain
/// images handed out as drawables. The latter own nothing; they keep their
/// swapchain alive until the framebuffer lets go of them.

use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use gpu_allocator::MemoryLocation;
use std::any::Any;
use std::sync::Arc;
use triframe_engine::triframe::render::{
    Texture, TextureDesc, TextureDimensions, TextureFormat, TextureUsage,
};
use triframe_engine::triframe::{Error, Result};
use triframe_engine::{engine_bail, engine_err, engine_error, engine_trace};

use crate::vulkan_context::GpuContext;
use crate::vulkan_format::{aspect_mask, texture_format_to_vk};
use crate::vulkan_swapchain::SwapchainImages;

enum TextureStorage {
    /// Image and memory owned by the texture
    Allocated {
        image: vk::Image,
        view: vk::ImageView,
        allocation: Option<Allocation>,
        context: Arc<GpuContext>,
    },
    /// One image of a swapchain
    Swapchain {
        chain: Arc<SwapchainImages>,
        index: u32,
    },
}

/// Vulkan texture implementation
pub struct VulkanTexture {
    storage: TextureStorage,
    format: TextureFormat,
    dimensions: TextureDimensions,
    usage: TextureUsage,
}

impl VulkanTexture {
    /// Create an image, bind device-local memory to it and build its view
    pub(crate) fn allocate(context: &Arc<GpuContext>, desc: &TextureDesc) -> Result<Self> {
        let TextureDimensions { width, height } = desc.dimensions;
        if width == 0 || height == 0 {
            engine_bail!(InvalidResource, "triframe::vulkan",
                "Texture '{}' has an empty size {}x{}", desc.debug_name, width, height);
        }
        if desc.usage.is_empty() {
            engine_bail!(InvalidResource, "triframe::vulkan",
                "Texture '{}' has no usage flags", desc.debug_name);
        }

        let format = texture_format_to_vk(desc.format);
        let mut usage = vk::ImageUsageFlags::empty();
        if desc.usage.contains(TextureUsage::ATTACHMENT) {
            usage |= if desc.format.is_depth() {
                vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT
            } else {
                vk::ImageUsageFlags::COLOR_ATTACHMENT
            };
        }
        if desc.usage.contains(TextureUsage::SAMPLED) {
            usage |= vk::ImageUsageFlags::SAMPLED;
        }

        let device = &context.device;
        unsafe {
            let image_info = vk::ImageCreateInfo::default()
                .image_type(vk::ImageType::TYPE_2D)
                .format(format)
                .extent(vk::Extent3D { width, height, depth: 1 })
                .mip_levels(1)
                .array_layers(1)
                .samples(vk::SampleCountFlags::TYPE_1)
                .tiling(vk::ImageTiling::OPTIMAL)
                .usage(usage)
                .sharing_mode(vk::SharingMode::EXCLUSIVE)
                .initial_layout(vk::ImageLayout::UNDEFINED);

            let image = device.create_image(&image_info, None).map_err(|e| {
                engine_err!("triframe::vulkan", "Failed to create image '{}': {:?}", desc.debug_name, e)
            })?;

            let requirements = device.get_image_memory_requirements(image);
            let allocation = {
                let Ok(mut allocator) = context.allocator.lock() else {
                    device.destroy_image(image, None);
                    engine_bail!("triframe::vulkan", "GPU allocator lock poisoned");
                };
                allocator.allocate(&AllocationCreateDesc {
                    name: &desc.debug_name,
                    requirements,
                    location: MemoryLocation::GpuOnly,
                    linear: false,
                    allocation_scheme: AllocationScheme::DedicatedImage(image),
                })
            };
            let allocation = match allocation {
                Ok(allocation) => allocation,
                Err(gpu_allocator::AllocationError::OutOfMemory) => {
                    device.destroy_image(image, None);
                    engine_error!("triframe::vulkan",
                        "Out of GPU memory allocating '{}' ({}x{})", desc.debug_name, width, height);
                    return Err(Error::OutOfMemory);
                }
                Err(e) => {
                    device.destroy_image(image, None);
                    engine_bail!("triframe::vulkan",
                        "Failed to allocate memory for '{}': {:?}", desc.debug_name, e);
                }
            };

            let (memory, offset) = (allocation.memory(), allocation.offset());

            // From here on, Drop releases whatever was created
            let mut texture = Self {
                storage: TextureStorage::Allocated {
                    image,
                    view: vk::ImageView::null(),
                    allocation: Some(allocation),
                    context: Arc::clone(context),
                },
                format: desc.format,
                dimensions: desc.dimensions,
                usage: desc.usage,
            };

            device.bind_image_memory(image, memory, offset).map_err(|e| {
                engine_err!("triframe::vulkan", "Failed to bind memory of '{}': {:?}", desc.debug_name, e)
            })?;

            let new_view = create_image_view(device, image, format, aspect_mask(desc.format))
                .map_err(|e| {
                    engine_err!("triframe::vulkan", "Failed to create image view of '{}': {:?}", desc.debug_name, e)
                })?;
            if let TextureStorage::Allocated { view, .. } = &mut texture.storage {
                *view = new_view;
            }

            context.set_object_name(image, &desc.debug_name);
            engine_trace!("triframe::vulkan", "Texture '{}' created ({}x{}, {:?})",
                desc.debug_name, width, height, desc.format);

            Ok(texture)
        }
    }

    /// Wrap one image of a swapchain
    pub(crate) fn from_swapchain(chain: Arc<SwapchainImages>, index: u32) -> Self {
        let extent = chain.extent();
        Self {
            format: chain.format(),
            dimensions: TextureDimensions::new(extent.width, extent.height),
            usage: TextureUsage::ATTACHMENT,
            storage: TextureStorage::Swapchain { chain, index },
        }
    }

    pub(crate) fn image(&self) -> vk::Image {
        match &self.storage {
            TextureStorage::Allocated { image, .. } => *image,
            TextureStorage::Swapchain { chain, index } => chain.image(*index),
        }
    }

    pub(crate) fn view(&self) -> vk::ImageView {
        match &self.storage {
            TextureStorage::Allocated { view, .. } => *view,
            TextureStorage::Swapchain { chain, index } => chain.view(*index),
        }
    }

    /// The swapchain and image index, for drawables
    pub(crate) fn swapchain_image(&self) -> Option<(&Arc<SwapchainImages>, u32)> {
        match &self.storage {
            TextureStorage::Allocated { .. } => None,
            TextureStorage::Swapchain { chain, index } => Some((chain, *index)),
        }
    }

    /// Layout the image is left in at the end of a render pass
    pub(crate) fn settled_layout(&self) -> vk::ImageLayout {
        match &self.storage {
            TextureStorage::Swapchain { .. } => vk::ImageLayout::PRESENT_SRC_KHR,
            TextureStorage::Allocated { .. } if self.format.is_depth() => {
                vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL
            }
            TextureStorage::Allocated { .. } => vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        }
    }
}

/// Downcast an engine texture to the Vulkan one
pub(crate) fn as_vulkan_texture<'a>(texture: &'a dyn Texture, what: &str) -> Result<&'a VulkanTexture> {
    texture.as_any().downcast_ref::<VulkanTexture>().ok_or_else(|| {
        engine_err!(InvalidResource, "triframe::vulkan", "{} is not a Vulkan texture", what)
    })
}

pub(crate) fn create_image_view(
    device: &ash::Device,
    image: vk::Image,
    format: vk::Format,
    aspect_mask: vk::ImageAspectFlags,
) -> std::result::Result<vk::ImageView, vk::Result> {
    let create_info = vk::ImageViewCreateInfo::default()
        .image(image)
        .view_type(vk::ImageViewType::TYPE_2D)
        .format(format)
        .components(vk::ComponentMapping {
            r: vk::ComponentSwizzle::IDENTITY,
            g: vk::ComponentSwizzle::IDENTITY,
            b: vk::ComponentSwizzle::IDENTITY,
            a: vk::ComponentSwizzle::IDENTITY,
        })
        .subresource_range(vk::ImageSubresourceRange {
            aspect_mask,
            base_mip_level: 0,
            level_count: 1,
            base_array_layer: 0,
            layer_count: 1,
        });
    unsafe { device.create_image_view(&create_info, None) }
}

impl Texture for VulkanTexture {
    fn format(&self) -> TextureFormat {
        self.format
    }

    fn dimensions(&self) -> TextureDimensions {
        self.dimensions
    }

    fn usage(&self) -> TextureUsage {
        self.usage
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for VulkanTexture {
    fn drop(&mut self) {
        let TextureStorage::Allocated { image, view, allocation, context } = &mut self.storage else {
            return;
        };
        unsafe {
            if *view != vk::ImageView::null() {
                context.device.destroy_image_view(*view, None);
            }

            // Free GPU memory
            if let Some(allocation) = allocation.take() {
                if let Ok(mut allocator) = context.allocator.lock() {
                    allocator.free(allocation).ok();
                }
            }

            context.device.destroy_image(*image, None);
        }
    }
}
