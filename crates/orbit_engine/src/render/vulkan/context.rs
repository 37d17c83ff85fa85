//! Vulkan instance, device and surface ownership
//!
//! [`VulkanContext`] owns everything that lives for the whole run: instance,
//! optional debug messenger, window surface, physical and logical device, and
//! the swapchain. Drop order is surface-dependent objects first, then device,
//! then instance.

use std::ffi::{CStr, CString};

use ash::extensions::ext::DebugUtils;
use ash::extensions::khr::{Surface, Swapchain as SwapchainLoader};
use ash::{vk, Device, Entry, Instance};

use super::swapchain::Swapchain;
use super::window::Window;

const VALIDATION_LAYER: &CStr = unsafe { CStr::from_bytes_with_nul_unchecked(b"VK_LAYER_KHRONOS_validation\0") };
const ENGINE_NAME: &CStr = unsafe { CStr::from_bytes_with_nul_unchecked(b"OrbitEngine\0") };

/// Vulkan-specific errors
#[derive(thiserror::Error, Debug)]
pub enum VulkanError {
    /// General Vulkan API error with result code
    #[error("Vulkan API error: {0:?}")]
    Api(vk::Result),

    /// Invalid operation attempted
    #[error("Invalid operation: {reason}")]
    InvalidOperation {
        /// Description of why the operation is invalid
        reason: String,
    },

    /// Vulkan context initialization failed
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    /// No suitable memory type found for allocation
    #[error("No suitable memory type found")]
    NoSuitableMemoryType,
}

impl From<vk::Result> for VulkanError {
    fn from(result: vk::Result) -> Self {
        Self::Api(result)
    }
}

/// Result type for Vulkan operations
pub type VulkanResult<T> = Result<T, VulkanError>;

/// Vulkan instance wrapper with RAII cleanup
pub struct VulkanInstance {
    /// Vulkan entry point
    pub entry: Entry,
    /// Vulkan instance handle
    pub instance: Instance,
    debug_utils: Option<(DebugUtils, vk::DebugUtilsMessengerEXT)>,
}

impl VulkanInstance {
    /// Create an instance with the extensions GLFW needs for presentation
    ///
    /// Validation is skipped with a warning when the layer is not installed.
    pub fn new(window: &Window, app_name: &str, enable_validation: bool) -> VulkanResult<Self> {
        let entry = unsafe { Entry::load() }
            .map_err(|e| VulkanError::InitializationFailed(format!("Failed to load Vulkan: {e}")))?;

        let app_name_cstr = CString::new(app_name)
            .map_err(|_| VulkanError::InitializationFailed("application name contains NUL".to_string()))?;
        let app_info = vk::ApplicationInfo::builder()
            .application_name(&app_name_cstr)
            .application_version(vk::make_api_version(0, 1, 0, 0))
            .engine_name(ENGINE_NAME)
            .engine_version(vk::make_api_version(0, 0, 1, 0))
            .api_version(vk::API_VERSION_1_0);

        let required_extensions = window
            .required_instance_extensions()
            .map_err(|e| VulkanError::InitializationFailed(e.to_string()))?;
        let cstr_extensions = required_extensions
            .into_iter()
            .map(CString::new)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| VulkanError::InitializationFailed("extension name contains NUL".to_string()))?;

        let validation = enable_validation && Self::validation_layer_available(&entry);
        if enable_validation && !validation {
            log::warn!("Validation requested but VK_LAYER_KHRONOS_validation is not installed");
        }

        let mut extensions: Vec<*const std::os::raw::c_char> =
            cstr_extensions.iter().map(|ext| ext.as_ptr()).collect();
        if validation {
            extensions.push(DebugUtils::name().as_ptr());
        }

        let layer_names: Vec<*const std::os::raw::c_char> = if validation {
            vec![VALIDATION_LAYER.as_ptr()]
        } else {
            Vec::new()
        };

        let create_info = vk::InstanceCreateInfo::builder()
            .application_info(&app_info)
            .enabled_extension_names(&extensions)
            .enabled_layer_names(&layer_names);

        let instance = unsafe { entry.create_instance(&create_info, None)? };

        let debug_utils = if validation {
            let loader = DebugUtils::new(&entry, &instance);
            match Self::setup_debug_messenger(&loader) {
                Ok(messenger) => Some((loader, messenger)),
                Err(err) => {
                    unsafe { instance.destroy_instance(None) };
                    return Err(err);
                }
            }
        } else {
            None
        };

        log::info!(
            "Created Vulkan instance (validation {})",
            if validation { "on" } else { "off" }
        );

        Ok(Self {
            entry,
            instance,
            debug_utils,
        })
    }

    fn validation_layer_available(entry: &Entry) -> bool {
        entry
            .enumerate_instance_layer_properties()
            .map(|layers| {
                layers.iter().any(|layer| {
                    let name = unsafe { CStr::from_ptr(layer.layer_name.as_ptr()) };
                    name == VALIDATION_LAYER
                })
            })
            .unwrap_or(false)
    }

    fn setup_debug_messenger(debug_utils: &DebugUtils) -> VulkanResult<vk::DebugUtilsMessengerEXT> {
        let create_info = vk::DebugUtilsMessengerCreateInfoEXT::builder()
            .message_severity(
                vk::DebugUtilsMessageSeverityFlagsEXT::INFO
                    | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                    | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
            )
            .message_type(
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                    | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                    | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
            )
            .pfn_user_callback(Some(debug_callback));

        unsafe { Ok(debug_utils.create_debug_utils_messenger(&create_info, None)?) }
    }
}

impl Drop for VulkanInstance {
    fn drop(&mut self) {
        unsafe {
            if let Some((loader, messenger)) = self.debug_utils.take() {
                loader.destroy_debug_utils_messenger(messenger, None);
            }
            self.instance.destroy_instance(None);
        }
    }
}

/// Forwards validation layer messages into `log`
unsafe extern "system" fn debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _user_data: *mut std::ffi::c_void,
) -> vk::Bool32 {
    if callback_data.is_null() || (*callback_data).p_message.is_null() {
        return vk::FALSE;
    }
    let message = CStr::from_ptr((*callback_data).p_message).to_string_lossy();

    if message_severity >= vk::DebugUtilsMessageSeverityFlagsEXT::ERROR {
        log::error!("[Vulkan] {:?} - {}", message_type, message);
    } else if message_severity >= vk::DebugUtilsMessageSeverityFlagsEXT::WARNING {
        log::warn!("[Vulkan] {:?} - {}", message_type, message);
    } else {
        log::debug!("[Vulkan] {:?} - {}", message_type, message);
    }

    vk::FALSE
}

/// Physical device selection and capabilities
pub struct PhysicalDeviceInfo {
    /// Vulkan physical device handle
    pub device: vk::PhysicalDevice,
    /// Device properties and limits
    pub properties: vk::PhysicalDeviceProperties,
    /// Memory heaps and types
    pub memory_properties: vk::PhysicalDeviceMemoryProperties,
    /// Index of the graphics queue family
    pub graphics_family: u32,
    /// Index of the presentation queue family
    pub present_family: u32,
}

impl PhysicalDeviceInfo {
    /// Pick a GPU that can draw and present to `surface`, preferring discrete GPUs
    pub fn select_suitable_device(
        instance: &Instance,
        surface: vk::SurfaceKHR,
        surface_loader: &Surface,
    ) -> VulkanResult<Self> {
        let devices = unsafe { instance.enumerate_physical_devices()? };

        let mut candidates: Vec<Self> = devices
            .into_iter()
            .filter_map(|device| match Self::evaluate_device(instance, device, surface, surface_loader) {
                Ok(info) => Some(info),
                Err(err) => {
                    log::debug!("Skipping physical device: {}", err);
                    None
                }
            })
            .collect();

        candidates.sort_by_key(|info| info.properties.device_type != vk::PhysicalDeviceType::DISCRETE_GPU);
        let selected = candidates
            .into_iter()
            .next()
            .ok_or_else(|| VulkanError::InitializationFailed("No suitable GPU found".to_string()))?;

        log::info!("Selected GPU: {}", selected.name());
        Ok(selected)
    }

    /// Device name reported by the driver
    pub fn name(&self) -> String {
        unsafe { CStr::from_ptr(self.properties.device_name.as_ptr()) }
            .to_string_lossy()
            .into_owned()
    }

    /// Find a memory type index allowed by `type_filter` with all of `properties`
    pub fn find_memory_type(
        &self,
        type_filter: u32,
        properties: vk::MemoryPropertyFlags,
    ) -> VulkanResult<u32> {
        (0..self.memory_properties.memory_type_count)
            .find(|&i| {
                (type_filter & (1 << i)) != 0
                    && self.memory_properties.memory_types[i as usize]
                        .property_flags
                        .contains(properties)
            })
            .ok_or(VulkanError::NoSuitableMemoryType)
    }

    fn evaluate_device(
        instance: &Instance,
        device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
        surface_loader: &Surface,
    ) -> VulkanResult<Self> {
        let properties = unsafe { instance.get_physical_device_properties(device) };
        let memory_properties = unsafe { instance.get_physical_device_memory_properties(device) };
        let queue_families = unsafe { instance.get_physical_device_queue_family_properties(device) };

        let mut graphics_family = None;
        let mut present_family = None;

        for (index, family) in queue_families.iter().enumerate() {
            let index = index as u32;

            if family.queue_flags.contains(vk::QueueFlags::GRAPHICS) && graphics_family.is_none() {
                graphics_family = Some(index);
            }

            let present_support = unsafe {
                surface_loader.get_physical_device_surface_support(device, index, surface)?
            };
            if present_support && present_family.is_none() {
                present_family = Some(index);
            }

            if graphics_family.is_some() && present_family.is_some() {
                break;
            }
        }

        let graphics_family = graphics_family
            .ok_or_else(|| VulkanError::InitializationFailed("No graphics queue family found".to_string()))?;
        let present_family = present_family
            .ok_or_else(|| VulkanError::InitializationFailed("No present queue family found".to_string()))?;

        let extensions = unsafe { instance.enumerate_device_extension_properties(device)? };
        let has_swapchain = extensions.iter().any(|available| {
            let name = unsafe { CStr::from_ptr(available.extension_name.as_ptr()) };
            name == SwapchainLoader::name()
        });
        if !has_swapchain {
            return Err(VulkanError::InitializationFailed(
                "Swapchain extension not supported".to_string(),
            ));
        }

        let formats = unsafe { surface_loader.get_physical_device_surface_formats(device, surface)? };
        if formats.is_empty() {
            return Err(VulkanError::InitializationFailed("Surface has no formats".to_string()));
        }

        Ok(Self {
            device,
            properties,
            memory_properties,
            graphics_family,
            present_family,
        })
    }
}

/// Logical device wrapper with RAII cleanup
pub struct LogicalDevice {
    /// Vulkan logical device handle
    pub device: Device,
    /// Graphics operations queue
    pub graphics_queue: vk::Queue,
    /// Surface presentation queue
    pub present_queue: vk::Queue,
    /// Swapchain extension loader
    pub swapchain_loader: SwapchainLoader,
}

impl LogicalDevice {
    /// Create a device with one graphics and one present queue
    pub fn new(instance: &Instance, physical_device_info: &PhysicalDeviceInfo) -> VulkanResult<Self> {
        let mut families = vec![physical_device_info.graphics_family];
        if physical_device_info.present_family != physical_device_info.graphics_family {
            families.push(physical_device_info.present_family);
        }

        let priorities = [1.0];
        let queue_infos: Vec<vk::DeviceQueueCreateInfo> = families
            .iter()
            .map(|&family| {
                vk::DeviceQueueCreateInfo::builder()
                    .queue_family_index(family)
                    .queue_priorities(&priorities)
                    .build()
            })
            .collect();

        let required_extensions = [SwapchainLoader::name().as_ptr()];
        let device_features = vk::PhysicalDeviceFeatures::default();

        let create_info = vk::DeviceCreateInfo::builder()
            .queue_create_infos(&queue_infos)
            .enabled_extension_names(&required_extensions)
            .enabled_features(&device_features);

        let device = unsafe { instance.create_device(physical_device_info.device, &create_info, None)? };
        let graphics_queue = unsafe { device.get_device_queue(physical_device_info.graphics_family, 0) };
        let present_queue = unsafe { device.get_device_queue(physical_device_info.present_family, 0) };
        let swapchain_loader = SwapchainLoader::new(instance, &device);

        Ok(Self {
            device,
            graphics_queue,
            present_queue,
            swapchain_loader,
        })
    }
}

impl Drop for LogicalDevice {
    fn drop(&mut self) {
        unsafe {
            let _ = self.device.device_wait_idle();
            self.device.destroy_device(None);
        }
    }
}

/// Core Vulkan objects for one window
pub struct VulkanContext {
    /// Window surface
    pub surface: vk::SurfaceKHR,
    /// Surface extension loader
    pub surface_loader: Surface,
    /// Selected physical device
    pub physical_device: PhysicalDeviceInfo,
    swapchain: Option<Swapchain>,
    /// Logical device
    pub device: LogicalDevice,
    /// Instance; declared last so it drops after the device
    pub instance: VulkanInstance,
}

impl VulkanContext {
    /// Create instance, surface, device and an initial swapchain for `window`
    pub fn new(window: &mut Window, app_name: &str, enable_validation: bool) -> VulkanResult<Self> {
        let instance = VulkanInstance::new(window, app_name, enable_validation)?;

        let surface_loader = Surface::new(&instance.entry, &instance.instance);
        let surface = window
            .create_vulkan_surface(instance.instance.handle())
            .map_err(|e| VulkanError::InitializationFailed(format!("Surface creation: {e}")))?;

        let physical_device =
            match PhysicalDeviceInfo::select_suitable_device(&instance.instance, surface, &surface_loader) {
                Ok(info) => info,
                Err(err) => {
                    unsafe { surface_loader.destroy_surface(surface, None) };
                    return Err(err);
                }
            };

        let device = match LogicalDevice::new(&instance.instance, &physical_device) {
            Ok(device) => device,
            Err(err) => {
                unsafe { surface_loader.destroy_surface(surface, None) };
                return Err(err);
            }
        };

        let mut context = Self {
            surface,
            surface_loader,
            physical_device,
            swapchain: None,
            device,
            instance,
        };

        let (width, height) = window.framebuffer_size_pixels();
        context.recreate_swapchain(vk::Extent2D { width, height })?;
        Ok(context)
    }

    /// Get a reference to the Vulkan instance
    pub fn instance(&self) -> &Instance {
        &self.instance.instance
    }

    /// Get the raw device
    pub fn raw_device(&self) -> &Device {
        &self.device.device
    }

    /// Current swapchain
    pub fn swapchain(&self) -> VulkanResult<&Swapchain> {
        self.swapchain.as_ref().ok_or_else(|| VulkanError::InvalidOperation {
            reason: "swapchain has not been created".to_string(),
        })
    }

    /// Swapchain extension loader
    pub fn swapchain_loader(&self) -> &SwapchainLoader {
        &self.device.swapchain_loader
    }

    /// Graphics queue
    pub fn graphics_queue(&self) -> vk::Queue {
        self.device.graphics_queue
    }

    /// Present queue
    pub fn present_queue(&self) -> vk::Queue {
        self.device.present_queue
    }

    /// Graphics queue family index
    pub fn graphics_queue_family(&self) -> u32 {
        self.physical_device.graphics_family
    }

    /// Device limits
    pub fn limits(&self) -> &vk::PhysicalDeviceLimits {
        &self.physical_device.properties.limits
    }

    /// Replace the swapchain with one sized for `extent`
    ///
    /// Waits for the device to go idle first; the old swapchain is handed to
    /// the driver for reuse and destroyed once the new one exists.
    pub fn recreate_swapchain(&mut self, extent: vk::Extent2D) -> VulkanResult<()> {
        unsafe { self.device.device.device_wait_idle()? };

        let old_swapchain = self.swapchain.as_ref().map_or(vk::SwapchainKHR::null(), Swapchain::handle);
        let new_swapchain = Swapchain::new(
            self.device.device.clone(),
            &self.device.swapchain_loader,
            self.surface,
            &self.surface_loader,
            &self.physical_device,
            extent,
            old_swapchain,
        )?;

        self.swapchain = Some(new_swapchain);
        Ok(())
    }
}

impl Drop for VulkanContext {
    fn drop(&mut self) {
        unsafe {
            let _ = self.device.device.device_wait_idle();
            // Swapchain must go before the surface it presents to
            self.swapchain = None;
            self.surface_loader.destroy_surface(self.surface, None);
        }
    }
}
