/// Renderer configuration
///
/// Shared by the backends (device bootstrap) and the core (staging arena,
/// offscreen target size used by applications).
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Application name reported to the driver
    pub app_name: String,

    /// Enable the backend's validation layer and debug messenger
    pub enable_validation: bool,

    /// Number of presentable images requested from the swapchain
    pub swapchain_image_count: u32,

    /// Size in bytes of the staging upload arena
    pub staging_buffer_size: u64,

    /// Binding sets per descriptor type in the backend pool
    pub descriptor_pool_size: u32,

    /// Offscreen render target resolution
    pub render_target_width: u32,
    pub render_target_height: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "immediate_gfx".to_string(),
            enable_validation: false,
            swapchain_image_count: 2,
            staging_buffer_size: 128 * 1024 * 1024,
            descriptor_pool_size: 64 * 1024,
            render_target_width: 1920,
            render_target_height: 1080,
        }
    }
}
