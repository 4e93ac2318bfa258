/// Graphics device module - backend traits and native object interfaces

pub mod graphics_device;
pub mod command_list;
pub mod native;

pub use graphics_device::*;
pub use command_list::*;
pub use native::*;

// Mock graphics device for tests (no GPU required)
#[cfg(test)]
pub mod mock_graphics_device;

#[cfg(test)]
#[path = "mock_graphics_device_tests.rs"]
mod mock_graphics_device_tests;
