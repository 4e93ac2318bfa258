/// Command recording

pub mod command_context;

pub use command_context::*;
