/// Shader program resource

use std::path::{Path, PathBuf};
use std::sync::Arc;
use crate::error::{Error, Result};
use crate::graphics_device::NativeShader;

/// Vertex shader file extension
pub const VERTEX_SHADER_EXTENSION: &str = "vspv";
/// Fragment shader file extension
pub const FRAGMENT_SHADER_EXTENSION: &str = "fspv";

/// SPIR-V of a program, read from disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderBinaries {
    pub vertex: Vec<u8>,
    pub fragment: Vec<u8>,
}

impl ShaderBinaries {
    /// Read `<dir>/<name>.vspv` and `<dir>/<name>.fspv`
    pub fn from_files(dir: &Path, name: &str) -> Result<Self> {
        Ok(Self {
            vertex: read_binary(&shader_path(dir, name, VERTEX_SHADER_EXTENSION))?,
            fragment: read_binary(&shader_path(dir, name, FRAGMENT_SHADER_EXTENSION))?,
        })
    }
}

fn shader_path(dir: &Path, name: &str, extension: &str) -> PathBuf {
    dir.join(format!("{}.{}", name, extension))
}

fn read_binary(path: &Path) -> Result<Vec<u8>> {
    let bytes = std::fs::read(path).map_err(|e| {
        Error::InvalidResource(format!("cannot read shader '{}': {}", path.display(), e))
    })?;
    if bytes.is_empty() || bytes.len() % 4 != 0 {
        return Err(Error::InvalidResource(format!(
            "shader '{}' is not SPIR-V ({} bytes)",
            path.display(),
            bytes.len()
        )));
    }
    Ok(bytes)
}

/// A linked vertex + fragment program
///
/// Its [`crate::resource::ShaderKey`] is part of pipeline identity.
pub struct ShaderProgram {
    name: String,
    native: Arc<dyn NativeShader>,
}

impl ShaderProgram {
    pub(crate) fn new(name: String, native: Arc<dyn NativeShader>) -> Self {
        Self { name, native }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn native(&self) -> &Arc<dyn NativeShader> {
        &self.native
    }
}

#[cfg(test)]
#[path = "shader_tests.rs"]
mod tests;
