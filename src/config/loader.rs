// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::{JSON_EXTENSIONS, TOML_EXTENSIONS, YAML_EXTENSIONS};
use crate::element::{DataKind, DataType, Element};
use crate::errors::{Error, Result};
use crate::types::{Type, TypeBuilder};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Declarative description of an execution graph.
///
/// Kernels are given graph-local ids and refer to registered kernels by
/// qualified name (`<module>.<kernel>`). Connections name their producer by
/// id and their consumer either by kernel id (`to`) or by qualified field
/// name (`field`), never both.
///
/// # Example
/// ```yaml
/// name: blur-pipeline
/// kernels:
///   - id: horizontal
///     kernel: blur.horizontal
///   - id: vertical
///     kernel: blur.vertical
/// connections:
///   - from: horizontal
///     to: vertical
///     type: { element: f32, x: 64, y: 64 }
/// outputs:
///   - kernel: vertical
///     type: { element: f32, x: 64, y: 64 }
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct GraphConfig {
    #[serde(default)]
    pub name: Option<String>,
    pub kernels: Vec<KernelConfig>,
    #[serde(default)]
    pub connections: Vec<ConnectionConfig>,
    /// Host buffers to create and bind as kernel outputs before a run.
    #[serde(default)]
    pub outputs: Vec<OutputConfig>,
}

/// One kernel instance in a graph description.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct KernelConfig {
    pub id: String,
    pub kernel: String,
}

/// One edge in a graph description.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ConnectionConfig {
    pub from: String,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub field: Option<String>,
    #[serde(rename = "type")]
    pub ty: TypeSpec,
}

impl ConnectionConfig {
    /// Short label used in error messages, e.g. `a -> b` or `a -> m.weights`.
    pub fn label(&self) -> String {
        let target = self
            .to
            .as_deref()
            .or(self.field.as_deref())
            .unwrap_or("?");
        format!("{} -> {}", self.from, target)
    }
}

/// A host-side output buffer bound to one kernel.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OutputConfig {
    pub kernel: String,
    #[serde(rename = "type")]
    pub ty: TypeSpec,
}

/// Shape of the buffer carried by a connection.
///
/// `element` is a scalar name (`f16`, `f32`, `f64`, `i8` .. `i64`, `u8` ..
/// `u64`, `bool`) widened by `vector_size`, or a pixel name (`a_8`, `l_8`,
/// `la_88`, `rgb_888`, `rgba_8888`, `rgb_565`, `rgba_5551`, `rgba_4444`).
/// A `y` or `z` of zero means the dimension is absent.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TypeSpec {
    pub element: String,
    #[serde(default = "default_vector_size")]
    pub vector_size: u8,
    pub x: u32,
    #[serde(default)]
    pub y: u32,
    #[serde(default)]
    pub z: u32,
    #[serde(default)]
    pub mipmaps: bool,
    #[serde(default)]
    pub faces: bool,
}

fn default_vector_size() -> u8 {
    1
}

impl TypeSpec {
    pub fn to_element(&self) -> Result<Element> {
        if let Some(data_type) = scalar_data_type(&self.element) {
            return match self.vector_size {
                1 => Ok(Element::scalar(data_type)),
                n => Element::vector(data_type, n),
            };
        }
        let (data_type, data_kind) = pixel_element(&self.element)
            .ok_or_else(|| Error::illegal(format!("unknown element '{}'", self.element)))?;
        if self.vector_size != 1 {
            return Err(Error::illegal(format!(
                "pixel element '{}' cannot take a vector size",
                self.element
            )));
        }
        Element::pixel(data_type, data_kind)
    }

    pub fn to_type(&self) -> Result<Type> {
        let element = self.to_element()?;
        TypeBuilder::new(&element)
            .set_x(self.x)
            .set_y(self.y)
            .set_z(self.z)
            .set_mipmaps(self.mipmaps)
            .set_faces(self.faces)
            .create()
    }
}

fn scalar_data_type(name: &str) -> Option<DataType> {
    let data_type = match name {
        "f16" => DataType::Float16,
        "f32" => DataType::Float32,
        "f64" => DataType::Float64,
        "i8" => DataType::Signed8,
        "i16" => DataType::Signed16,
        "i32" => DataType::Signed32,
        "i64" => DataType::Signed64,
        "u8" => DataType::Unsigned8,
        "u16" => DataType::Unsigned16,
        "u32" => DataType::Unsigned32,
        "u64" => DataType::Unsigned64,
        "bool" => DataType::Boolean,
        _ => return None,
    };
    Some(data_type)
}

fn pixel_element(name: &str) -> Option<(DataType, DataKind)> {
    let pair = match name {
        "a_8" => (DataType::Unsigned8, DataKind::PixelA),
        "l_8" => (DataType::Unsigned8, DataKind::PixelL),
        "la_88" => (DataType::Unsigned8, DataKind::PixelLA),
        "rgb_888" => (DataType::Unsigned8, DataKind::PixelRgb),
        "rgba_8888" => (DataType::Unsigned8, DataKind::PixelRgba),
        "rgb_565" => (DataType::Unsigned565, DataKind::PixelRgb),
        "rgba_5551" => (DataType::Unsigned5551, DataKind::PixelRgba),
        "rgba_4444" => (DataType::Unsigned4444, DataKind::PixelRgba),
        _ => return None,
    };
    Some(pair)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Format {
    Yaml,
    Json,
    Toml,
}

impl Format {
    fn from_path(path: &Path) -> Result<Format> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        let extension = extension.as_str();
        if YAML_EXTENSIONS.contains(&extension) {
            Ok(Format::Yaml)
        } else if JSON_EXTENSIONS.contains(&extension) {
            Ok(Format::Json)
        } else if TOML_EXTENSIONS.contains(&extension) {
            Ok(Format::Toml)
        } else {
            Err(Error::Config(format!(
                "unsupported graph description format '{}' for {}",
                extension,
                path.display()
            )))
        }
    }
}

/// Load a graph description, picking the parser from the file extension.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<GraphConfig> {
    let path = path.as_ref();
    let format = Format::from_path(path)?;
    let content = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;

    match format {
        Format::Yaml => serde_yaml::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Json => serde_json::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Toml => toml::from_str(&content).map_err(|e| parse_error(path, e)),
    }
}

fn parse_error(path: &Path, e: impl std::fmt::Display) -> Error {
    Error::Config(format!("cannot parse {}: {}", path.display(), e))
}

/// Load a graph description and check it against `registry`.
///
/// All problems found are reported together in one `Config` error.
pub fn load_and_validate_config<P: AsRef<Path>>(
    path: P,
    registry: &crate::kernel::KernelRegistry,
) -> Result<GraphConfig> {
    let cfg = load_config(path)?;

    if let Err(validation_errors) = crate::config::validate_graph_config(&cfg, registry) {
        let error_messages: Vec<String> = validation_errors.iter().map(|e| e.to_string()).collect();
        return Err(Error::Config(format!(
            "Graph description validation failed:\n{}",
            error_messages.join("\n")
        )));
    }

    Ok(cfg)
}
