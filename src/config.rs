//! # Engine Configuration
//!
//! Every tunable of a world build, loadable from JSON.
//!
//! All sections and fields are optional in the file; anything missing takes the
//! value from [`EngineConfig::default`], which reproduces the demo world.
//!
//! ```
//! use voxel_world::config::EngineConfig;
//!
//! let config = EngineConfig::from_json_str(r#"{ "terrain": { "seed": 7 } }"#).unwrap();
//! assert_eq!(config.terrain.seed, 7);
//! assert_eq!(config.world.chunk_grid, 16);
//! ```

use std::{fs, path::Path};

use log::info;
use serde::{Deserialize, Serialize};

use crate::{
    engine_state::spatial::OctreeSettings,
    error::{EngineError, Result},
};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub world: WorldConfig,
    pub terrain: TerrainConfig,
    pub octree: OctreeSettings,
    pub rendering: RenderingConfig,
    pub scatter: ScatterConfig,
    pub run: RunConfig,
}

/// Layout of the world and placement of the demo objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub name: String,
    /// Side of the cubic octree bounding area
    pub extent: f32,
    /// Centre of the bounding area and of the chunk grid
    pub center: [f32; 3],
    /// Chunks along each axis of the terrain grid
    pub chunk_grid: u32,
    /// Voxels along each axis of a chunk
    pub chunk_dimension: i32,
    /// World size of a terrain voxel
    pub voxel_size: f32,
    pub player_position: [f32; 3],
    pub player_collider: [f32; 3],
    pub sword_position: [f32; 3],
    /// World size of a sword voxel
    pub sword_voxel_size: f32,
    /// Voxels along each axis of the demo cube
    pub cube_side: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        WorldConfig {
            name: "World".to_string(),
            extent: 256.0,
            center: [0.0, 0.0, 0.0],
            chunk_grid: 16,
            chunk_dimension: 16,
            voxel_size: 1.0,
            player_position: [4.0, 50.0, 4.0],
            player_collider: [0.5, 1.5, 0.5],
            sword_position: [0.0, 30.0, 0.0],
            sword_voxel_size: 0.1,
            cube_side: 2,
        }
    }
}

/// Parameters of the terrain generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    pub seed: u32,
    /// Feature wavelength in world units
    pub smoothness: f64,
    /// Fractal octaves, clamped to 1..=32
    pub details: u32,
    /// Horizontal scale factor
    pub spread: f64,
    /// World Y of the mean surface
    pub base_height: f64,
    /// Vertical relief in world units
    pub amplitude: f64,
    /// Strength of the overhang density term
    pub overhang: f64,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        TerrainConfig {
            seed: 58230947,
            smoothness: 256.0,
            details: 1,
            spread: 32.0,
            base_height: 0.0,
            amplitude: 32.0,
            overhang: 0.25,
        }
    }
}

impl TerrainConfig {
    /// Checks every parameter is in range.
    ///
    /// # Errors
    /// `Config` naming the first offending parameter.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("smoothness", self.smoothness),
            ("spread", self.spread),
            ("amplitude", self.amplitude),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(EngineError::Config(format!(
                    "terrain {} must be finite and positive, got {}",
                    name, value
                )));
            }
        }
        if !self.base_height.is_finite() {
            return Err(EngineError::Config(format!(
                "terrain base_height must be finite, got {}",
                self.base_height
            )));
        }
        if !self.overhang.is_finite() || self.overhang < 0.0 {
            return Err(EngineError::Config(format!(
                "terrain overhang must be finite and non-negative, got {}",
                self.overhang
            )));
        }
        Ok(())
    }
}

/// Texture atlas and debug drawing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderingConfig {
    /// Tiles along each side of the atlas
    pub texs_per_row: u32,
    /// Texture id of the atlas in the graphics front end
    pub atlas_texture: u32,
    /// Draw octree node boxes every frame
    pub debug_draw: bool,
}

impl Default for RenderingConfig {
    fn default() -> Self {
        RenderingConfig {
            texs_per_row: 16,
            atlas_texture: 0,
            debug_draw: false,
        }
    }
}

/// Copies of the sword scattered at seeded random positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScatterConfig {
    pub count: usize,
    pub seed: u64,
}

impl Default for ScatterConfig {
    fn default() -> Self {
        ScatterConfig {
            count: 0,
            seed: 1299,
        }
    }
}

/// Headless run settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub frames: u32,
    /// Seconds per frame
    pub dt: f32,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            frames: 120,
            dt: 1.0 / 60.0,
        }
    }
}

impl EngineConfig {
    /// Parses a configuration from JSON.
    ///
    /// # Errors
    /// `ConfigParse` for malformed JSON, `Config` for out-of-range values.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a JSON configuration file.
    ///
    /// # Errors
    /// `ConfigIo` if the file cannot be read, otherwise as [`EngineConfig::from_json_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| EngineError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&json)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Checks every section is in range.
    ///
    /// # Errors
    /// `Config` naming the first offending value.
    pub fn validate(&self) -> Result<()> {
        let world = &self.world;
        if !world.extent.is_finite() || world.extent <= 0.0 {
            return Err(EngineError::Config(format!(
                "world extent must be finite and positive, got {}",
                world.extent
            )));
        }
        if world.center.iter().any(|v| !v.is_finite()) {
            return Err(EngineError::Config("world center must be finite".to_string()));
        }
        if world.chunk_dimension <= 0 {
            return Err(EngineError::Config(format!(
                "chunk dimension must be positive, got {}",
                world.chunk_dimension
            )));
        }
        for (name, size) in [
            ("voxel_size", world.voxel_size),
            ("sword_voxel_size", world.sword_voxel_size),
        ] {
            if !size.is_finite() || size <= 0.0 {
                return Err(EngineError::Config(format!(
                    "world {} must be finite and positive, got {}",
                    name, size
                )));
            }
        }
        if world.cube_side == 0 || i32::try_from(world.cube_side).is_err() {
            return Err(EngineError::Config(format!(
                "cube side must be between 1 and {}, got {}",
                i32::MAX,
                world.cube_side
            )));
        }
        self.terrain.validate()?;
        if self.octree.max_depth > 16 {
            return Err(EngineError::Config(format!(
                "octree max_depth must be at most 16, got {}",
                self.octree.max_depth
            )));
        }
        if !self.run.dt.is_finite() || self.run.dt < 0.0 {
            return Err(EngineError::Config(format!(
                "frame dt must be finite and non-negative, got {}",
                self.run.dt
            )));
        }
        Ok(())
    }
}
