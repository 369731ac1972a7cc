//! # Terrain Generation
//!
//! Deterministic, noise-driven terrain for chunks.
//!
//! ## Height and Density
//!
//! Two fractal Perlin fields are sampled at the world position of each cell's
//! minimum corner, with coordinates scaled by `spread / smoothness`:
//!
//! - a 2D height field gives the surface height of each column:
//!   `h(x, z) = base_height + amplitude * fbm2(x, z)`
//! - a 3D density field perturbs it to carve overhangs:
//!   `d = (h - y) / amplitude + overhang * fbm3(x, y, z)`
//!
//! A cell is solid when `d > 0`.
//!
//! ## Materials
//!
//! Materials follow the number of consecutive solid cells directly above a cell:
//! none makes grass, one to three make dirt, and anything deeper is stone. The
//! count looks a few cells past the top of the chunk by sampling the same field,
//! so the result never depends on neighbouring chunks or on generation order.

use cgmath::Point3;
use log::debug;
use noise::{Fbm, MultiFractal, NoiseFn, Perlin};
use web_time::Instant;

use super::{chunk::Chunk, voxel::VoxelType};
use crate::{
    config::TerrainConfig,
    error::{EngineError, Result},
};

/// Cells sampled above the chunk top to classify its upper layers.
const LAYER_LOOKAHEAD: usize = 4;
/// Solid cells above a cell beyond which it turns to stone.
const DIRT_DEPTH: usize = 3;
/// Upper bound on fractal octaves.
pub const MAX_DETAILS: u32 = 32;

/// Deterministic procedural terrain generator.
#[derive(Clone)]
pub struct TerrainGenerator {
    seed: u32,
    smoothness: f64,
    details: u32,
    spread: f64,
    base_height: f64,
    amplitude: f64,
    overhang: f64,
    height_noise: Fbm<Perlin>,
    density_noise: Fbm<Perlin>,
}

impl TerrainGenerator {
    /// Creates a generator with the default relief (`base_height` 0, `amplitude`
    /// 32, `overhang` 0.25).
    ///
    /// # Arguments
    /// * `seed` - Noise seed
    /// * `smoothness` - Feature wavelength in world units
    /// * `details` - Number of fractal octaves, clamped to `1..=32`
    /// * `spread` - Horizontal scale factor
    ///
    /// # Errors
    /// `Config` if `smoothness` or `spread` is not finite and positive.
    pub fn new(seed: u32, smoothness: f64, details: u32, spread: f64) -> Result<Self> {
        Self::from_config(&TerrainConfig {
            seed,
            smoothness,
            details,
            spread,
            ..TerrainConfig::default()
        })
    }

    /// Creates a generator from a full parameter set.
    ///
    /// # Errors
    /// `Config` if any parameter is out of range; see [`TerrainConfig::validate`].
    pub fn from_config(config: &TerrainConfig) -> Result<Self> {
        config.validate()?;
        let details = config.details.clamp(1, MAX_DETAILS);
        Ok(TerrainGenerator {
            seed: config.seed,
            smoothness: config.smoothness,
            details,
            spread: config.spread,
            base_height: config.base_height,
            amplitude: config.amplitude,
            overhang: config.overhang,
            height_noise: Self::build_noise(config.seed, details),
            density_noise: Self::build_noise(config.seed.wrapping_add(1), details),
        })
    }

    fn build_noise(seed: u32, details: u32) -> Fbm<Perlin> {
        Fbm::<Perlin>::new(seed).set_octaves(details as usize)
    }

    fn rebuild_noise(&mut self) {
        self.height_noise = Self::build_noise(self.seed, self.details);
        self.density_noise = Self::build_noise(self.seed.wrapping_add(1), self.details);
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn set_seed(&mut self, seed: u32) {
        self.seed = seed;
        self.rebuild_noise();
    }

    pub fn smoothness(&self) -> f64 {
        self.smoothness
    }

    /// Sets the feature wavelength.
    ///
    /// # Errors
    /// `Config` unless `smoothness` is finite and positive.
    pub fn set_smoothness(&mut self, smoothness: f64) -> Result<()> {
        self.smoothness = positive("smoothness", smoothness)?;
        Ok(())
    }

    pub fn details(&self) -> u32 {
        self.details
    }

    /// Sets the number of fractal octaves, clamped to `1..=32`.
    pub fn set_details(&mut self, details: u32) {
        self.details = details.clamp(1, MAX_DETAILS);
        self.rebuild_noise();
    }

    pub fn spread(&self) -> f64 {
        self.spread
    }

    /// Sets the horizontal scale factor.
    ///
    /// # Errors
    /// `Config` unless `spread` is finite and positive.
    pub fn set_spread(&mut self, spread: f64) -> Result<()> {
        self.spread = positive("spread", spread)?;
        Ok(())
    }

    pub fn base_height(&self) -> f64 {
        self.base_height
    }

    /// Sets the world Y of the mean surface.
    ///
    /// # Errors
    /// `Config` if `base_height` is not finite.
    pub fn set_base_height(&mut self, base_height: f64) -> Result<()> {
        if !base_height.is_finite() {
            return Err(EngineError::Config(format!(
                "terrain base_height must be finite, got {}",
                base_height
            )));
        }
        self.base_height = base_height;
        Ok(())
    }

    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }

    /// Sets the vertical relief.
    ///
    /// # Errors
    /// `Config` unless `amplitude` is finite and positive.
    pub fn set_amplitude(&mut self, amplitude: f64) -> Result<()> {
        self.amplitude = positive("amplitude", amplitude)?;
        Ok(())
    }

    pub fn overhang(&self) -> f64 {
        self.overhang
    }

    /// Sets the strength of the 3D density term. Zero gives a pure heightmap.
    ///
    /// # Errors
    /// `Config` if `overhang` is negative or not finite.
    pub fn set_overhang(&mut self, overhang: f64) -> Result<()> {
        if !overhang.is_finite() || overhang < 0.0 {
            return Err(EngineError::Config(format!(
                "terrain overhang must be finite and non-negative, got {}",
                overhang
            )));
        }
        self.overhang = overhang;
        Ok(())
    }

    fn frequency(&self) -> f64 {
        self.spread / self.smoothness
    }

    /// World Y of the surface above `(x, z)`, before overhangs are carved.
    pub fn surface_height(&self, x: f64, z: f64) -> f64 {
        let f = self.frequency();
        self.base_height + self.amplitude * self.height_noise.get([x * f, z * f])
    }

    /// Returns `true` if the cell whose minimum corner is at `position` is solid.
    pub fn is_solid_at(&self, position: Point3<f64>) -> bool {
        let surface = self.surface_height(position.x, position.z);
        self.density(position, surface) > 0.0
    }

    fn density(&self, position: Point3<f64>, surface: f64) -> f64 {
        let f = self.frequency();
        (surface - position.y) / self.amplitude
            + self.overhang
                * self
                    .density_noise
                    .get([position.x * f, position.y * f, position.z * f])
    }

    /// Fills a chunk's voxels with terrain.
    ///
    /// # Arguments
    /// * `chunk` - The chunk to fill; its position, dimension and voxel size
    ///   determine which part of the world is sampled
    ///
    /// # Returns
    /// `Ok(true)` if at least one cell is solid
    ///
    /// # Errors
    /// - `VoxelArrayLocked` if the chunk was already meshed
    /// - `EmptyVoxelArray` if the chunk has no dimension
    /// - `AllocationFailure` if the voxel buffer cannot be allocated
    pub fn get_chunk(&self, chunk: &mut Chunk) -> Result<bool> {
        let start = Instant::now();
        let origin = chunk.origin().cast::<f64>().unwrap_or(Point3::new(0.0, 0.0, 0.0));
        let voxels = chunk.voxels_mut().ok_or(EngineError::VoxelArrayLocked)?;
        let dimension = voxels.dimension().ok_or(EngineError::EmptyVoxelArray)?;
        let voxel_size = voxels.voxel_size() as f64;
        let volume = dimension.x * dimension.y * dimension.z;

        let mut values = Vec::new();
        values
            .try_reserve_exact(volume)
            .map_err(|_| EngineError::AllocationFailure {
                what: "terrain voxels",
                requested: volume,
            })?;
        values.resize(volume, VoxelType::AIR as u8);

        let mut any_solid = false;
        for z in 0..dimension.z {
            for x in 0..dimension.x {
                let world_x = origin.x + x as f64 * voxel_size;
                let world_z = origin.z + z as f64 * voxel_size;
                let surface = self.surface_height(world_x, world_z);

                // solid cells directly above the current one
                let mut run = 0;
                for y in (0..dimension.y + LAYER_LOOKAHEAD).rev() {
                    let world_y = origin.y + y as f64 * voxel_size;
                    let solid = self.density(Point3::new(world_x, world_y, world_z), surface) > 0.0;
                    if !solid {
                        run = 0;
                        continue;
                    }

                    if y < dimension.y {
                        let material = match run {
                            0 => VoxelType::GRASS,
                            1..=DIRT_DEPTH => VoxelType::DIRT,
                            _ => VoxelType::STONE,
                        };
                        values[x + dimension.x * (y + dimension.y * z)] = material as u8;
                        any_solid = true;
                    }
                    run += 1;
                }
            }
        }

        voxels.set_voxels(&values)?;
        debug!(
            "Generated chunk at ({}, {}, {}) in {:?} ({})",
            origin.x,
            origin.y,
            origin.z,
            start.elapsed(),
            if any_solid { "solid" } else { "empty" }
        );
        Ok(any_solid)
    }
}

fn positive(name: &str, value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(EngineError::Config(format!(
            "terrain {} must be finite and positive, got {}",
            name, value
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator() -> TerrainGenerator {
        TerrainGenerator::from_config(&TerrainConfig::default()).unwrap()
    }

    fn generate(generator: &TerrainGenerator, position: Point3<f32>) -> Chunk {
        let mut chunk = Chunk::new(position).unwrap();
        generator.get_chunk(&mut chunk).unwrap();
        chunk
    }

    #[test]
    fn output_does_not_depend_on_generation_order() {
        let a = Point3::new(-16.0, -16.0, 0.0);
        let b = Point3::new(32.0, 0.0, -48.0);

        let first = generator();
        let a_then_b = (generate(&first, a), generate(&first, b));
        let second = generator();
        let b_first = generate(&second, b);
        let a_second = generate(&second, a);

        assert_eq!(a_then_b.0.voxels().voxels(), a_second.voxels().voxels());
        assert_eq!(a_then_b.1.voxels().voxels(), b_first.voxels().voxels());
    }

    #[test]
    fn chunks_far_above_the_surface_are_empty() {
        let generator = generator();
        let mut chunk = Chunk::new(Point3::new(0.0, 4.0 * 32.0, 0.0)).unwrap();
        assert!(!generator.get_chunk(&mut chunk).unwrap());
        assert_eq!(chunk.voxels().solid_count(), 0);
    }

    #[test]
    fn chunks_far_below_the_surface_are_solid_stone() {
        let generator = generator();
        let mut chunk = Chunk::new(Point3::new(0.0, -6.0 * 32.0, 0.0)).unwrap();
        assert!(generator.get_chunk(&mut chunk).unwrap());
        assert!(chunk
            .voxels()
            .voxels()
            .iter()
            .all(|value| *value == VoxelType::STONE as u8));
    }

    #[test]
    fn surface_cells_are_layered() {
        let mut generator = generator();
        generator.set_overhang(0.0).unwrap();
        let mut chunk = Chunk::with_dimension(Point3::new(3.0, -64.0, 5.0), 8, 1.0).unwrap();
        // tall enough to hold the surface anywhere within the relief
        chunk
            .voxels_mut()
            .unwrap()
            .set_dimension(8, 128, 8)
            .unwrap();
        assert!(generator.get_chunk(&mut chunk).unwrap());

        let voxels = chunk.voxels();
        for z in 0..8 {
            for x in 0..8 {
                let top = (0..128)
                    .rev()
                    .find(|y| voxels.is_solid(x, *y, z))
                    .expect("column reaches the surface");
                assert_eq!(voxels.voxel(x, top, z).unwrap(), VoxelType::GRASS as u8);
                if top >= 4 {
                    assert_eq!(voxels.voxel(x, top - 1, z).unwrap(), VoxelType::DIRT as u8);
                    assert_eq!(voxels.voxel(x, top - 4, z).unwrap(), VoxelType::STONE as u8);
                }
            }
        }
    }

    #[test]
    fn details_are_clamped() {
        let mut generator = generator();
        generator.set_details(0);
        assert_eq!(generator.details(), 1);
        generator.set_details(100);
        assert_eq!(generator.details(), MAX_DETAILS);
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        assert!(matches!(
            TerrainGenerator::new(1, 0.0, 1, 32.0),
            Err(EngineError::Config(_))
        ));
        let mut generator = generator();
        assert!(generator.set_spread(f64::NAN).is_err());
        assert!(generator.set_overhang(-1.0).is_err());
        assert_eq!(generator.spread(), 32.0);
    }
}
