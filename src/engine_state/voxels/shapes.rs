//! Hand-authored voxel shapes placed in the demo world.

use cgmath::Vector3;

use super::voxel::VoxelType;
use crate::error::{EngineError, Result};

/// Dimension of the voxel sword: five wide, sixteen tall, one deep.
pub const SWORD_DIMENSION: Vector3<i32> = Vector3::new(5, 16, 1);

/// Builds the voxel sword in x-fastest order.
///
/// From the bottom up: a three-voxel wooden hilt with a metal pommel, a
/// five-wide metal guard, and an eleven-voxel blade tapering to a point.
pub fn sword_voxels() -> Vec<u8> {
    let (width, height) = (SWORD_DIMENSION.x as usize, SWORD_DIMENSION.y as usize);
    let centre = width / 2;
    let mut voxels = vec![VoxelType::AIR as u8; width * height];

    for y in 0..height {
        let row = &mut voxels[y * width..(y + 1) * width];
        match y {
            0 => row[centre] = VoxelType::METAL as u8,
            1..=3 => row[centre] = VoxelType::WOOD as u8,
            4 => row.fill(VoxelType::METAL as u8),
            15 => row[centre] = VoxelType::METAL as u8,
            _ => row[centre - 1..=centre + 1].fill(VoxelType::METAL as u8),
        }
    }

    voxels
}

/// Builds a solid stone cube of `side`³ voxels.
///
/// # Errors
/// `AllocationFailure` if the volume overflows or cannot be reserved.
pub fn cube_voxels(side: usize) -> Result<Vec<u8>> {
    let volume = side
        .checked_mul(side)
        .and_then(|area| area.checked_mul(side))
        .ok_or(EngineError::AllocationFailure {
            what: "cube voxels",
            requested: usize::MAX,
        })?;

    let mut voxels = Vec::new();
    voxels
        .try_reserve_exact(volume)
        .map_err(|_| EngineError::AllocationFailure {
            what: "cube voxels",
            requested: volume,
        })?;
    voxels.resize(volume, VoxelType::STONE as u8);
    Ok(voxels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sword_fills_its_dimension() {
        let voxels = sword_voxels();
        assert_eq!(voxels.len(), 5 * 16);
        // guard spans the full width
        assert!(voxels[4 * 5..5 * 5].iter().all(|v| *v == VoxelType::METAL as u8));
        // blade tip is a single voxel
        assert_eq!(voxels[15 * 5..].iter().filter(|v| **v != 0).count(), 1);
    }

    #[test]
    fn cube_is_solid_stone() {
        let voxels = cube_voxels(3).unwrap();
        assert_eq!(voxels.len(), 27);
        assert!(voxels.iter().all(|v| *v == VoxelType::STONE as u8));
    }

    #[test]
    fn oversized_cube_is_refused_instead_of_aborting() {
        // 10^15 bytes lies beyond any user address space
        assert!(matches!(
            cube_voxels(100_000),
            Err(EngineError::AllocationFailure { .. })
        ));
        assert!(matches!(
            cube_voxels(usize::MAX),
            Err(EngineError::AllocationFailure {
                requested: usize::MAX,
                ..
            })
        ));
    }
}
