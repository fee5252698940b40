//! Back-to-front ordering of active billboards

use super::orientation::CameraFrame;
use super::pool::BillboardPool;
use super::types::{BillboardType, SortMode};
use crate::foundation::math::Vec3;

/// Sort mode a set uses: distance when billboards face the camera position or
/// lie perpendicular to a direction, view direction otherwise
pub fn sort_mode(billboard_type: BillboardType, accurate_facing: bool) -> SortMode {
    if accurate_facing || billboard_type.is_perpendicular() {
        SortMode::Distance
    } else {
        SortMode::Direction
    }
}

/// Key that orders farther billboards first when sorted ascending
pub fn sort_key(mode: SortMode, camera: &CameraFrame, position: Vec3) -> f32 {
    match mode {
        SortMode::Direction => (-camera.direction).dot(&position),
        SortMode::Distance => -(camera.position - position).norm_squared(),
    }
}

/// Reorders a pool's active list by [`sort_key`]
///
/// Keeps its scratch buffers between frames so steady-state sorting does not
/// allocate.
#[derive(Debug, Clone, Default)]
pub struct VisibilitySorter {
    keyed: Vec<(f32, usize)>,
    order: Vec<usize>,
}

impl VisibilitySorter {
    /// Empty sorter
    pub fn new() -> Self {
        Self::default()
    }

    /// Sort the active billboards of `pool`, farthest first
    pub fn sort(&mut self, pool: &mut BillboardPool, mode: SortMode, camera: &CameraFrame) {
        self.keyed.clear();
        self.keyed.extend(
            pool.active_indices()
                .map(|index| (sort_key(mode, camera, pool.slot(index).position()), index)),
        );
        self.keyed.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));

        self.order.clear();
        self.order.extend(self.keyed.iter().map(|&(_, index)| index));
        pool.reorder_active(&self.order);
        log::trace!("Sorted {} billboards by {:?}", self.order.len(), mode);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Quat;
    use crate::render::ColourValue;

    fn pool_with(positions: &[Vec3]) -> BillboardPool {
        let mut pool = BillboardPool::new(positions.len());
        for &position in positions {
            pool.acquire(position, ColourValue::WHITE).unwrap();
        }
        pool
    }

    #[test]
    fn test_sort_mode_selection() {
        assert_eq!(sort_mode(BillboardType::Point, false), SortMode::Direction);
        assert_eq!(sort_mode(BillboardType::OrientedSelf, false), SortMode::Direction);
        assert_eq!(sort_mode(BillboardType::Point, true), SortMode::Distance);
        assert_eq!(sort_mode(BillboardType::PerpendicularCommon, false), SortMode::Distance);
        assert_eq!(sort_mode(BillboardType::PerpendicularSelf, false), SortMode::Distance);
    }

    #[test]
    fn test_distance_sort_yields_non_decreasing_keys() {
        let camera = CameraFrame::new(Quat::identity(), Vec3::new(0.0, 0.0, 5.0));
        let mut pool = pool_with(&[
            Vec3::new(0.0, 0.0, 4.0),
            Vec3::new(0.0, 0.0, -30.0),
            Vec3::new(3.0, 0.0, 0.0),
            Vec3::new(0.0, 10.0, 5.0),
            Vec3::new(-1.0, -1.0, -1.0),
        ]);

        VisibilitySorter::new().sort(&mut pool, SortMode::Distance, &camera);

        let keys: Vec<f32> = pool
            .iter()
            .map(|bb| sort_key(SortMode::Distance, &camera, bb.position()))
            .collect();
        assert!(keys.windows(2).all(|pair| pair[0] <= pair[1]), "{keys:?}");
        assert_eq!(pool.iter().next().map(|bb| bb.position().z), Some(-30.0));
    }

    #[test]
    fn test_direction_sort_puts_farthest_along_view_first() {
        // Camera looks down -Z, so more negative z is farther
        let camera = CameraFrame::default();
        let mut pool = pool_with(&[
            Vec3::new(0.0, 0.0, -1.0),
            Vec3::new(50.0, 0.0, -9.0),
            Vec3::new(0.0, 0.0, -5.0),
        ]);

        VisibilitySorter::new().sort(&mut pool, SortMode::Direction, &camera);

        let depths: Vec<f32> = pool.iter().map(|bb| bb.position().z).collect();
        assert_eq!(depths, vec![-9.0, -5.0, -1.0]);
    }
}
