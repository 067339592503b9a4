use serde::*;

/// Compact map coordinate. Packed into a `u32` for serialization and for
/// cheap use as a hash key in the per-plot indexes.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct PlotCoords {
    x: i16,
    y: i16,
}

impl PlotCoords {
    pub fn new(x: i16, y: i16) -> Self {
        PlotCoords { x, y }
    }

    #[inline]
    pub fn x(self) -> i16 {
        self.x
    }

    #[inline]
    pub fn y(self) -> i16 {
        self.y
    }

    #[inline]
    pub fn packed_repr(self) -> u32 {
        ((self.x as u16 as u32) << 16) | (self.y as u16 as u32)
    }

    #[inline]
    pub fn from_packed(packed: u32) -> Self {
        PlotCoords {
            x: ((packed >> 16) & 0xFFFF) as u16 as i16,
            y: (packed & 0xFFFF) as u16 as i16,
        }
    }

    /// Chebyshev distance: the number of single-plot steps between two
    /// coordinates when diagonal moves cost one step.
    pub fn step_distance(self, other: Self) -> u32 {
        let dx = (self.x as i32 - other.x as i32).abs();
        let dy = (self.y as i32 - other.y as i32).abs();
        dx.max(dy) as u32
    }

    pub fn offset(self, dx: i16, dy: i16) -> Self {
        PlotCoords {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// The eight adjacent coordinates (no bounds checking -- callers filter
    /// against the host map).
    pub fn neighbours(self) -> impl Iterator<Item = PlotCoords> {
        NEIGHBOURS_8.iter().map(move |&(dx, dy)| self.offset(dx, dy))
    }
}

impl Serialize for PlotCoords {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.packed_repr().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PlotCoords {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        u32::deserialize(deserializer).map(PlotCoords::from_packed)
    }
}

/// Neighbour offsets for the eight surrounding plots.
pub const NEIGHBOURS_8: [(i16, i16); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
];

/// Offsets of the standard workable city area: the two-ring "fat cross" of
/// 20 plots around a city centre (radius 2 minus the four corners).
pub const FAT_CROSS: [(i16, i16); 20] = [
    // ring 1
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    // ring 2 (corners excluded)
    (-2, -1),
    (-2, 0),
    (-2, 1),
    (-1, 2),
    (0, 2),
    (1, 2),
    (2, 1),
    (2, 0),
    (2, -1),
    (1, -2),
    (0, -2),
    (-1, -2),
];

/// Which ring of the fat cross an offset from the city centre falls in.
/// Returns `None` for the centre itself and for plots outside the cross.
pub fn fat_cross_ring(centre: PlotCoords, coords: PlotCoords) -> Option<u8> {
    let dx = (coords.x() as i32 - centre.x() as i32).abs();
    let dy = (coords.y() as i32 - centre.y() as i32).abs();
    match dx.max(dy) {
        0 => None,
        1 => Some(1),
        2 if dx != 2 || dy != 2 => Some(2),
        _ => None,
    }
}

/// Iterate the workable plots of a city at the given culture level.
/// Level 1 cities work only the inner ring; the full cross unlocks at
/// level 2 and above.
pub fn workable_plots(centre: PlotCoords, culture_level: u8) -> impl Iterator<Item = PlotCoords> {
    let limit = if culture_level <= 1 { 8 } else { FAT_CROSS.len() };
    FAT_CROSS[..limit]
        .iter()
        .map(move |&(dx, dy)| centre.offset(dx, dy))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_round_trip() {
        for coords in [
            PlotCoords::new(0, 0),
            PlotCoords::new(17, 93),
            PlotCoords::new(-1, 5),
        ] {
            assert_eq!(PlotCoords::from_packed(coords.packed_repr()), coords);
        }
    }

    #[test]
    fn fat_cross_excludes_corners() {
        let centre = PlotCoords::new(10, 10);
        assert_eq!(fat_cross_ring(centre, PlotCoords::new(12, 12)), None);
        assert_eq!(fat_cross_ring(centre, PlotCoords::new(11, 11)), Some(1));
        assert_eq!(fat_cross_ring(centre, PlotCoords::new(12, 11)), Some(2));
        assert_eq!(fat_cross_ring(centre, centre), None);
    }

    #[test]
    fn low_culture_limits_workable_ring() {
        let centre = PlotCoords::new(5, 5);
        assert_eq!(workable_plots(centre, 1).count(), 8);
        assert_eq!(workable_plots(centre, 2).count(), 20);
    }
}
