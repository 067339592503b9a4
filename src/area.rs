//! Map partitioning: areas, sub-areas and irrigatable areas.
//!
//! An area is a maximal contiguous region sharing water classification; a
//! sub-area additionally shares passability; an irrigatable area is a
//! contiguous land region over which irrigation can propagate. IDs come from
//! an explicit [`IdAllocator`] owned by the registry and reset on map
//! regeneration -- there is no process-wide counter.

use crate::coords::PlotCoords;
use crate::host::GameView;
use fnv::{FnvHashMap, FnvHashSet};
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
pub struct AreaId(pub i32);

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
pub struct SubAreaId(pub i32);

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
pub struct IrrigatableAreaId(pub i32);

/// Monotonic ID source, reset with the registry on new maps.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct IdAllocator {
    next: i32,
}

impl IdAllocator {
    pub fn next_id(&mut self) -> i32 {
        let id = self.next;
        self.next += 1;
        id
    }
}

/// A contiguous region sharing water classification and passability.
///
/// Field order is load-bearing for the save stream:
/// `(is_water, is_impassable, id, area_id, num_plots)`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubArea {
    pub is_water: bool,
    pub is_impassable: bool,
    pub id: SubAreaId,
    pub area_id: AreaId,
    pub num_plots: u32,
}

/// A contiguous irrigation-propagation region.
///
/// Save-stream field order mirrors [`SubArea`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IrrigatableArea {
    pub has_fresh_water_source: bool,
    pub is_hilly: bool,
    pub id: IrrigatableAreaId,
    pub sub_area_id: SubAreaId,
    pub num_plots: u32,
}

/// Full-map partition registry plus the sub-area adjacency graph.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SubAreaRegistry {
    allocator: IdAllocator,
    sub_areas: FnvHashMap<SubAreaId, SubArea>,
    irrigatable_areas: FnvHashMap<IrrigatableAreaId, IrrigatableArea>,
    plot_sub_area: FnvHashMap<PlotCoords, SubAreaId>,
    plot_irrigatable: FnvHashMap<PlotCoords, IrrigatableAreaId>,
    /// Sub-areas sharing at least one adjacent plot pair.
    borders: FnvHashMap<SubAreaId, FnvHashSet<SubAreaId>>,
}

impl SubAreaRegistry {
    /// One-shot full-map partition. Re-run (with a fresh registry) on map
    /// regeneration.
    pub fn build(view: &dyn GameView) -> SubAreaRegistry {
        let mut registry = SubAreaRegistry::default();
        let rules = view.rules();
        let (width, height) = view.map_size();

        // Area pass: contiguity on water classification only.
        let mut plot_area: FnvHashMap<PlotCoords, AreaId> = FnvHashMap::default();
        let mut visited: FnvHashSet<PlotCoords> = FnvHashSet::default();

        for y in 0..height {
            for x in 0..width {
                let start = PlotCoords::new(x, y);
                if visited.contains(&start) {
                    continue;
                }
                let Some(start_plot) = view.plot(start) else {
                    continue;
                };
                let start_water = start_plot.is_water(rules);
                let area_id = AreaId(registry.allocator.next_id());

                let mut stack = vec![start];
                visited.insert(start);
                while let Some(coords) = stack.pop() {
                    plot_area.insert(coords, area_id);
                    for next in coords.neighbours() {
                        if visited.contains(&next) {
                            continue;
                        }
                        if let Some(plot) = view.plot(next) {
                            if plot.is_water(rules) == start_water {
                                visited.insert(next);
                                stack.push(next);
                            }
                        }
                    }
                }
            }
        }

        // Sub-area pass: contiguity on (water, passability).
        visited.clear();
        for y in 0..height {
            for x in 0..width {
                let start = PlotCoords::new(x, y);
                if visited.contains(&start) {
                    continue;
                }
                let Some(start_plot) = view.plot(start) else {
                    continue;
                };
                let start_class = (start_plot.is_water(rules), start_plot.is_impassable(rules));
                let id = SubAreaId(registry.allocator.next_id());
                let area_id = plot_area[&start];

                let mut num_plots = 0u32;
                let mut stack = vec![start];
                visited.insert(start);
                while let Some(coords) = stack.pop() {
                    registry.plot_sub_area.insert(coords, id);
                    num_plots += 1;
                    for next in coords.neighbours() {
                        if visited.contains(&next) {
                            continue;
                        }
                        if let Some(plot) = view.plot(next) {
                            let class = (plot.is_water(rules), plot.is_impassable(rules));
                            if class == start_class {
                                visited.insert(next);
                                stack.push(next);
                            }
                        }
                    }
                }

                registry.sub_areas.insert(
                    id,
                    SubArea {
                        is_water: start_class.0,
                        is_impassable: start_class.1,
                        id,
                        area_id,
                        num_plots,
                    },
                );
            }
        }

        // Irrigation pass: contiguous passable land regions.
        visited.clear();
        for y in 0..height {
            for x in 0..width {
                let start = PlotCoords::new(x, y);
                if visited.contains(&start) {
                    continue;
                }
                let Some(start_plot) = view.plot(start) else {
                    continue;
                };
                if start_plot.is_water(rules) || start_plot.is_impassable(rules) {
                    continue;
                }
                let id = IrrigatableAreaId(registry.allocator.next_id());
                let sub_area_id = registry.plot_sub_area[&start];

                let mut num_plots = 0u32;
                let mut has_fresh_water = false;
                let mut is_hilly = true;
                let mut stack = vec![start];
                visited.insert(start);
                while let Some(coords) = stack.pop() {
                    registry.plot_irrigatable.insert(coords, id);
                    num_plots += 1;
                    if let Some(plot) = view.plot(coords) {
                        has_fresh_water |= plot.is_fresh_water;
                        is_hilly &= plot.is_hills;
                        for next in coords.neighbours() {
                            if visited.contains(&next) {
                                continue;
                            }
                            if let Some(next_plot) = view.plot(next) {
                                if !next_plot.is_water(rules) && !next_plot.is_impassable(rules) {
                                    visited.insert(next);
                                    stack.push(next);
                                }
                            }
                        }
                    }
                }

                registry.irrigatable_areas.insert(
                    id,
                    IrrigatableArea {
                        has_fresh_water_source: has_fresh_water,
                        is_hilly,
                        id,
                        sub_area_id,
                        num_plots,
                    },
                );
            }
        }

        registry.build_borders(view);
        registry
    }

    fn build_borders(&mut self, view: &dyn GameView) {
        let (width, height) = view.map_size();
        for y in 0..height {
            for x in 0..width {
                let coords = PlotCoords::new(x, y);
                let Some(&here) = self.plot_sub_area.get(&coords) else {
                    continue;
                };
                for next in coords.neighbours() {
                    if let Some(&there) = self.plot_sub_area.get(&next) {
                        if here != there {
                            self.borders.entry(here).or_default().insert(there);
                            self.borders.entry(there).or_default().insert(here);
                        }
                    }
                }
            }
        }
    }

    pub fn sub_area_at(&self, coords: PlotCoords) -> Option<SubAreaId> {
        self.plot_sub_area.get(&coords).copied()
    }

    pub fn sub_area(&self, id: SubAreaId) -> Option<&SubArea> {
        self.sub_areas.get(&id)
    }

    pub fn irrigatable_area_at(&self, coords: PlotCoords) -> Option<&IrrigatableArea> {
        self.plot_irrigatable
            .get(&coords)
            .and_then(|id| self.irrigatable_areas.get(id))
    }

    /// Sub-areas bordering the given one (the reachability graph edge set).
    pub fn bordering(&self, id: SubAreaId) -> impl Iterator<Item = SubAreaId> + '_ {
        self.borders.get(&id).into_iter().flatten().copied()
    }

    pub fn sub_areas(&self) -> impl Iterator<Item = &SubArea> {
        self.sub_areas.values()
    }
}
