use std::collections::HashMap;

use crate::world::spatial::BBox;
use crate::world::store::TileStore;
use crate::world::tile::TileKind;

/// Aggregate view of a tile map, for summaries and inspection.
#[derive(Debug, Clone)]
pub struct MapStatistics {
    pub total: usize,
    pub normal: usize,
    pub options: usize,
    /// Union of all tile footprints, `None` for an empty map.
    pub extent: Option<BBox>,
    pub colour_distribution: HashMap<String, u32>,
    pub colour_diversity: f32,
    pub selected: Option<String>,
}

impl MapStatistics {
    pub fn compute(store: &TileStore) -> Self {
        let mut normal = 0;
        let mut options = 0;
        let mut extent: Option<BBox> = None;
        let mut colours: HashMap<String, u32> = HashMap::new();

        for tile in store.all_tiles() {
            match tile.kind {
                TileKind::Normal => {
                    normal += 1;
                    *colours.entry(tile.colour.as_str().to_string()).or_insert(0) += 1;
                }
                TileKind::Option => options += 1,
            }
            let bbox = tile.bbox();
            match extent.as_mut() {
                Some(e) => e.extend(&bbox),
                None => extent = Some(bbox),
            }
        }

        let diversity = shannon_diversity(&colours, normal as u32);

        MapStatistics {
            total: store.len(),
            normal,
            options,
            extent,
            colour_distribution: colours,
            colour_diversity: diversity,
            selected: store.selected_id().map(|id| id.to_string()),
        }
    }
}

/// Shannon diversity index normalized to [0, 1].
/// 0 = a single colour, 1 = every present colour equally represented.
fn shannon_diversity(distribution: &HashMap<String, u32>, total: u32) -> f32 {
    if total == 0 {
        return 0.0;
    }

    let total_f = total as f64;
    let mut entropy = 0.0_f64;
    let mut non_zero = 0_u32;

    for &count in distribution.values() {
        if count > 0 {
            non_zero += 1;
            let p = count as f64 / total_f;
            entropy -= p * p.ln();
        }
    }

    if non_zero <= 1 {
        return 0.0;
    }

    let max_entropy = (non_zero as f64).ln();
    (entropy / max_entropy) as f32
}
