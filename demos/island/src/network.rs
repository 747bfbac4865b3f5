//! Synthetic island road network.
//!
//! Two 4 × 4 street grids (a west town and an east town) about 1 km apart,
//! joined by a two-lane causeway on the second row and a slow single-lane
//! coast road on the bottom row.  The causeway is the obvious bottleneck.
//!
//! Raw attributes go through `init_edge_attributes` exactly as CSV rows do.

use ta_core::{GeoPoint, NetworkDefaults, NodeId};
use ta_network::{init_edge_attributes, NetworkResult, RawEdgeAttrs, RoadNetwork, RoadNetworkBuilder};

const ORIGIN:          (f64, f64) = (13.440, 144.700);
const SPACING:         f64        = 0.0015; // ~165 m
const GRID:            u64        = 4;
const EAST_OFFSET_DEG: f64        = 0.0135;

fn node(town: u64, row: u64, col: u64) -> NodeId {
    NodeId(town * 100 + row * 10 + col)
}

fn raw(highway: &str, maxspeed: &str, lanes: &str) -> RawEdgeAttrs {
    RawEdgeAttrs {
        maxspeed: Some(maxspeed.to_owned()),
        lanes: Some(lanes.to_owned()),
        highway: Some(highway.to_owned()),
        ..RawEdgeAttrs::default()
    }
}

/// Build the island network.  Node ids are `town*100 + row*10 + col` with
/// town 1 (west) and 2 (east).
pub fn build_island(defaults: &NetworkDefaults) -> NetworkResult<RoadNetwork> {
    let mut b = RoadNetworkBuilder::new();

    for (town, lon0) in [(1, ORIGIN.1), (2, ORIGIN.1 + EAST_OFFSET_DEG)] {
        for row in 0..GRID {
            for col in 0..GRID {
                let pos = GeoPoint::new(
                    ORIGIN.0 - row as f64 * SPACING,
                    lon0 + col as f64 * SPACING,
                );
                b.add_node(node(town, row, col), pos)?;
            }
        }
    }

    let road = |b: &mut RoadNetworkBuilder, from: NodeId, to: NodeId, attrs: RawEdgeAttrs| {
        let len = match (b.node_pos(from), b.node_pos(to)) {
            (Some(p), Some(q)) => Some(p.distance_m(q)),
            _ => None,
        };
        let attrs = init_edge_attributes(&RawEdgeAttrs { length_m: len, ..attrs }, defaults);
        b.add_road(from, to, attrs);
    };

    for town in [1, 2] {
        for row in 0..GRID {
            for col in 0..GRID {
                // Row 1 is the main street through each town.
                let along = if row == 1 {
                    raw("secondary", "50", "2")
                } else {
                    raw("residential", "['30', '40']", "1")
                };
                if col + 1 < GRID {
                    road(&mut b, node(town, row, col), node(town, row, col + 1), along);
                }
                if row + 1 < GRID {
                    road(&mut b, node(town, row, col), node(town, row + 1, col), raw("residential", "30", "1"));
                }
            }
        }
    }

    road(&mut b, node(1, 1, GRID - 1), node(2, 1, 0), raw("primary", "60", "2"));
    road(&mut b, node(1, 3, GRID - 1), node(2, 3, 0), raw("tertiary", "25 mph", "1"));

    b.build()
}
