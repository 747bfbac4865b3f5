//! Unit tests for ta-demand.

#[cfg(test)]
mod helpers {
    use ta_core::{GeoPoint, NodeId};
    use ta_network::{EdgeAttrs, HighwayClass, RoadNetwork, RoadNetworkBuilder};

    /// Three-node triangle: primary 1↔2, secondary 2↔3, service 1↔3, plus an
    /// isolated node 4.
    pub fn small_network() -> RoadNetwork {
        let mut b = RoadNetworkBuilder::new();
        b.add_node(NodeId(1), GeoPoint::new(18.00, -63.00)).unwrap();
        b.add_node(NodeId(2), GeoPoint::new(18.00, -62.99)).unwrap();
        b.add_node(NodeId(3), GeoPoint::new(18.01, -63.00)).unwrap();
        b.add_node(NodeId(4), GeoPoint::new(18.02, -63.00)).unwrap();
        let road = |hw| EdgeAttrs::from_speed(500.0, 40.0, 1.0, 900.0, hw);
        b.add_road(NodeId(1), NodeId(2), road(HighwayClass::Primary));
        b.add_road(NodeId(2), NodeId(3), road(HighwayClass::Secondary));
        b.add_road(NodeId(1), NodeId(3), road(HighwayClass::Service));
        b.build().unwrap()
    }
}

// ── Generation ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod generate {
    use approx::assert_relative_eq;
    use ta_core::{DemandConfig, GeoPoint, NodeId, SimRng};
    use ta_network::RoadNetworkBuilder;

    use crate::{generate_from_config, generate_od_weighted_total, node_weights, total_demand, DemandError};

    #[test]
    fn weights_reflect_road_class() {
        let net = super::helpers::small_network();
        let w = node_weights(&net);
        // Node 1: primary (3) ×2 directions + service (0.6) ×2
        assert_relative_eq!(w[0], 1.0 + 6.0 + 1.2);
        // Isolated node keeps the base weight.
        assert_relative_eq!(w[3], 1.0);
    }

    #[test]
    fn total_matches_request() {
        let net = super::helpers::small_network();
        let mut rng = SimRng::new(1);
        let od = generate_od_weighted_total(&net, 10, 1_000.0, &mut rng).unwrap();
        assert_eq!(od.len(), 10);
        assert!((total_demand(&od) - 1_000.0).abs() < 1e-6);
        for p in &od {
            assert_ne!(p.origin, p.destination);
            assert!(p.demand_vph > 0.0);
        }
    }

    #[test]
    fn zero_pairs_is_empty() {
        let net = super::helpers::small_network();
        let mut rng = SimRng::new(1);
        assert!(generate_od_weighted_total(&net, 0, 500.0, &mut rng).unwrap().is_empty());
    }

    #[test]
    fn same_seed_same_list() {
        let net = super::helpers::small_network();
        let cfg = DemandConfig { n_pairs: 25, total_demand_vph: 3_000.0, seed: 7, od_factor: 1.0 };
        let a = generate_from_config(&net, &cfg).unwrap();
        let b = generate_from_config(&net, &cfg).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn invalid_inputs_rejected() {
        let net = super::helpers::small_network();
        let mut rng = SimRng::new(1);
        assert!(matches!(
            generate_od_weighted_total(&net, 5, -1.0, &mut rng),
            Err(DemandError::InvalidTotal(_))
        ));

        let mut b = RoadNetworkBuilder::new();
        b.add_node(NodeId(1), GeoPoint::new(0.0, 0.0)).unwrap();
        let lonely = b.build().unwrap();
        assert!(matches!(
            generate_od_weighted_total(&lonely, 5, 100.0, &mut rng),
            Err(DemandError::TooFewNodes(1))
        ));
        // Nothing requested: no error even on a one-node network.
        assert!(generate_od_weighted_total(&lonely, 0, 100.0, &mut rng).is_ok());
    }
}

// ── Scaling ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod scale {
    use ta_core::NodeId;

    use crate::{scale_od, total_demand, DemandError, OdPair};

    fn od() -> Vec<OdPair> {
        vec![
            OdPair::new(NodeId(1), NodeId(2), 100.0),
            OdPair::new(NodeId(3), NodeId(1), 50.0),
        ]
    }

    #[test]
    fn scales_and_preserves_pairs() {
        let scaled = scale_od(&od(), 0.8).unwrap();
        assert!((total_demand(&scaled) - 120.0).abs() < 1e-9);
        for (a, b) in od().iter().zip(&scaled) {
            assert_eq!((a.origin, a.destination), (b.origin, b.destination));
        }
    }

    #[test]
    fn composition_and_identity() {
        let twice = scale_od(&scale_od(&od(), 0.5).unwrap(), 0.6).unwrap();
        let once = scale_od(&od(), 0.3).unwrap();
        for (a, b) in twice.iter().zip(&once) {
            assert!((a.demand_vph - b.demand_vph).abs() < 1e-9);
        }
        assert_eq!(scale_od(&od(), 1.0).unwrap(), od());
    }

    #[test]
    fn negative_factor_rejected() {
        assert!(matches!(scale_od(&od(), -0.1), Err(DemandError::InvalidScale(_))));
    }
}

// ── CSV loader ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod loader {
    use std::io::Cursor;

    use ta_core::NodeId;

    use crate::{load_od_reader, DemandError};

    #[test]
    fn loads_rows() {
        let csv = "origin,destination,demand_vph\n1,3,2000\n4,7,125.5\n";
        let od = load_od_reader(Cursor::new(csv)).unwrap();
        assert_eq!(od.len(), 2);
        assert_eq!(od[0].origin, NodeId(1));
        assert_eq!(od[1].demand_vph, 125.5);
    }

    #[test]
    fn non_positive_demand_rejected() {
        for bad in ["-5", "0", "NaN"] {
            let csv = format!("origin,destination,demand_vph\n1,3,{bad}\n");
            assert!(
                matches!(load_od_reader(Cursor::new(csv)), Err(DemandError::Parse(_))),
                "accepted {bad}"
            );
        }
    }
}
