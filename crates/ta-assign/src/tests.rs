//! Unit tests for ta-assign.

#[cfg(test)]
mod fixtures {
    use ta_core::{GeoPoint, NetworkDefaults, NodeId};
    use ta_demand::OdPair;
    use ta_network::{init_edge_attributes, EdgeAttrs, RawEdgeAttrs, RoadNetwork, RoadNetworkBuilder};

    fn raw(length: f64, speed: &str, lanes: &str, highway: &str) -> RawEdgeAttrs {
        RawEdgeAttrs {
            length_m: Some(length),
            maxspeed: Some(speed.into()),
            lanes: Some(lanes.into()),
            highway: Some(highway.into()),
            travel_time_s: None,
        }
    }

    /// Directed triangle:
    ///
    /// ```text
    /// 1 → 2   500 m, 50 kph, 2 lanes, primary     t0 = 36 s,  cap 2800
    /// 2 → 3   800 m, 40 kph, 1 lane,  secondary   t0 = 72 s,  cap 1100
    /// 1 → 3  1200 m, 30 kph, 1 lane,  residential t0 = 144 s, cap 600
    /// ```
    pub fn triangle() -> RoadNetwork {
        let d = NetworkDefaults::default();
        let mut b = RoadNetworkBuilder::new();
        b.add_node(NodeId(1), GeoPoint::new(18.000, -63.000)).unwrap();
        b.add_node(NodeId(2), GeoPoint::new(18.000, -62.995)).unwrap();
        b.add_node(NodeId(3), GeoPoint::new(18.005, -62.990)).unwrap();
        b.add_edge(NodeId(1), NodeId(2), init_edge_attributes(&raw(500.0, "50", "2", "primary"), &d));
        b.add_edge(NodeId(2), NodeId(3), init_edge_attributes(&raw(800.0, "40", "1", "secondary"), &d));
        b.add_edge(NodeId(1), NodeId(3), init_edge_attributes(&raw(1_200.0, "30", "1", "residential"), &d));
        b.build().unwrap()
    }

    pub fn triangle_od() -> Vec<OdPair> {
        vec![OdPair::new(NodeId(1), NodeId(3), 2_000.0)]
    }

    pub fn plain(free_flow_s: f64, capacity_vph: f64) -> EdgeAttrs {
        EdgeAttrs {
            length_m: 100.0,
            free_flow_s,
            capacity_vph,
            lanes: 1.0,
            highway: ta_network::HighwayClass::Residential,
        }
    }

    pub fn edge(net: &RoadNetwork, from: u64, to: u64) -> usize {
        net.edge_idx(&ta_core::EdgeKey::new(NodeId(from), NodeId(to), 0))
            .unwrap()
            .index()
    }
}

// ── Cost function ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod cost {
    use approx::assert_relative_eq;
    use ta_core::BprParams;

    use crate::bpr_time;

    #[test]
    fn zero_flow_is_exact_free_flow() {
        let p = BprParams::default();
        assert_eq!(bpr_time(37.3, 0.0, 900.0, &p), 37.3);
        // beta = 0 would make 0^0 = 1; the short-circuit still gives t0.
        let p0 = BprParams { alpha: 0.15, beta: 0.0 };
        assert_eq!(bpr_time(37.3, 0.0, 900.0, &p0), 37.3);
    }

    #[test]
    fn at_capacity() {
        let p = BprParams::default();
        assert_relative_eq!(bpr_time(100.0, 900.0, 900.0, &p), 115.0, epsilon = 1e-9);
    }

    #[test]
    fn monotone_and_above_free_flow() {
        let p = BprParams::default();
        let mut prev = bpr_time(10.0, 0.0, 1_000.0, &p);
        for step in 1..=50 {
            let t = bpr_time(10.0, step as f64 * 100.0, 1_000.0, &p);
            assert!(t >= 10.0);
            assert!(t > prev, "not increasing at flow {}", step * 100);
            prev = t;
        }
    }

    #[test]
    fn finite_far_beyond_capacity() {
        let p = BprParams::default();
        let t = bpr_time(10.0, 10_000.0, 1_000.0, &p);
        assert!(t.is_finite());
        assert_relative_eq!(t, 10.0 * (1.0 + 0.15 * 10_000.0), epsilon = 1e-6);
        assert!(bpr_time(10.0, 1e12, 1.0, &p).is_finite());
        assert_eq!(bpr_time(f64::MAX, 1e10, 1.0, &p), f64::MAX);
    }

    #[test]
    fn degenerate_inputs() {
        let p = BprParams::default();
        // Capacity floor of 1 vph.
        assert_eq!(bpr_time(10.0, 2.0, 0.0, &p), bpr_time(10.0, 2.0, 1.0, &p));
        assert_eq!(bpr_time(10.0, 2.0, -5.0, &p), bpr_time(10.0, 2.0, 1.0, &p));
        // Negative and NaN flow count as zero.
        assert_eq!(bpr_time(10.0, -3.0, 100.0, &p), 10.0);
        assert_eq!(bpr_time(10.0, f64::NAN, 100.0, &p), 10.0);
    }
}

// ── All-or-nothing ────────────────────────────────────────────────────────────

#[cfg(test)]
mod aon {
    use ta_core::{GeoPoint, NodeId};
    use ta_demand::OdPair;
    use ta_network::RoadNetworkBuilder;

    use super::fixtures::{edge, plain, triangle, triangle_od};
    use crate::all_or_nothing;

    #[test]
    fn loads_free_flow_shortest_path() {
        let net = triangle();
        let r = all_or_nothing(&net, &triangle_od());
        // Via 2: 36 + 72 = 108 s beats direct 144 s.
        assert_eq!(r.aux[edge(&net, 1, 2)], 2_000.0);
        assert_eq!(r.aux[edge(&net, 2, 3)], 2_000.0);
        assert_eq!(r.aux[edge(&net, 1, 3)], 0.0);
        assert_eq!(r.stats.assigned, 1);
    }

    #[test]
    fn missing_unreachable_and_trivial_counted_separately() {
        let net = triangle();
        let od = vec![
            OdPair::new(NodeId(1), NodeId(99), 10.0), // missing
            OdPair::new(NodeId(3), NodeId(1), 10.0),  // one-way: unreachable
            OdPair::new(NodeId(2), NodeId(2), 10.0),  // trivial
            OdPair::new(NodeId(1), NodeId(2), 10.0),  // assigned
        ];
        let r = all_or_nothing(&net, &od);
        assert_eq!(r.stats.missing_endpoint, 1);
        assert_eq!(r.stats.unreachable, 1);
        assert_eq!(r.stats.trivial, 1);
        assert_eq!(r.stats.assigned, 1);
        assert_eq!(r.stats.present(), 3);
        assert_eq!(r.aux[edge(&net, 1, 2)], 10.0);
    }

    #[test]
    fn cheapest_parallel_edge_carries_flow() {
        let mut b = RoadNetworkBuilder::new();
        b.add_node(NodeId(1), GeoPoint::new(0.0, 0.0)).unwrap();
        b.add_node(NodeId(2), GeoPoint::new(0.0, 0.001)).unwrap();
        b.add_edge(NodeId(1), NodeId(2), plain(10.0, 500.0)); // key 0
        b.add_edge(NodeId(1), NodeId(2), plain(5.0, 500.0));  // key 1
        b.add_edge(NodeId(1), NodeId(2), plain(5.0, 500.0));  // key 2, tie
        let net = b.build().unwrap();
        let r = all_or_nothing(&net, &[OdPair::new(NodeId(1), NodeId(2), 300.0)]);
        assert_eq!(r.aux, vec![0.0, 300.0, 0.0]);
    }
}

// ── MSA ───────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod msa {
    use approx::assert_relative_eq;
    use ta_core::{BprParams, TaError};

    use super::fixtures::{edge, triangle, triangle_od};
    use crate::{msa_assign, total_delay_s, total_system_travel_time_s, AssignError, AssignParams};

    fn params(iters: i64) -> AssignParams {
        AssignParams::new(iters, BprParams::default(), None).unwrap()
    }

    #[test]
    fn triangle_end_to_end() {
        let solved = msa_assign(triangle(), &triangle_od(), &params(5)).unwrap();
        let net = &solved.network;
        assert!(net.edge_flow_vph.iter().all(|&f| f > 0.0), "{:?}", net.edge_flow_vph);
        assert!(total_delay_s(net) >= 0.0);
        assert!(total_system_travel_time_s(net) > 0.0);
        assert_eq!(solved.report.iterations_run, 5);
        assert_eq!(solved.report.aon.assigned, 1);

        // Flow conservation at node 2 and at the origin.
        let (e12, e23, e13) = (edge(net, 1, 2), edge(net, 2, 3), edge(net, 1, 3));
        assert_relative_eq!(net.edge_flow_vph[e12], net.edge_flow_vph[e23], epsilon = 1e-9);
        assert_relative_eq!(
            net.edge_flow_vph[e12] + net.edge_flow_vph[e13],
            2_000.0,
            epsilon = 1e-9
        );
        for i in 0..net.edge_count() {
            assert!(net.edge_time_s[i] >= net.edge_free_flow_s[i]);
        }
    }

    #[test]
    fn deterministic() {
        let a = msa_assign(triangle(), &triangle_od(), &params(12)).unwrap();
        let b = msa_assign(triangle(), &triangle_od(), &params(12)).unwrap();
        let bits = |v: &Vec<f64>| v.iter().map(|x| x.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&a.network.edge_flow_vph), bits(&b.network.edge_flow_vph));
        assert_eq!(bits(&a.network.edge_time_s), bits(&b.network.edge_time_s));
    }

    #[test]
    fn zero_iterations_is_free_flow() {
        let solved = msa_assign(triangle(), &triangle_od(), &params(0)).unwrap();
        let net = &solved.network;
        assert!(net.edge_flow_vph.iter().all(|&f| f == 0.0));
        assert_eq!(net.edge_time_s, net.edge_free_flow_s);
        assert_eq!(solved.report.iterations_run, 0);
        assert_eq!(solved.report.last_relative_change, None);
    }

    #[test]
    fn negative_iterations_rejected() {
        let err = AssignParams::new(-1, BprParams::default(), None).unwrap_err();
        assert!(matches!(err, AssignError::NegativeIterations(-1)));
    }

    #[test]
    fn bad_parameters_rejected() {
        let bad = BprParams { alpha: -1.0, beta: 4.0 };
        assert!(matches!(
            AssignParams::new(5, bad, None),
            Err(AssignError::Core(TaError::Config(_)))
        ));
        assert!(matches!(
            AssignParams::new(5, BprParams::default(), Some(0.0)),
            Err(AssignError::InvalidParameter(_))
        ));
    }

    #[test]
    fn tolerance_stops_early() {
        let p = AssignParams::new(50, BprParams::default(), Some(0.5)).unwrap();
        let solved = msa_assign(triangle(), &triangle_od(), &p).unwrap();
        assert!(solved.report.converged_early);
        assert!(solved.report.iterations_run < 50);
        assert!(solved.report.last_relative_change.unwrap() < 0.5);
    }

    #[test]
    fn stale_flows_are_discarded() {
        let mut dirty = triangle();
        dirty.edge_flow_vph.iter_mut().for_each(|f| *f = 9_999.0);
        let a = msa_assign(dirty, &triangle_od(), &params(4)).unwrap();
        let b = msa_assign(triangle(), &triangle_od(), &params(4)).unwrap();
        assert_eq!(a.network.edge_flow_vph, b.network.edge_flow_vph);
    }
}

// ── Metrics ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod metrics {
    use approx::assert_relative_eq;
    use ta_core::{EdgeKey, GeoPoint, NodeId};
    use ta_network::{RoadNetwork, RoadNetworkBuilder};

    use super::fixtures::plain;
    use crate::{top_bottlenecks, total_delay_s, total_system_travel_time_s, SystemKpis};

    /// Star of four edges out of node 1 with hand-set flows and times.
    fn loaded() -> RoadNetwork {
        let mut b = RoadNetworkBuilder::new();
        for (id, lon) in [(1, 0.0), (2, 0.001), (3, 0.002), (4, 0.003), (5, 0.004)] {
            b.add_node(NodeId(id), GeoPoint::new(0.0, lon)).unwrap();
        }
        for to in 2..=5 {
            b.add_edge(NodeId(1), NodeId(to), plain(10.0, 1_000.0));
        }
        let mut net = b.build().unwrap();
        // (flow, time) per edge 1→2, 1→3, 1→4, 1→5
        let state = [(3_600.0, 20.0), (500.0, 30.0), (1_000.0, 20.0), (0.0, 10.0)];
        for (i, (f, t)) in state.into_iter().enumerate() {
            net.edge_flow_vph[i] = f;
            net.edge_time_s[i] = t;
        }
        net
    }

    #[test]
    fn sums_and_kpis() {
        let net = loaded();
        // 3600×20 + 500×30 + 1000×20 = 107 000 veh-s/h
        assert_relative_eq!(total_system_travel_time_s(&net), 107_000.0);
        // 3600×10 + 500×20 + 1000×10 = 56 000 veh-s/h
        assert_relative_eq!(total_delay_s(&net), 56_000.0);

        let k = SystemKpis::from_network(&net, 5_100.0);
        assert_relative_eq!(k.tstt_veh_h, 107_000.0 / 3_600.0);
        assert_relative_eq!(k.delay_veh_h, 56_000.0 / 3_600.0);
        assert_relative_eq!(k.avg_delay_min, 56_000.0 / 3_600.0 / 5_100.0 * 60.0);

        let none = SystemKpis::from_network(&net, 0.0);
        assert_eq!(none.avg_travel_min, 0.0);
        assert_eq!(none.avg_delay_min, 0.0);
    }

    #[test]
    fn delay_never_negative() {
        let mut net = loaded();
        // Corrupt one time below t0; the edge contributes zero delay.
        net.edge_time_s[3] = 1.0;
        net.edge_flow_vph[3] = 100.0;
        assert!(total_delay_s(&net) >= 0.0);
        assert_relative_eq!(total_delay_s(&net), 56_000.0);
    }

    #[test]
    fn bottleneck_order_delay_then_vc_then_edge() {
        let net = loaded();
        let top = top_bottlenecks(&net, 10);
        // Edges 1→2 (36 000) and 1→3 (10 000) and 1→4 (10 000, higher v/c)
        let order: Vec<NodeId> = top.iter().map(|b| b.edge.to).collect();
        assert_eq!(order, vec![NodeId(2), NodeId(4), NodeId(3), NodeId(5)]);
        assert_relative_eq!(top[0].v_c, 3.6);
        assert_relative_eq!(top[0].delay_h, 10.0);
        assert_eq!(top_bottlenecks(&net, 2).len(), 2);
    }

    #[test]
    fn full_ties_fall_back_to_edge_key() {
        let mut net = loaded();
        for i in 0..net.edge_count() {
            net.edge_flow_vph[i] = 100.0;
            net.edge_time_s[i] = 15.0;
        }
        let top = top_bottlenecks(&net, 4);
        let keys: Vec<EdgeKey> = top.iter().map(|b| b.edge).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }
}
