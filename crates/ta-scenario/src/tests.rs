//! Unit tests for ta-scenario.

#[cfg(test)]
mod fixtures {
    use ta_core::{GeoPoint, NodeId};
    use ta_demand::OdPair;
    use ta_network::{EdgeAttrs, HighwayClass, RoadNetwork, RoadNetworkBuilder};

    pub fn road(free_flow_s: f64, capacity_vph: f64) -> EdgeAttrs {
        EdgeAttrs {
            length_m: 111.0,
            free_flow_s,
            capacity_vph,
            lanes: 1.0,
            highway: HighwayClass::Tertiary,
        }
    }

    /// A "U" around a congested bottom row.
    ///
    /// ```text
    ///         5 . . . 6          5 and 6: ~111 m apart, not connected
    ///        /         \         1-5 and 4-6: 300 s, slow
    ///   1 ── 2 ── 3 ── 4         bottom row: 10 s, 500 vph
    /// ```
    ///
    /// Bottom nodes are 0.001° of longitude apart at the equator (~111 m).
    pub fn u_network() -> RoadNetwork {
        let mut b = RoadNetworkBuilder::new();
        let pts = [
            (1, 0.0, 0.000),
            (2, 0.0, 0.001),
            (3, 0.0, 0.002),
            (4, 0.0, 0.003),
            (5, 0.0015, 0.001),
            (6, 0.0015, 0.002),
        ];
        for (id, lat, lon) in pts {
            b.add_node(NodeId(id), GeoPoint::new(lat, lon)).unwrap();
        }
        b.add_road(NodeId(1), NodeId(2), road(10.0, 500.0));
        b.add_road(NodeId(2), NodeId(3), road(10.0, 500.0));
        b.add_road(NodeId(3), NodeId(4), road(10.0, 500.0));
        b.add_road(NodeId(1), NodeId(5), road(300.0, 500.0));
        b.add_road(NodeId(4), NodeId(6), road(300.0, 500.0));
        b.build().unwrap()
    }

    pub fn heavy_od() -> Vec<OdPair> {
        vec![OdPair::new(NodeId(1), NodeId(4), 1_500.0)]
    }

    /// Straight chain 1 … 6 along the equator, 0.001° apart, 20 s per edge
    /// in both directions.
    pub fn chain() -> RoadNetwork {
        let mut b = RoadNetworkBuilder::new();
        for id in 1..=6u64 {
            b.add_node(NodeId(id), GeoPoint::new(0.0, (id - 1) as f64 * 0.001)).unwrap();
        }
        for id in 1..6u64 {
            b.add_road(NodeId(id), NodeId(id + 1), road(20.0, 1_000.0));
        }
        b.build().unwrap()
    }
}

// ── Connector spec ────────────────────────────────────────────────────────────

#[cfg(test)]
mod connector {
    use approx::assert_relative_eq;
    use ta_core::{EdgeKey, NodeId};
    use ta_network::HighwayClass;

    use super::fixtures::u_network;
    use crate::{apply_connector, ConnectorSpec, ScenarioError, DEFAULT_CONNECTOR_NAME};

    #[test]
    fn defaults_and_derived_attributes() {
        let spec = ConnectorSpec::new(NodeId(1), NodeId(2), 350.0);
        assert_eq!(spec.speed_kph, 40.0);
        assert_eq!(spec.lanes, 1.0);
        assert!(!spec.oneway);
        assert_eq!(spec.name, DEFAULT_CONNECTOR_NAME);
        assert_relative_eq!(spec.free_flow_s(), 31.5, epsilon = 1e-9);
        assert_relative_eq!(spec.with_design(40.0, 2.0).capacity_vph(900.0), 1_800.0);
    }

    #[test]
    fn adds_both_directions_with_next_key() {
        let net = u_network();
        let spec = ConnectorSpec::new(NodeId(2), NodeId(3), 111.0);
        let (out, added) = apply_connector(&net, &spec, true, 900.0).unwrap();
        assert_eq!(
            added,
            vec![
                EdgeKey::new(NodeId(2), NodeId(3), 1),
                EdgeKey::new(NodeId(3), NodeId(2), 1),
            ]
        );
        assert_eq!(out.edge_count(), net.edge_count() + 2);
        let e = out.edge_idx(&added[0]).unwrap();
        assert_eq!(out.edge_highway[e.index()], HighwayClass::ProposedConnector);
        assert_eq!(out.edge_capacity_vph[e.index()], 900.0);
        assert_eq!(out.edge_flow_vph[e.index()], 0.0);
    }

    #[test]
    fn oneway_adds_single_edge() {
        let net = u_network();
        let mut spec = ConnectorSpec::new(NodeId(5), NodeId(6), 111.0);
        spec.oneway = true;
        let (out, added) = apply_connector(&net, &spec, true, 900.0).unwrap();
        assert_eq!(added.len(), 1);
        assert_eq!(out.edge_count(), net.edge_count() + 1);

        let spec = ConnectorSpec::new(NodeId(5), NodeId(6), 111.0);
        let (_, added) = apply_connector(&net, &spec, false, 900.0).unwrap();
        assert_eq!(added.len(), 1);
    }

    #[test]
    fn missing_endpoint_is_error() {
        let net = u_network();
        let spec = ConnectorSpec::new(NodeId(5), NodeId(77), 111.0);
        assert!(matches!(
            apply_connector(&net, &spec, true, 900.0),
            Err(ScenarioError::NodeNotFound(NodeId(77)))
        ));
    }
}

// ── Near-edge proposer ────────────────────────────────────────────────────────

#[cfg(test)]
mod near_edge {
    use ta_core::{GeoPoint, NodeId, ProposerParams};
    use ta_network::RoadNetworkBuilder;

    use super::fixtures::{road, u_network};
    use crate::{propose_connector_near_edge, ProposerError};

    #[test]
    fn picks_longest_relative_detour() {
        let net = u_network();
        let p = propose_connector_near_edge(&net, NodeId(2), NodeId(3), &ProposerParams::default())
            .unwrap();
        assert!(!p.fallback);
        // 5 and 6 are ~111 m apart with a 630 s free-flow detour.
        assert_eq!(p.spec.undirected_pair(), (NodeId(5), NodeId(6)));
        assert!(p.score > 5.0, "score {}", p.score);
        assert!((p.spec.length_m - 111.2).abs() < 1.0);
        assert!(p.candidates_scored > 1);
    }

    #[test]
    fn does_not_mutate_network() {
        let net = u_network();
        let before = (net.edge_key.clone(), net.edge_time_s.clone());
        let _ = propose_connector_near_edge(&net, NodeId(2), NodeId(3), &ProposerParams::default());
        assert_eq!(before, (net.edge_key.clone(), net.edge_time_s.clone()));
    }

    #[test]
    fn fallback_joins_edge_endpoints() {
        let mut b = RoadNetworkBuilder::new();
        b.add_node(NodeId(1), GeoPoint::new(0.0, 0.0)).unwrap();
        b.add_node(NodeId(2), GeoPoint::new(0.0, 0.001)).unwrap();
        b.add_road(NodeId(1), NodeId(2), road(10.0, 500.0));
        let net = b.build().unwrap();

        let p = propose_connector_near_edge(&net, NodeId(1), NodeId(2), &ProposerParams::default())
            .unwrap();
        assert!(p.fallback);
        assert_eq!((p.spec.a, p.spec.b), (NodeId(1), NodeId(2)));
        assert!((p.spec.length_m - 111.2).abs() < 1.0);
        assert_eq!(p.candidates_scored, 0);
    }

    #[test]
    fn max_pairs_zero_forces_fallback() {
        let net = u_network();
        let params = ProposerParams { max_pairs: 0, ..ProposerParams::default() };
        let p = propose_connector_near_edge(&net, NodeId(2), NodeId(3), &params).unwrap();
        assert!(p.fallback);
        assert_eq!((p.spec.a, p.spec.b), (NodeId(2), NodeId(3)));
    }

    #[test]
    fn unknown_endpoint_is_error() {
        let net = u_network();
        let err = propose_connector_near_edge(&net, NodeId(2), NodeId(42), &ProposerParams::default())
            .unwrap_err();
        assert!(matches!(err, ProposerError::NodeNotFound(NodeId(42))));
    }
}

// ── Relief proposer ───────────────────────────────────────────────────────────

#[cfg(test)]
mod relief {
    use approx::assert_relative_eq;
    use ta_core::{EdgeKey, NodeId, ProposerParams};
    use ta_demand::OdPair;
    use ta_network::attributes::free_flow_time_s;

    use super::fixtures::chain;
    use crate::shortest_path_relief_connectors;

    fn bottleneck() -> EdgeKey {
        EdgeKey::new(NodeId(3), NodeId(4), 0)
    }

    #[test]
    fn aggregates_demand_per_pair() {
        let net = chain();
        let od = vec![
            OdPair::new(NodeId(1), NodeId(6), 100.0),
            OdPair::new(NodeId(2), NodeId(6), 50.0),
            OdPair::new(NodeId(6), NodeId(1), 70.0),  // opposite direction, ignored
            OdPair::new(NodeId(1), NodeId(99), 70.0), // missing endpoint, ignored
        ];
        let out = shortest_path_relief_connectors(&net, &od, bottleneck(), "B1", &ProposerParams::default());

        // Within 350 m only 2 <-> 5 qualifies (3 × 111 m).
        assert_eq!(out.len(), 1);
        let c = &out[0];
        assert_eq!((c.spec.a, c.spec.b), (NodeId(2), NodeId(5)));
        assert_eq!(c.spec.name, "Relief connector near B1 (2 <-> 5)");
        assert_relative_eq!(c.demand_vph, 150.0);
        let saved = 60.0 - free_flow_time_s(c.spec.length_m, 40.0);
        assert_relative_eq!(c.score, 150.0 * saved, epsilon = 1e-6);
    }

    #[test]
    fn ranked_and_truncated() {
        let net = chain();
        let od = vec![OdPair::new(NodeId(1), NodeId(6), 100.0)];
        let params = ProposerParams {
            relief_max_straight_m: 500.0,
            relief_top_k: 2,
            ..ProposerParams::default()
        };
        let out = shortest_path_relief_connectors(&net, &od, bottleneck(), "B1", &params);
        assert_eq!(out.len(), 2);
        assert!(out[0].score >= out[1].score);
        // The three-edge shortcut saves least and is cut.
        assert!(out.iter().all(|c| c.spec.undirected_pair() != (NodeId(2), NodeId(5))));
    }

    #[test]
    fn no_crossing_trips_no_candidates() {
        let net = chain();
        let od = vec![OdPair::new(NodeId(4), NodeId(6), 100.0)];
        let out = shortest_path_relief_connectors(&net, &od, bottleneck(), "B1", &ProposerParams::default());
        assert!(out.is_empty());
        let missing = EdgeKey::new(NodeId(8), NodeId(9), 0);
        assert!(shortest_path_relief_connectors(&net, &od, missing, "X", &ProposerParams::default()).is_empty());
    }
}

// ── Scenarios ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod scenario {
    use approx::assert_relative_eq;
    use ta_core::{EdgeKey, NodeId};
    use ta_demand::{total_demand, OdPair};

    use super::fixtures::u_network;
    use crate::{ConnectorSpec, Scenario, ScenarioError};

    fn key(a: u64, b: u64) -> EdgeKey {
        EdgeKey::new(NodeId(a), NodeId(b), 0)
    }

    #[test]
    fn capacity_increase_on_copy() {
        let net = u_network();
        let s = Scenario::IncreaseCapacity { edge: key(2, 3), pct: 0.25 };
        let out = s.apply(&net).unwrap();
        let e = net.edge_idx(&key(2, 3)).unwrap().index();
        assert_relative_eq!(out.edge_capacity_vph[e], 625.0);
        assert_eq!(net.edge_capacity_vph[e], 500.0);
        assert_eq!(s.kind(), "capacity_increase");
    }

    #[test]
    fn missing_edge_leaves_copy_unchanged() {
        let net = u_network();
        for s in [
            Scenario::IncreaseCapacity { edge: key(5, 6), pct: 0.25 },
            Scenario::Closure { edge: key(5, 6) },
        ] {
            let out = s.apply(&net).unwrap();
            assert_eq!(out.edge_key, net.edge_key);
            assert_eq!(out.edge_capacity_vph, net.edge_capacity_vph);
        }
    }

    #[test]
    fn closure_removes_one_edge() {
        let net = u_network();
        let out = Scenario::Closure { edge: key(2, 3) }.apply(&net).unwrap();
        assert_eq!(out.edge_count(), net.edge_count() - 1);
        assert!(out.edge_idx(&key(2, 3)).is_none());
        assert!(out.edge_idx(&key(3, 2)).is_some());
    }

    #[test]
    fn invalid_capacity_change_rejected() {
        let net = u_network();
        let s = Scenario::IncreaseCapacity { edge: key(2, 3), pct: -1.0 };
        assert!(matches!(s.apply(&net), Err(ScenarioError::Invalid(_))));
    }

    #[test]
    fn connector_uses_configured_capacity() {
        let net = u_network();
        let s = Scenario::AddConnector {
            spec: ConnectorSpec::new(NodeId(5), NodeId(6), 111.0),
            two_way: true,
        };
        let out = s.apply_with(&net, 1_200.0).unwrap();
        let e = out.edge_idx(&key(5, 6)).unwrap().index();
        assert_eq!(out.edge_capacity_vph[e], 1_200.0);
        assert!(s.description().contains("two-way"));
    }

    #[test]
    fn demand_scaling_leaves_network_alone() {
        let net = u_network();
        let od = vec![OdPair::new(NodeId(1), NodeId(4), 1_000.0)];
        let s = Scenario::ScaleDemand { factor: 0.8 };
        let out = s.apply(&net).unwrap();
        assert_eq!(out.edge_key, net.edge_key);
        assert_relative_eq!(total_demand(&s.apply_demand(&od).unwrap()), 800.0);
        let other = Scenario::Closure { edge: key(1, 2) };
        assert_eq!(other.apply_demand(&od).unwrap(), od);
    }
}

// ── Engine ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod engine {
    use ta_assign::{AonStats, AssignParams, SystemKpis};
    use ta_core::{BprParams, EdgeKey, NodeId};

    use super::fixtures::{heavy_od, u_network};
    use crate::{ConnectorSpec, Scenario, ScenarioComparison, ScenarioEngine};

    fn engine() -> ScenarioEngine {
        let params = AssignParams::new(20, BprParams::default(), None).unwrap();
        ScenarioEngine::new(u_network(), heavy_od(), params)
    }

    #[test]
    fn baseline_is_cached() {
        let e = engine();
        let a = e.baseline().unwrap() as *const _;
        let b = e.baseline().unwrap() as *const _;
        assert!(std::ptr::eq(a, b));
        assert!(e.baseline().unwrap().kpis.delay_veh_h > 0.0);
    }

    #[test]
    fn parallel_connector_relieves_bottleneck() {
        let e = engine();
        let s = Scenario::AddConnector {
            spec: ConnectorSpec::new(NodeId(2), NodeId(3), 111.0),
            two_way: true,
        };
        let out = e.evaluate("T1", &s).unwrap();
        let c = &out.comparison;
        assert_eq!(c.scenario_id, "T1");
        assert_eq!(c.kind, "add_connector");
        assert!(c.delta_delay_veh_h < 0.0);
        assert!(c.delay_improvement_pct > 0.0);
        assert!(c.scenario_avg_delay_min < c.baseline_avg_delay_min);
        assert!(!c.has_stranded_demand());
    }

    #[test]
    fn disconnecting_closure_reports_stranded_pairs() {
        let e = engine();
        let closure = Scenario::Closure { edge: EdgeKey::new(NodeId(1), NodeId(2), 0) };
        let out = e.evaluate("CUT", &closure).unwrap();
        let c = &out.comparison;
        assert_eq!(out.solved.report.aon.unreachable, 1);
        assert_eq!(c.unreachable_od, 1);
        assert_eq!(c.missing_endpoint_od, 0);
        assert!(c.has_stranded_demand());
        assert_eq!(c.scenario_delay_veh_h, 0.0);
    }

    #[test]
    fn aon_stats_copied_onto_comparison() {
        let k = SystemKpis {
            tstt_veh_h: 1.0,
            delay_veh_h: 0.5,
            total_demand_vph: 10.0,
            avg_travel_min: 6.0,
            avg_delay_min: 3.0,
        };
        let s = Scenario::ScaleDemand { factor: 1.0 };
        let stats = AonStats { assigned: 4, missing_endpoint: 2, unreachable: 3, trivial: 1 };
        let c = ScenarioComparison::new("A", &s, &k, &k).with_aon_stats(&stats);
        assert_eq!((c.unreachable_od, c.missing_endpoint_od), (3, 2));
        assert!(!ScenarioComparison::new("B", &s, &k, &k).has_stranded_demand());
    }

    #[test]
    fn evaluation_never_mutates_base() {
        let e = engine();
        let before = (e.base().edge_key.clone(), e.base().edge_capacity_vph.clone());
        let closure = Scenario::Closure { edge: e.baseline_bottlenecks(1).unwrap()[0].edge };
        e.evaluate("C", &closure).unwrap();
        e.evaluate("K", &Scenario::ScaleDemand { factor: 0.5 }).unwrap();
        assert_eq!(before, (e.base().edge_key.clone(), e.base().edge_capacity_vph.clone()));
        assert!(e.base().edge_flow_vph.iter().all(|&f| f == 0.0));
    }

    #[test]
    fn zero_baseline_delay_gives_zero_percent() {
        let zero = SystemKpis {
            tstt_veh_h: 1.0,
            delay_veh_h: 0.0,
            total_demand_vph: 10.0,
            avg_travel_min: 6.0,
            avg_delay_min: 0.0,
        };
        let worse = SystemKpis { delay_veh_h: 2.0, ..zero };
        let s = Scenario::ScaleDemand { factor: 2.0 };
        let c = ScenarioComparison::new("Z", &s, &zero, &worse);
        assert_eq!(c.delay_improvement_pct, 0.0);
        assert_eq!(c.delta_delay_veh_h, 2.0);
    }
}

// ── Sweeps ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod sweep {
    use ta_assign::AssignParams;
    use ta_core::{BprParams, EdgeKey, NodeId, ProposerParams, ScenarioConfig};

    use super::fixtures::{heavy_od, u_network};
    use crate::{
        bottleneck_bypass_sweep, catalogue_from_config, demand_reduction_sweep, rank_by_improvement,
        run_catalogue, ItemOutcome, Scenario, ScenarioEngine,
    };

    fn engine() -> ScenarioEngine {
        let params = AssignParams::new(15, BprParams::default(), None).unwrap();
        ScenarioEngine::new(u_network(), heavy_od(), params)
    }

    #[test]
    fn default_catalogue_shape() {
        let e = engine();
        let bottlenecks = e.baseline_bottlenecks(3).unwrap();
        let cfg = ScenarioConfig { cap_top_k: 2, ..ScenarioConfig::default() };
        let cat = catalogue_from_config(e.base(), &bottlenecks, &cfg);
        let ids: Vec<&str> = cat.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["CAP01", "CAP02", "CLOSE01", "CONN01"]);
        match &cat[3].scenario {
            Scenario::AddConnector { spec, two_way } => {
                assert_eq!((spec.a, spec.b), (NodeId(1), NodeId(6)));
                assert!(*two_way);
            }
            other => panic!("unexpected {other:?}"),
        }

        let none = ScenarioConfig { cap_top_k: 0, do_closure: false, do_connector: false, ..cfg };
        assert!(catalogue_from_config(e.base(), &bottlenecks, &none).is_empty());
    }

    #[test]
    fn catalogue_results_keep_order() {
        let e = engine();
        let bottlenecks = e.baseline_bottlenecks(3).unwrap();
        let cat = catalogue_from_config(e.base(), &bottlenecks, &ScenarioConfig::default());
        let out = run_catalogue(&e, &cat).unwrap();
        assert_eq!(out.len(), cat.len());
        for (o, entry) in out.iter().zip(&cat) {
            assert_eq!(o.done().unwrap().scenario_id, entry.id);
        }
    }

    #[test]
    fn ranked_catalogue_puts_best_first() {
        let e = engine();
        let bottlenecks = e.baseline_bottlenecks(3).unwrap();
        let cat = catalogue_from_config(e.base(), &bottlenecks, &ScenarioConfig::default());
        let mut done: Vec<_> =
            run_catalogue(&e, &cat).unwrap().iter().filter_map(ItemOutcome::done).cloned().collect();
        rank_by_improvement(&mut done);
        assert_eq!(done.len(), cat.len());
        for w in done.windows(2) {
            assert!(w[0].delay_improvement_pct >= w[1].delay_improvement_pct);
        }
    }

    #[test]
    fn bypass_dedups_and_skips() {
        let e = engine();
        let mut bottlenecks = e.baseline_bottlenecks(1).unwrap();
        bottlenecks.push(bottlenecks[0]);
        let mut ghost = bottlenecks[0];
        ghost.edge = EdgeKey::new(NodeId(90), NodeId(91), 0);
        bottlenecks.push(ghost);

        let out = bottleneck_bypass_sweep(&e, &bottlenecks, 10, &ProposerParams::default()).unwrap();
        assert_eq!(out.len(), 3);
        let first = out[0].done().unwrap();
        assert_eq!(first.bottleneck, bottlenecks[0].edge);
        assert!(first.a_pos.lat.is_finite());
        assert!(matches!(&out[1], ItemOutcome::Skipped { reason, .. } if reason.contains("duplicate")));
        assert!(matches!(&out[2], ItemOutcome::Skipped { .. }));
    }

    #[test]
    fn demand_reduction_reduces_delay() {
        let e = engine();
        let sweep = demand_reduction_sweep(&e, &[0.1, 0.5, 1.5], 1.0, 1e9).unwrap();
        assert_eq!(sweep.points.len(), 3);
        let p10 = sweep.points[0].done().unwrap();
        let p50 = sweep.points[1].done().unwrap();
        assert!(p50.kpis.delay_veh_h < p10.kpis.delay_veh_h);
        assert!(p10.delta_delay_veh_h < 0.0);
        assert!(p10.delta_avg_delay_min < 0.0);
        assert!((p50.total_demand_vph - 750.0).abs() < 1e-9);
        assert!(matches!(sweep.points[2], ItemOutcome::Skipped { .. }));
        assert_eq!(sweep.first_meeting_target, Some(0.1));

        let strict = demand_reduction_sweep(&e, &[0.1], 1.0, -1.0).unwrap();
        assert_eq!(strict.first_meeting_target, None);
    }
}
