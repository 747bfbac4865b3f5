//! island: static traffic assignment and what-if scenarios on a road
//! network.
//!
//! Loads a network (CSV, or the built-in synthetic island), loads or
//! generates OD demand, solves the baseline equilibrium and runs one of the
//! experiment sweeps.  Every run writes the OD list, baseline KPIs and the
//! bottleneck table; sweeps add their own tables.
//!
//! ```text
//! island baseline
//! island --nodes nodes.csv --edges edges.csv --od od.csv scenarios
//! RUST_LOG=debug island --config model.json bypass --top-n 5
//! ```

mod network;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use ta_assign::AssignParams;
use ta_core::ModelConfig;
use ta_demand::{generate_from_config, load_od_csv, total_demand};
use ta_network::{load_network_csv, RoadNetwork};
use ta_output::{
    BottleneckRow, ConnectorRow, CsvWriter, KpiRow, OdRow, OutputWriter, ReductionRow, ScenarioRow,
};
use ta_scenario::{
    bottleneck_bypass_sweep, catalogue_from_config, demand_reduction_sweep, rank_by_improvement,
    run_catalogue, shortest_path_relief_connectors, ItemOutcome, Scenario, ScenarioEngine,
};

use network::build_island;

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "island")]
#[command(about = "Static traffic assignment and what-if scenarios", long_about = None)]
struct Cli {
    /// Model configuration (JSON).  Defaults apply to missing fields.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Node CSV (`node_id,lat,lon`).  Without it the synthetic island is used.
    #[arg(long, global = true, requires = "edges")]
    nodes: Option<PathBuf>,

    /// Edge CSV (`from,to,key,length_m,maxspeed,lanes,highway,travel_time_s`).
    #[arg(long, global = true, requires = "nodes")]
    edges: Option<PathBuf>,

    /// OD CSV (`origin,destination,demand_vph`).  Without it demand is
    /// generated from the config.
    #[arg(long, global = true)]
    od: Option<PathBuf>,

    /// Output directory.
    #[arg(short, long, global = true, default_value = "output/island")]
    out: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Solve the baseline only.
    Baseline,
    /// Evaluate the default scenario catalogue.
    Scenarios,
    /// Propose and evaluate one connector near each top bottleneck.
    Bypass {
        /// Overrides `bypass.top_n_bottlenecks`.
        #[arg(long)]
        top_n: Option<usize>,
    },
    /// Rank and evaluate demand-driven relief connectors around one
    /// bottleneck.
    Relief {
        /// 1-based bottleneck rank.
        #[arg(long, default_value_t = 1)]
        rank: usize,
    },
    /// Sweep demand reductions until the average delay target is met.
    DemandReduction {
        /// Overrides `reduction.target_avg_delay_min`.
        #[arg(long)]
        target: Option<f64>,
    },
    /// Everything above, in order.
    All,
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let cfg = match &cli.config {
        Some(path) => ModelConfig::from_json_path(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => ModelConfig::default(),
    };
    cfg.validate().context("invalid configuration")?;

    let net = load_network(&cli, &cfg)?;
    let od = match &cli.od {
        Some(path) => load_od_csv(path).with_context(|| format!("reading OD {}", path.display()))?,
        None => generate_from_config(&net, &cfg.demand).context("generating OD demand")?,
    };
    info!("network: {} nodes, {} edges", net.node_count(), net.edge_count());
    info!("demand: {} OD pairs, {:.0} vph", od.len(), total_demand(&od));

    let mut out = CsvWriter::new(&cli.out)
        .with_context(|| format!("creating output directory {}", cli.out.display()))?;
    out.write_od(&od.iter().map(OdRow::from).collect::<Vec<_>>())?;

    let params = AssignParams::from_config(&cfg)?;
    let engine = ScenarioEngine::new(net, od, params)
        .with_connector_capacity_per_lane(cfg.network.default_capacity_per_lane);

    let t0 = Instant::now();
    let baseline = engine.baseline().context("solving baseline")?;
    out.write_kpis(&[KpiRow::new("baseline", &baseline.kpis)])?;
    let bottlenecks = engine.baseline_bottlenecks(cfg.baseline_top_n_bottlenecks)?;
    out.write_bottlenecks(&BottleneckRow::ranked(&bottlenecks))?;

    println!("Baseline ({} MSA iterations)", baseline.solved.report.iterations_run);
    println!("  TSTT          : {:>10.2} veh-h/h", baseline.kpis.tstt_veh_h);
    println!("  Delay         : {:>10.2} veh-h/h", baseline.kpis.delay_veh_h);
    println!("  Avg delay     : {:>10.2} min/veh", baseline.kpis.avg_delay_min);
    if let Some(top) = bottlenecks.first() {
        println!("  Top bottleneck: {} (v/c {:.2})", top.edge, top.v_c);
    }
    println!();

    let all = matches!(cli.command, Command::All);

    if all || matches!(cli.command, Command::Scenarios) {
        let catalogue = catalogue_from_config(engine.base(), &bottlenecks, &cfg.scenarios);
        let results = run_catalogue(&engine, &catalogue)?;
        let mut done: Vec<_> = results.iter().filter_map(ItemOutcome::done).cloned().collect();
        rank_by_improvement(&mut done);
        let rows: Vec<ScenarioRow> = done.iter().map(ScenarioRow::from).collect();
        print_scenarios("Scenario catalogue", &rows);
        out.write_scenarios(&rows)?;
    }

    if all || matches!(cli.command, Command::Bypass { .. }) {
        let top_n = match cli.command {
            Command::Bypass { top_n: Some(n) } => n,
            _ => cfg.bypass.top_n_bottlenecks,
        };
        let results = bottleneck_bypass_sweep(&engine, &bottlenecks, top_n, &cfg.proposer)?;
        let done: Vec<_> = results.iter().filter_map(ItemOutcome::done).collect();
        let rows: Vec<ScenarioRow> = done.iter().map(|r| ScenarioRow::from(&r.comparison)).collect();
        print_scenarios("Bottleneck bypass connectors", &rows);
        out.write_scenarios(&rows)?;
        out.write_connectors(&done.iter().map(|&r| ConnectorRow::from(r)).collect::<Vec<_>>())?;
    }

    if all || matches!(cli.command, Command::Relief { .. }) {
        let rank = match cli.command {
            Command::Relief { rank } => rank,
            _ => 1,
        };
        let rows = relief(&engine, &bottlenecks, rank, &cfg)?;
        print_scenarios("Relief connectors", &rows);
        out.write_scenarios(&rows)?;
    }

    if all || matches!(cli.command, Command::DemandReduction { .. }) {
        let target = match cli.command {
            Command::DemandReduction { target: Some(t) } => t,
            _ => cfg.reduction.target_avg_delay_min,
        };
        let sweep = demand_reduction_sweep(&engine, &cfg.reduction.reductions, cfg.demand.od_factor, target)?;
        let rows: Vec<ReductionRow> = sweep.points.iter().filter_map(ItemOutcome::done).map(ReductionRow::from).collect();
        out.write_kpis(&[KpiRow::new("reduction_reference", &sweep.reference)])?;
        out.write_reductions(&rows)?;

        println!("Demand reduction (target {target:.2} min/veh)");
        for r in &rows {
            println!("  -{:>4.0}%  delay {:>10.2} veh-h/h  {:>6.2} min/veh", r.reduction * 100.0, r.delay_veh_h, r.avg_delay_min);
        }
        match sweep.first_meeting_target {
            Some(r) => println!("  target met at -{:.0}%", r * 100.0),
            None => println!("  target not met"),
        }
        println!();
    }

    out.finish()?;
    println!("Done in {:.3} s; results in {}", t0.elapsed().as_secs_f64(), cli.out.display());
    Ok(())
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn load_network(cli: &Cli, cfg: &ModelConfig) -> Result<RoadNetwork> {
    match (&cli.nodes, &cli.edges) {
        (Some(nodes), Some(edges)) => load_network_csv(nodes, edges, &cfg.network)
            .with_context(|| format!("loading network {} / {}", nodes.display(), edges.display())),
        _ => build_island(&cfg.network).context("building synthetic island"),
    }
}

/// Evaluate the relief connectors ranked around the `rank`-th bottleneck.
fn relief(
    engine: &ScenarioEngine,
    bottlenecks: &[ta_assign::Bottleneck],
    rank: usize,
    cfg: &ModelConfig,
) -> Result<Vec<ScenarioRow>> {
    let Some(b) = rank.checked_sub(1).and_then(|i| bottlenecks.get(i)) else {
        anyhow::bail!("no bottleneck at rank {rank} ({} available)", bottlenecks.len());
    };
    let solved = &engine.baseline()?.solved.network;
    let label = format!("B{rank:02}");
    let candidates = shortest_path_relief_connectors(solved, engine.od(), b.edge, &label, &cfg.proposer);
    info!("{} relief candidates around {}", candidates.len(), b.edge);

    let mut rows = Vec::with_capacity(candidates.len());
    for (i, c) in candidates.iter().enumerate() {
        let id = format!("RELIEF{:02}", i + 1);
        let scenario = Scenario::AddConnector { spec: c.spec.clone(), two_way: true };
        let outcome = engine.evaluate(&id, &scenario).with_context(|| format!("evaluating {id}"))?;
        rows.push(ScenarioRow::from(&outcome.comparison));
    }
    Ok(rows)
}

fn print_scenarios(title: &str, rows: &[ScenarioRow]) {
    println!("{title}");
    println!("{:<10} {:>12} {:>9} {:>9}  {}", "Id", "Δdelay veh-h", "Improve", "Stranded", "Name");
    println!("{}", "-".repeat(72));
    for r in rows {
        println!(
            "{:<10} {:>12.2} {:>8.1}% {:>9}  {}",
            r.scenario_id,
            r.delta_delay_veh_h,
            r.delay_improvement_pct,
            r.unreachable_od + r.missing_endpoint_od,
            r.name
        );
    }
    println!();
}
