//! `ta-output`: result table writers.
//!
//! | Table              | Row type          | Source                                |
//! |--------------------|-------------------|---------------------------------------|
//! | `od`               | [`OdRow`]         | `ta_demand::OdPair`                   |
//! | `bottlenecks`      | [`BottleneckRow`] | `ta_assign::top_bottlenecks`          |
//! | `kpis`             | [`KpiRow`]        | `ta_assign::SystemKpis`               |
//! | `scenarios`        | [`ScenarioRow`]   | `ta_scenario::ScenarioComparison`     |
//! | `connectors`       | [`ConnectorRow`]  | `ta_scenario::BypassResult`           |
//! | `demand_reduction` | [`ReductionRow`]  | `ta_scenario::ReductionPoint`         |
//!
//! Backends implement [`OutputWriter`]; [`CsvWriter`] writes one CSV file per
//! table.
//!
//! # Usage
//!
//! ```rust,ignore
//! use ta_output::{CsvWriter, KpiRow, OutputWriter};
//!
//! let mut w = CsvWriter::new(Path::new("./results"))?;
//! w.write_kpis(&[KpiRow::new("baseline", &baseline.kpis)])?;
//! w.finish()?;
//! ```

pub mod csv;
pub mod error;
pub mod row;
pub mod writer;


pub use csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use row::{BottleneckRow, ConnectorRow, KpiRow, OdRow, ReductionRow, ScenarioRow, Table};
pub use writer::OutputWriter;
