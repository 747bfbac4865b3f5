//! The `OutputWriter` trait implemented by backend writers.

use crate::{BottleneckRow, ConnectorRow, KpiRow, OdRow, OutputResult, ReductionRow, ScenarioRow};

/// One method per result table.  Every method may be called any number of
/// times; rows are appended.
pub trait OutputWriter {
    fn write_od(&mut self, rows: &[OdRow]) -> OutputResult<()>;

    fn write_bottlenecks(&mut self, rows: &[BottleneckRow]) -> OutputResult<()>;

    fn write_kpis(&mut self, rows: &[KpiRow]) -> OutputResult<()>;

    fn write_scenarios(&mut self, rows: &[ScenarioRow]) -> OutputResult<()>;

    fn write_connectors(&mut self, rows: &[ConnectorRow]) -> OutputResult<()>;

    fn write_reductions(&mut self, rows: &[ReductionRow]) -> OutputResult<()>;

    /// Flush and close all underlying file handles.
    ///
    /// Idempotent; safe to call more than once.
    fn finish(&mut self) -> OutputResult<()>;
}
