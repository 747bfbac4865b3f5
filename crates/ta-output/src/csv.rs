//! CSV output backend.
//!
//! Creates one file per table in the configured output directory:
//! `od.csv`, `bottlenecks.csv`, `kpis.csv`, `scenarios.csv`,
//! `connectors.csv`, `demand_reduction.csv`.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use csv::{Writer, WriterBuilder};
use log::info;

use crate::row::Table;
use crate::writer::OutputWriter;
use crate::{
    BottleneckRow, ConnectorRow, KpiRow, OdRow, OutputError, OutputResult, ReductionRow,
    ScenarioRow,
};

/// One open table: headers are written up front, so a table with no rows
/// is still a valid CSV file.
struct TableFile {
    inner: Writer<File>,
}

impl TableFile {
    fn create<T: Table>(dir: &Path) -> OutputResult<Self> {
        let mut inner = WriterBuilder::new()
            .has_headers(false)
            .from_path(dir.join(format!("{}.csv", T::NAME)))?;
        inner.write_record(T::HEADERS)?;
        Ok(Self { inner })
    }

    fn append<T: Table>(&mut self, rows: &[T]) -> OutputResult<()> {
        for row in rows {
            self.inner.serialize(row)?;
        }
        Ok(())
    }
}

/// Writes result tables to CSV files.
pub struct CsvWriter {
    dir:         PathBuf,
    od:          TableFile,
    bottlenecks: TableFile,
    kpis:        TableFile,
    scenarios:   TableFile,
    connectors:  TableFile,
    reductions:  TableFile,
    finished:    bool,
}

impl CsvWriter {
    /// Create `dir` if needed, open every table file in it and write the
    /// header rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir:         dir.to_path_buf(),
            od:          TableFile::create::<OdRow>(dir)?,
            bottlenecks: TableFile::create::<BottleneckRow>(dir)?,
            kpis:        TableFile::create::<KpiRow>(dir)?,
            scenarios:   TableFile::create::<ScenarioRow>(dir)?,
            connectors:  TableFile::create::<ConnectorRow>(dir)?,
            reductions:  TableFile::create::<ReductionRow>(dir)?,
            finished:    false,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn open(&mut self) -> OutputResult<&mut Self> {
        if self.finished {
            return Err(OutputError::Finished);
        }
        Ok(self)
    }
}

impl OutputWriter for CsvWriter {
    fn write_od(&mut self, rows: &[OdRow]) -> OutputResult<()> {
        self.open()?.od.append(rows)
    }

    fn write_bottlenecks(&mut self, rows: &[BottleneckRow]) -> OutputResult<()> {
        self.open()?.bottlenecks.append(rows)
    }

    fn write_kpis(&mut self, rows: &[KpiRow]) -> OutputResult<()> {
        self.open()?.kpis.append(rows)
    }

    fn write_scenarios(&mut self, rows: &[ScenarioRow]) -> OutputResult<()> {
        self.open()?.scenarios.append(rows)
    }

    fn write_connectors(&mut self, rows: &[ConnectorRow]) -> OutputResult<()> {
        self.open()?.connectors.append(rows)
    }

    fn write_reductions(&mut self, rows: &[ReductionRow]) -> OutputResult<()> {
        self.open()?.reductions.append(rows)
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        for t in [
            &mut self.od,
            &mut self.bottlenecks,
            &mut self.kpis,
            &mut self.scenarios,
            &mut self.connectors,
            &mut self.reductions,
        ] {
            t.inner.flush()?;
        }
        info!("results written to {}", self.dir.display());
        Ok(())
    }
}
