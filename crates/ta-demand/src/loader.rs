//! CSV OD loader.
//!
//! # CSV format
//!
//! ```csv
//! origin,destination,demand_vph
//! 1,3,2000
//! 4,7,125.5
//! ```
//!
//! Demands must be finite and positive.  Endpoints are not checked
//! against any network here; assignment counts and skips unknown ones.

use std::io::Read;
use std::path::Path;

use log::info;

use crate::{DemandError, DemandResult, OdPair};

/// Load an OD list from a CSV file.
pub fn load_od_csv(path: &Path) -> DemandResult<Vec<OdPair>> {
    let file = std::fs::File::open(path)?;
    let od = load_od_reader(file)?;
    info!("loaded {} OD pairs from {}", od.len(), path.display());
    Ok(od)
}

/// Like [`load_od_csv`] but accepts any `Read` source.
pub fn load_od_reader<R: Read>(reader: R) -> DemandResult<Vec<OdPair>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut out = Vec::new();
    for result in csv_reader.deserialize::<OdPair>() {
        let row = result.map_err(|e| DemandError::Parse(e.to_string()))?;
        if !row.demand_vph.is_finite() || row.demand_vph <= 0.0 {
            return Err(DemandError::Parse(format!(
                "OD {} -> {}: demand must be finite and > 0, got {}",
                row.origin, row.destination, row.demand_vph
            )));
        }
        out.push(row);
    }
    Ok(out)
}
