//! World aggregate rows for country bundles.
//!
//! For every (date, commodity, flow) the per-country measures are summed into
//! one row coded `COMEX:{commodity}_{flow}_WO_BR`. World rows already present
//! are dropped first, so running this twice on a bundle gives the same file.

use super::artifact::{read_artifact, write_frame_atomic, ArtifactError, ArtifactTable};
use crate::data::schema::{ARTIFACT_CODE, ARTIFACT_DATE};
use crate::domain::{FlowDirection, SeriesCode, SeriesCodeError};
use polars::prelude::*;
use serde::Serialize;
use std::path::Path;
use tracing::info;

const COMMODITY_KEY: &str = "__commodity";
const FLOW_KEY: &str = "__flow";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WorldSummary {
    /// Per-country rows kept in the bundle.
    pub country_rows: usize,
    /// World rows appended.
    pub world_rows: usize,
    /// World rows from an earlier pass that were recomputed.
    pub replaced_rows: usize,
}

/// Append world aggregate rows to the bundle at `bundle_path` and rewrite it.
pub fn synthesize_world(bundle_path: &Path) -> Result<WorldSummary, ArtifactError> {
    let ArtifactTable { layout, frame } = read_artifact(bundle_path)?;
    let code_err = |source: SeriesCodeError| ArtifactError::Code {
        path: bundle_path.to_path_buf(),
        source,
    };

    let height = frame.height();
    let mut keep = Vec::with_capacity(height);
    let mut commodities = Vec::with_capacity(height);
    let mut flows = Vec::with_capacity(height);
    for (row, raw) in frame.column(ARTIFACT_CODE)?.str()?.into_iter().enumerate() {
        let raw = raw.ok_or_else(|| ArtifactError::MissingCode {
            path: bundle_path.to_path_buf(),
            row,
        })?;
        let code: SeriesCode = raw.parse().map_err(code_err)?;
        keep.push(!code.is_world());
        flows.push(code.flow.short_code());
        commodities.push(code.commodity);
    }
    let replaced_rows = keep.iter().filter(|k| !**k).count();

    let mut tagged = frame;
    tagged.with_column(Series::new(COMMODITY_KEY.into(), commodities))?;
    tagged.with_column(Series::new(FLOW_KEY.into(), flows))?;
    let countries = tagged.filter(&BooleanChunked::from_slice("keep".into(), &keep))?;

    let sums: Vec<Expr> = layout
        .flow
        .measures()
        .iter()
        .map(|m| col(m.artifact_column()).sum())
        .collect();
    let mut world = countries
        .clone()
        .lazy()
        .group_by_stable([col(ARTIFACT_DATE), col(COMMODITY_KEY), col(FLOW_KEY)])
        .agg(sums)
        .sort(
            [ARTIFACT_DATE, COMMODITY_KEY, FLOW_KEY],
            SortMultipleOptions::default(),
        )
        .collect()?;

    let world_codes = {
        let commodity = world.column(COMMODITY_KEY)?.str()?;
        let flow = world.column(FLOW_KEY)?.str()?;
        commodity
            .into_iter()
            .zip(flow.into_iter())
            .map(|(c, f)| {
                let f = f.unwrap_or_default();
                let flow = f.parse::<FlowDirection>().map_err(|source| {
                    code_err(SeriesCodeError::Flow {
                        code: f.to_string(),
                        source,
                    })
                })?;
                Ok(SeriesCode::world(c.unwrap_or_default(), flow).to_string())
            })
            .collect::<Result<Vec<String>, ArtifactError>>()?
    };
    world.with_column(Series::new(ARTIFACT_CODE.into(), world_codes))?;

    let columns = layout.columns();
    let world = world.select(columns.iter().copied())?;
    let mut combined = countries.select(columns.iter().copied())?;
    combined.vstack_mut(&world)?;

    write_frame_atomic(bundle_path, &mut combined)?;

    let summary = WorldSummary {
        country_rows: countries.height(),
        world_rows: world.height(),
        replaced_rows,
    };
    info!(
        path = %bundle_path.display(),
        world_rows = summary.world_rows,
        replaced = summary.replaced_rows,
        "world rows synthesized"
    );
    Ok(summary)
}
