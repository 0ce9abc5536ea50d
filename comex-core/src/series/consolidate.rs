//! Dimension consolidation: per-series files → one bundle per flow.
//!
//! Ordering matters. Both bundles are fully written (temp file, then rename)
//! before any input is deleted, so an interrupted run leaves at worst some
//! stale per-series files for the next run to pick up.

use super::artifact::{read_artifact_as, write_frame_atomic, ArtifactError};
use crate::data::schema::ArtifactLayout;
use crate::domain::{FlowDirection, RunPeriod, ARTIFACT_EXTENSION};
use polars::prelude::*;
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// One written bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BundleInfo {
    pub path: PathBuf,
    /// Rows in the bundle.
    pub rows: usize,
    /// Per-series files that went into it.
    pub sources: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bundles {
    pub exports: BundleInfo,
    pub imports: BundleInfo,
    /// Files deleted after the bundles were written.
    pub pruned: usize,
}

impl Bundles {
    pub fn get(&self, flow: FlowDirection) -> &BundleInfo {
        match flow {
            FlowDirection::Export => &self.exports,
            FlowDirection::Import => &self.imports,
        }
    }
}

/// `{label}_{exports|imports}_{YYYY_MM}.ipv`
pub fn bundle_file_name(label: &str, flow: FlowDirection, period: RunPeriod) -> String {
    format!("{label}_{}_{period}.{ARTIFACT_EXTENSION}", flow.bundle_word())
}

/// Glob pattern for the per-series files of one flow: `???_EX_*.ipv` / `???_IM_*.ipv`.
pub fn series_file_pattern(flow: FlowDirection) -> String {
    format!("???_{}_*.{ARTIFACT_EXTENSION}", flow.short_code())
}

/// Consolidate every per-series artifact in `dimension_dir` into the two
/// bundles of `period`, then prune the inputs and older bundles.
pub fn consolidate(
    dimension_dir: &Path,
    label: &str,
    period: RunPeriod,
) -> Result<Bundles, ArtifactError> {
    let (exports, mut inputs) = write_bundle(dimension_dir, label, FlowDirection::Export, period)?;
    let (imports, import_inputs) =
        write_bundle(dimension_dir, label, FlowDirection::Import, period)?;
    inputs.extend(import_inputs);

    for flow in FlowDirection::ALL {
        let stale = format!("{label}_{}_*.{ARTIFACT_EXTENSION}", flow.bundle_word());
        inputs.extend(glob_files(dimension_dir, &stale)?);
    }

    let pruned = prune(&inputs, &[exports.path.as_path(), imports.path.as_path()])?;
    info!(dir = %dimension_dir.display(), pruned, "dimension consolidated");

    Ok(Bundles {
        exports,
        imports,
        pruned,
    })
}

/// Concatenate the per-series files of one flow and write its bundle.
/// Returns the bundle and the files it was built from. With no series files
/// an existing bundle of the same period is left untouched.
fn write_bundle(
    dimension_dir: &Path,
    label: &str,
    flow: FlowDirection,
    period: RunPeriod,
) -> Result<(BundleInfo, Vec<PathBuf>), ArtifactError> {
    let files = glob_files(dimension_dir, &series_file_pattern(flow))?;
    let layout = ArtifactLayout::new(flow);
    let path = dimension_dir.join(bundle_file_name(label, flow, period));

    if files.is_empty() && path.is_file() {
        let kept = read_artifact_as(&path, layout)?;
        info!(
            path = %path.display(),
            rows = kept.height(),
            "no series files, keeping current bundle"
        );
        let info = BundleInfo {
            path,
            rows: kept.height(),
            sources: 0,
        };
        return Ok((info, files));
    }

    let mut bundle = concat_files(&files, layout)?;
    write_frame_atomic(&path, &mut bundle)?;
    info!(
        path = %path.display(),
        rows = bundle.height(),
        sources = files.len(),
        "bundle written"
    );

    let info = BundleInfo {
        path,
        rows: bundle.height(),
        sources: files.len(),
    };
    Ok((info, files))
}

fn glob_files(dir: &Path, file_pattern: &str) -> Result<Vec<PathBuf>, ArtifactError> {
    let dir_str = dir
        .to_str()
        .ok_or_else(|| ArtifactError::NonUtf8Path(dir.to_path_buf()))?;
    let pattern = Path::new(&glob::Pattern::escape(dir_str)).join(file_pattern);
    let pattern = pattern
        .to_str()
        .ok_or_else(|| ArtifactError::NonUtf8Path(pattern.clone()))?;

    let mut files: Vec<PathBuf> = glob::glob(pattern)?
        .filter_map(Result::ok)
        .filter(|p| p.is_file())
        .collect();
    files.sort();
    Ok(files)
}

/// Row-wise union of `files`; zero files give a zero-row table with the
/// layout's schema.
fn concat_files(files: &[PathBuf], layout: ArtifactLayout) -> Result<DataFrame, ArtifactError> {
    let mut acc = DataFrame::empty_with_schema(&layout.schema());
    for file in files {
        let df = read_artifact_as(file, layout)?;
        acc.vstack_mut(&df)?;
    }
    Ok(acc)
}

/// Delete `targets` except `keep`. A target that is already gone is only a
/// warning: the file being absent is the state we want.
fn prune(targets: &[PathBuf], keep: &[&Path]) -> Result<usize, ArtifactError> {
    let mut removed = 0;
    let mut seen: Vec<&Path> = Vec::with_capacity(targets.len());
    for target in targets {
        if keep.contains(&target.as_path()) || seen.contains(&target.as_path()) {
            continue;
        }
        seen.push(target.as_path());
        match fs::remove_file(target) {
            Ok(()) => removed += 1,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(path = %target.display(), "file already removed");
            }
            Err(source) => {
                return Err(ArtifactError::Io {
                    path: target.clone(),
                    source,
                })
            }
        }
    }
    Ok(removed)
}
