use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::{
    config::Settings,
    error::Result,
    group::build_groups,
    plot::{ChartSpec, Renderer, ensure_dirs},
    record::{load, unpivot},
};

/// Loads the benchmark table and writes one chart per (clusters, threads)
/// pair found in it.
///
/// The input is checked before anything touches the output directory. The
/// first failing group aborts the run, files written before it are kept.
/// Returns the written paths in the order the groups were discovered.
pub fn build_report<R: Renderer + ?Sized>(settings: &Settings, renderer: &R) -> Result<Vec<PathBuf>> {
    settings.validate()?;
    let rows = load(&settings.data_file)?;
    let points = unpivot(&rows);
    debug!("Unpivoted {} rows into {} points", rows.len(), points.len());

    ensure_dirs(std::slice::from_ref(&settings.output_dir))?;

    let groups = build_groups(&points, settings.series_order);
    let mut written = Vec::with_capacity(groups.len());
    for group in &groups {
        if group.panels.is_empty() {
            warn!("No kernel sizes for {}, skipping", group.key);
            continue;
        }
        let chart = ChartSpec::new(group, settings)?;
        let path = settings.output_path_for(&group.key);
        renderer.render(&chart, &path)?;
        println!("Saved plot to {}", path.display());
        info!("Wrote {} panels for {}", group.panels.len(), group.key);
        written.push(path);
    }
    Ok(written)
}
