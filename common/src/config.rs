use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    error::{ReportError, Result},
    group::{GroupKey, SeriesOrder},
    plot::LegendPlacement,
};

pub const DEFAULT_DATA_FILE: &str = "data/benchmark_data.csv";
pub const DEFAULT_OUTPUT_DIR: &str = "data/plots";
pub const DEFAULT_FILE_NAME: &str = "speedup_C{clusters}_T{threads}.png";

/// Largest accepted subplot width or figure height, in pixels
pub const MAX_DIMENSION: u32 = 16_384;

const CLUSTERS_PLACEHOLDER: &str = "{clusters}";
const THREADS_PLACEHOLDER: &str = "{threads}";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data_file: PathBuf,
    pub output_dir: PathBuf,
    /// Output file name, `{clusters}` and `{threads}` are substituted
    pub file_name: String,
    pub legend: LegendPlacement,
    pub series_order: SeriesOrder,
    /// Width in pixels of each kernel size subplot
    pub panel_width: u32,
    pub height: u32,
    pub x_label: String,
    pub y_label: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            file_name: DEFAULT_FILE_NAME.to_owned(),
            legend: LegendPlacement::default(),
            series_order: SeriesOrder::default(),
            panel_width: 600,
            height: 500,
            x_label: "Pixel Count".to_owned(),
            y_label: "Speedup (vs Serial)".to_owned(),
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| ReportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Settings =
            serde_yml::from_str(&contents).map_err(|source| ReportError::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        for placeholder in [CLUSTERS_PLACEHOLDER, THREADS_PLACEHOLDER] {
            if !self.file_name.contains(placeholder) {
                return Err(ReportError::Config(format!(
                    "file_name `{}` must contain {placeholder}",
                    self.file_name
                )));
            }
        }
        let valid = 1..=MAX_DIMENSION;
        if !valid.contains(&self.panel_width) || !valid.contains(&self.height) {
            return Err(ReportError::Config(format!(
                "plot size must be between 1 and {MAX_DIMENSION}, got {}x{}",
                self.panel_width, self.height
            )));
        }
        Ok(())
    }

    pub fn file_name_for(&self, key: &GroupKey) -> String {
        self.file_name
            .replace(CLUSTERS_PLACEHOLDER, &key.clusters.to_string())
            .replace(THREADS_PLACEHOLDER, &key.threads.to_string())
    }

    pub fn output_path_for(&self, key: &GroupKey) -> PathBuf {
        self.output_dir.join(self.file_name_for(key))
    }
}
