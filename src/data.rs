//! Data Loading and Management
//!
//! Loads the two reference tables behind the dashboard using Polars:
//! - `crop_production.csv`: which crops each state/district grew, per season
//! - `data_core.csv`: soil/climate readings labelled with the crop grown
//!
//! Both tables are read once at startup, converted to typed records and
//! never mutated afterwards.

use polars::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::error::DataError;

pub const PRODUCTION_FILE: &str = "crop_production.csv";
pub const SOIL_FILE: &str = "data_core.csv";

/// One row of the regional production history
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductionRecord {
    pub state: String,
    pub district: String,
    pub season: String,
    pub crop: String,
}

/// One labelled row of the soil/climate training table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingExample {
    pub nitrogen: f64,
    pub phosphorous: f64,
    pub potassium: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub moisture: f64,
    pub soil_type: String,
    pub crop_type: String,
}

/// Regional crop production history
#[derive(Debug, Clone, Default)]
pub struct ProductionHistory {
    pub records: Vec<ProductionRecord>,
}

impl ProductionHistory {
    const TABLE: &'static str = "crop production history";

    /// Load from CSV with columns State_Name, District_Name, Season, Crop
    ///
    /// Rows with a null in any of the four columns are dropped; values are
    /// trimmed (the public dataset pads seasons with trailing spaces).
    pub fn load(path: &Path) -> Result<Self, DataError> {
        let df = read_csv(path)?;
        let history = Self::from_dataframe(&df)?;
        tracing::info!(
            "Loaded {} production records from {}",
            history.records.len(),
            path.display()
        );
        Ok(history)
    }

    pub fn from_dataframe(df: &DataFrame) -> Result<Self, DataError> {
        let states = string_column(df, Self::TABLE, "State_Name")?;
        let districts = string_column(df, Self::TABLE, "District_Name")?;
        let seasons = string_column(df, Self::TABLE, "Season")?;
        let crops = string_column(df, Self::TABLE, "Crop")?;

        let mut records = Vec::with_capacity(df.height());
        for idx in 0..df.height() {
            if let (Some(state), Some(district), Some(season), Some(crop)) = (
                states.get(idx),
                districts.get(idx),
                seasons.get(idx),
                crops.get(idx),
            ) {
                records.push(ProductionRecord {
                    state: state.trim().to_string(),
                    district: district.trim().to_string(),
                    season: season.trim().to_string(),
                    crop: crop.trim().to_string(),
                });
            }
        }

        if records.is_empty() {
            return Err(DataError::Empty { table: Self::TABLE });
        }

        Ok(Self { records })
    }
}

/// Soil/climate training examples
#[derive(Debug, Clone, Default)]
pub struct SoilDataset {
    pub examples: Vec<TrainingExample>,
}

impl SoilDataset {
    const TABLE: &'static str = "soil dataset";

    /// Load from CSV with columns Nitrogen, Phosphorous, Potassium,
    /// Temparature (sic), Humidity, Moisture, Soil Type, Crop Type
    ///
    /// Integer-typed numeric columns are cast to f64.
    pub fn load(path: &Path) -> Result<Self, DataError> {
        let df = read_csv(path)?;
        let dataset = Self::from_dataframe(&df)?;
        tracing::info!(
            "Loaded {} soil training examples from {}",
            dataset.examples.len(),
            path.display()
        );
        Ok(dataset)
    }

    pub fn from_dataframe(df: &DataFrame) -> Result<Self, DataError> {
        let nitrogen = float_column(df, Self::TABLE, "Nitrogen")?;
        let phosphorous = float_column(df, Self::TABLE, "Phosphorous")?;
        let potassium = float_column(df, Self::TABLE, "Potassium")?;
        let temperature = float_column(df, Self::TABLE, "Temparature")?;
        let humidity = float_column(df, Self::TABLE, "Humidity")?;
        let moisture = float_column(df, Self::TABLE, "Moisture")?;
        let soil_types = string_column(df, Self::TABLE, "Soil Type")?;
        let crop_types = string_column(df, Self::TABLE, "Crop Type")?;

        let mut examples = Vec::with_capacity(df.height());
        for idx in 0..df.height() {
            let row = (
                nitrogen.get(idx),
                phosphorous.get(idx),
                potassium.get(idx),
                temperature.get(idx),
                humidity.get(idx),
                moisture.get(idx),
                soil_types.get(idx),
                crop_types.get(idx),
            );
            // Incomplete rows cannot be used for fitting
            if let (Some(n), Some(p), Some(k), Some(t), Some(h), Some(m), Some(soil), Some(crop)) = row {
                examples.push(TrainingExample {
                    nitrogen: n,
                    phosphorous: p,
                    potassium: k,
                    temperature: t,
                    humidity: h,
                    moisture: m,
                    soil_type: soil.trim().to_string(),
                    crop_type: crop.trim().to_string(),
                });
            }
        }

        if examples.is_empty() {
            return Err(DataError::Empty { table: Self::TABLE });
        }

        Ok(Self { examples })
    }
}

/// Both reference tables, each loaded independently
///
/// A missing production file must not hide the soil model (and vice versa),
/// so each table keeps its own load result.
pub struct ReferenceData {
    pub production: Result<ProductionHistory, DataError>,
    pub soil: Result<SoilDataset, DataError>,
}

impl ReferenceData {
    pub fn load(data_dir: &Path) -> Self {
        let production = ProductionHistory::load(&data_dir.join(PRODUCTION_FILE));
        if let Err(e) = &production {
            tracing::warn!("Production history unavailable: {}", e);
        }

        let soil = SoilDataset::load(&data_dir.join(SOIL_FILE));
        if let Err(e) = &soil {
            tracing::warn!("Soil dataset unavailable: {}", e);
        }

        Self { production, soil }
    }
}

// ============================================================================
// Polars helpers
// ============================================================================

fn read_csv(path: &Path) -> Result<DataFrame, DataError> {
    if !path.exists() {
        return Err(DataError::Missing { path: PathBuf::from(path) });
    }

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    Ok(df)
}

fn string_column<'a>(
    df: &'a DataFrame,
    table: &'static str,
    name: &str,
) -> Result<&'a StringChunked, DataError> {
    df.column(name)
        .and_then(|c| c.str())
        .map_err(|_| DataError::Column { table, column: name.to_string() })
}

/// Numeric column as f64 regardless of whether Polars inferred ints or floats
fn float_column(
    df: &DataFrame,
    table: &'static str,
    name: &str,
) -> Result<Float64Chunked, DataError> {
    let column_error = || DataError::Column { table, column: name.to_string() };

    let casted = df
        .column(name)
        .map_err(|_| column_error())?
        .cast(&DataType::Float64)
        .map_err(|_| column_error())?;

    casted.f64().map(|ca| ca.clone()).map_err(|_| column_error())
}
