//! Region Selector
//!
//! Indexes the production history by state and district so that the
//! dashboard's cascading selects (state → district, season) and the
//! district-crop lookup are O(1) map reads instead of table scans.

use ahash::AHashSet;
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;

use crate::data::ProductionHistory;

/// Crops recorded for one state+district, with their seasons
#[derive(Debug, Default, Clone)]
struct DistrictEntry {
    /// Unique crops in first-appearance order
    crops: Vec<String>,
    /// (season, crop) pairs seen for this district
    seasonal: AHashSet<(String, String)>,
}

/// Immutable lookup structure built once from `ProductionHistory`
#[derive(Debug, Default, Clone)]
pub struct RegionIndex {
    states: Vec<String>,
    seasons: Vec<String>,
    districts_by_state: FxHashMap<String, Vec<String>>,
    districts: FxHashMap<(String, String), DistrictEntry>,
}

impl RegionIndex {
    pub fn build(history: &ProductionHistory) -> Self {
        let mut states = BTreeSet::new();
        let mut seasons = BTreeSet::new();
        let mut districts_by_state: FxHashMap<String, BTreeSet<String>> = FxHashMap::default();
        let mut districts: FxHashMap<(String, String), DistrictEntry> = FxHashMap::default();

        for record in &history.records {
            states.insert(record.state.clone());
            seasons.insert(record.season.clone());
            districts_by_state
                .entry(record.state.clone())
                .or_default()
                .insert(record.district.clone());

            let entry = districts
                .entry((record.state.clone(), record.district.clone()))
                .or_default();
            if !entry.crops.contains(&record.crop) {
                entry.crops.push(record.crop.clone());
            }
            entry
                .seasonal
                .insert((record.season.clone(), record.crop.clone()));
        }

        let index = Self {
            states: states.into_iter().collect(),
            seasons: seasons.into_iter().collect(),
            districts_by_state: districts_by_state
                .into_iter()
                .map(|(state, set)| (state, set.into_iter().collect()))
                .collect(),
            districts,
        };

        tracing::debug!(
            "Region index: {} states, {} districts, {} seasons",
            index.states.len(),
            index.districts.len(),
            index.seasons.len()
        );

        index
    }

    /// Sorted unique states
    pub fn states(&self) -> &[String] {
        &self.states
    }

    /// Sorted unique districts of `state`; empty for an unknown state
    pub fn districts(&self, state: &str) -> &[String] {
        self.districts_by_state
            .get(state)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Sorted unique seasons across the whole table
    pub fn seasons(&self) -> &[String] {
        &self.seasons
    }

    /// District-crop set: every crop recorded for state+district
    pub fn district_crops(&self, state: &str, district: &str) -> &[String] {
        self.districts
            .get(&(state.to_string(), district.to_string()))
            .map(|e| e.crops.as_slice())
            .unwrap_or(&[])
    }

    /// District crops recorded in `season`, in district-crop order
    pub fn seasonal_crops(&self, state: &str, district: &str, season: &str) -> Vec<String> {
        let Some(entry) = self.districts.get(&(state.to_string(), district.to_string())) else {
            return Vec::new();
        };

        entry
            .crops
            .iter()
            .filter(|crop| entry.seasonal.contains(&(season.to_string(), (*crop).clone())))
            .cloned()
            .collect()
    }

    pub fn contains_district(&self, state: &str, district: &str) -> bool {
        self.districts
            .contains_key(&(state.to_string(), district.to_string()))
    }
}
