//! Manifest of available rasters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use overlay_common::{OverlayError, OverlayResult};

/// `level (hPa) → file path`
pub type LevelMap = BTreeMap<u32, String>;
/// `step (h) → levels`
pub type StepMap = BTreeMap<u32, LevelMap>;
/// `run (HH) → steps`
pub type RunMap = BTreeMap<String, StepMap>;

/// One fully specified raster selection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selection {
    pub date: String,
    pub run: String,
    pub step: u32,
    pub level: u32,
}

impl Selection {
    pub fn new(date: impl Into<String>, run: impl Into<String>, step: u32, level: u32) -> Self {
        Self {
            date: date.into(),
            run: run.into(),
            step,
            level,
        }
    }

    /// Same selection at another forecast step.
    pub fn with_step(&self, step: u32) -> Self {
        Self {
            step,
            ..self.clone()
        }
    }
}

impl std::fmt::Display for Selection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}T{} +{}h {}hPa",
            self.date, self.run, self.step, self.level
        )
    }
}

/// Nested `date → run → step → level → path` mapping.
///
/// Paths are opaque to the manifest; callers resolve them against whatever
/// root the manifest was generated for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub generated_at: DateTime<Utc>,
    #[serde(default)]
    pub entries: BTreeMap<String, RunMap>,
}

impl Default for Manifest {
    fn default() -> Self {
        Self::new()
    }
}

impl Manifest {
    pub fn new() -> Self {
        Self {
            generated_at: Utc::now(),
            entries: BTreeMap::new(),
        }
    }

    /// Register a file. Returns the path previously stored for the same
    /// selection, if any.
    pub fn insert(&mut self, selection: &Selection, path: impl Into<String>) -> Option<String> {
        self.entries
            .entry(selection.date.clone())
            .or_default()
            .entry(selection.run.clone())
            .or_default()
            .entry(selection.step)
            .or_default()
            .insert(selection.level, path.into())
    }

    /// Path for a selection.
    ///
    /// A missing combination is [`OverlayError::MissingSelection`], which
    /// callers report as "nothing to render" rather than a failure.
    pub fn resolve(&self, selection: &Selection) -> OverlayResult<&str> {
        self.entries
            .get(&selection.date)
            .and_then(|runs| runs.get(&selection.run))
            .and_then(|steps| steps.get(&selection.step))
            .and_then(|levels| levels.get(&selection.level))
            .map(String::as_str)
            .ok_or_else(|| OverlayError::MissingSelection {
                date: selection.date.clone(),
                run: selection.run.clone(),
                step: selection.step,
                level: selection.level,
            })
    }

    /// Dates, ascending.
    pub fn dates(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    /// Runs for a date, ascending.
    pub fn runs(&self, date: &str) -> Vec<&str> {
        self.entries
            .get(date)
            .map(|runs| runs.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Forecast steps for a date and run, numerically ascending.
    pub fn steps(&self, date: &str, run: &str) -> Vec<u32> {
        self.entries
            .get(date)
            .and_then(|runs| runs.get(run))
            .map(|steps| steps.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Every pressure level present anywhere, highest (lowest altitude) first.
    pub fn levels(&self) -> Vec<u32> {
        let levels: BTreeSet<u32> = self
            .entries
            .values()
            .flat_map(|runs| runs.values())
            .flat_map(|steps| steps.values())
            .flat_map(|levels| levels.keys().copied())
            .collect();
        levels.into_iter().rev().collect()
    }

    /// `preferred` if any file has that level, otherwise the first level.
    pub fn default_level(&self, preferred: u32) -> Option<u32> {
        let levels = self.levels();
        if levels.contains(&preferred) {
            Some(preferred)
        } else {
            levels.first().copied()
        }
    }

    /// Initial selection: first date, first run, first step and the default
    /// level.
    pub fn first_selection(&self, preferred_level: u32) -> Option<Selection> {
        let date = *self.dates().first()?;
        let run = *self.runs(date).first()?;
        let step = *self.steps(date, run).first()?;
        let level = self.default_level(preferred_level)?;
        Some(Selection::new(date, run, step, level))
    }

    pub fn file_count(&self) -> usize {
        self.entries
            .values()
            .flat_map(|runs| runs.values())
            .flat_map(|steps| steps.values())
            .map(|levels| levels.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.file_count() == 0
    }

    pub fn from_json(json: &str) -> OverlayResult<Self> {
        serde_json::from_str(json).map_err(|e| OverlayError::Manifest(e.to_string()))
    }

    pub fn to_json(&self) -> OverlayResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| OverlayError::Manifest(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> OverlayResult<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&contents)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> OverlayResult<()> {
        std::fs::write(path.as_ref(), self.to_json()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest() -> Manifest {
        let mut m = Manifest::new();
        for step in [0, 12, 6, 120] {
            for level in [150, 850, 500] {
                m.insert(
                    &Selection::new("20251109", "00", step, level),
                    format!("20251109/step_{}h/{}.tif", step, level),
                );
            }
        }
        m.insert(&Selection::new("20251108", "12", 3, 300), "old.tif");
        m
    }

    #[test]
    fn test_resolve_hit() {
        let m = manifest();
        let path = m.resolve(&Selection::new("20251109", "00", 6, 850)).unwrap();
        assert_eq!(path, "20251109/step_6h/850.tif");
    }

    #[test]
    fn test_resolve_miss_is_missing_selection() {
        let m = manifest();
        let err = m.resolve(&Selection::new("20251109", "00", 6, 300)).unwrap_err();
        assert!(err.is_missing_selection());
        assert!(m.resolve(&Selection::new("20251109", "12", 6, 850)).is_err());
        assert!(m.resolve(&Selection::new("20990101", "00", 0, 850)).is_err());
    }

    #[test]
    fn test_steps_numeric_order() {
        assert_eq!(manifest().steps("20251109", "00"), vec![0, 6, 12, 120]);
        assert!(manifest().steps("20251109", "06").is_empty());
    }

    #[test]
    fn test_levels_descending_union() {
        assert_eq!(manifest().levels(), vec![850, 500, 300, 150]);
    }

    #[test]
    fn test_default_level() {
        let m = manifest();
        assert_eq!(m.default_level(850), Some(850));
        assert_eq!(m.default_level(700), Some(850));
        assert_eq!(Manifest::new().default_level(850), None);
    }

    #[test]
    fn test_first_selection() {
        let sel = manifest().first_selection(500).unwrap();
        assert_eq!(sel, Selection::new("20251108", "12", 3, 500));
        assert!(Manifest::new().first_selection(850).is_none());
    }

    #[test]
    fn test_file_count_and_replace() {
        let mut m = manifest();
        assert_eq!(m.file_count(), 13);
        let previous = m.insert(&Selection::new("20251108", "12", 3, 300), "new.tif");
        assert_eq!(previous.as_deref(), Some("old.tif"));
        assert_eq!(m.file_count(), 13);
    }

    #[test]
    fn test_json_round_trip_keeps_numeric_keys() {
        let m = manifest();
        let json = m.to_json().unwrap();
        assert!(json.contains("\"120\""));
        assert_eq!(Manifest::from_json(&json).unwrap(), m);
    }

    #[test]
    fn test_invalid_json_is_manifest_error() {
        let err = Manifest::from_json("{\"entries\": 3}").unwrap_err();
        assert!(matches!(err, OverlayError::Manifest(_)));
    }

    #[test]
    fn test_selection_display() {
        assert_eq!(
            Selection::new("20251109", "00", 6, 850).to_string(),
            "20251109T00 +6h 850hPa"
        );
    }
}
