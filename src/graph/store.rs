//! # Graph Window Store
//!
//! User-created graph configs with their time-window series, plus the
//! fixed-capacity rolling series that back the built-in subsystem charts.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

use super::series::{GraphSample, RetentionPolicy, Series};

/// Default capacity of the built-in rolling chart series
pub const DEFAULT_ROLLING_CAPACITY: usize = 200;

/// A user-defined chart bound to a telemetry key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphConfig {
    pub id: String,
    pub title: String,
    /// `section.key` (or `subsystem.field[.sub]`) path the graph plots
    pub data_key: String,
    /// Subsystem tag used for grouping in the UI
    pub subsystem: String,
    /// Window length in seconds
    #[serde(rename = "timeWindow")]
    pub time_window_s: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_axis_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_axis_max: Option<f64>,
    pub color: String,
    #[serde(rename = "isVisible", default = "default_visible")]
    pub visible: bool,
}

fn default_visible() -> bool { true }

impl GraphConfig {
    /// Convenience constructor for a visible graph with no axis limits.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        data_key: impl Into<String>,
        time_window_s: u32,
    ) -> Self {
        let data_key = data_key.into();
        let subsystem = data_key.split('.').next().unwrap_or_default().to_string();
        Self {
            id: id.into(),
            title: title.into(),
            data_key,
            subsystem,
            time_window_s,
            y_axis_min: None,
            y_axis_max: None,
            color: "#3b82f6".to_string(),
            visible: true,
        }
    }
}

/// Graph configs and series.
#[derive(Debug, Clone)]
pub struct GraphStore {
    configs: BTreeMap<String, GraphConfig>,
    windows: BTreeMap<String, Series>,
    rolling: BTreeMap<String, Series>,
    rolling_capacity: usize,
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new(DEFAULT_ROLLING_CAPACITY)
    }
}

impl GraphStore {
    pub fn new(rolling_capacity: usize) -> Self {
        Self {
            configs: BTreeMap::new(),
            windows: BTreeMap::new(),
            rolling: BTreeMap::new(),
            rolling_capacity: rolling_capacity.max(1),
        }
    }

    /// Register a graph with an empty series.
    ///
    /// Re-adding an existing id replaces its config and discards its samples.
    pub fn add_graph(&mut self, config: GraphConfig) {
        info!("Adding graph '{}' for {} ({}s window)", config.id, config.data_key, config.time_window_s);
        self.windows
            .insert(config.id.clone(), Series::time_window(config.time_window_s));
        self.configs.insert(config.id.clone(), config);
    }

    /// Delete a graph's config and series.
    ///
    /// # Returns
    ///
    /// * `bool` - Whether the graph existed
    pub fn remove_graph(&mut self, id: &str) -> bool {
        self.windows.remove(id);
        let existed = self.configs.remove(id).is_some();
        if existed {
            info!("Removed graph '{}'", id);
        }
        existed
    }

    /// Append a sample to a registered graph.
    ///
    /// Unknown ids (e.g. a graph removed while samples were in flight) are
    /// ignored.
    ///
    /// # Returns
    ///
    /// * `bool` - Whether the sample was stored
    pub fn append_sample(&mut self, graph_id: &str, sample: GraphSample) -> bool {
        match self.windows.get_mut(graph_id) {
            Some(series) => {
                series.push(sample);
                true
            }
            None => {
                debug!("Ignoring sample for unknown graph '{}'", graph_id);
                false
            }
        }
    }

    /// Append a sample to a built-in rolling series, creating it on first use.
    pub fn append_rolling(&mut self, series_id: &str, sample: GraphSample) {
        let capacity = self.rolling_capacity;
        self.rolling
            .entry(series_id.to_string())
            .or_insert_with(|| Series::rolling(capacity))
            .push(sample);
    }

    /// Ids of visible graphs plotting `data_key`
    pub fn graphs_for_key<'a>(&'a self, data_key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.configs
            .values()
            .filter(move |c| c.visible && c.data_key == data_key)
            .map(|c| c.id.as_str())
    }

    /// Show or hide a graph. Hidden graphs stop receiving samples.
    pub fn set_visible(&mut self, id: &str, visible: bool) -> bool {
        match self.configs.get_mut(id) {
            Some(config) => {
                config.visible = visible;
                true
            }
            None => false,
        }
    }

    pub fn config(&self, id: &str) -> Option<&GraphConfig> {
        self.configs.get(id)
    }

    pub fn configs(&self) -> impl Iterator<Item = &GraphConfig> {
        self.configs.values()
    }

    /// Time-window series for a registered graph
    pub fn series(&self, id: &str) -> Option<&Series> {
        self.windows.get(id)
    }

    /// Built-in rolling series
    pub fn rolling_series(&self, id: &str) -> Option<&Series> {
        self.rolling.get(id)
    }

    /// Every series with its retention tag, user graphs first
    pub fn all_series(&self) -> impl Iterator<Item = (&str, RetentionPolicy)> {
        self.windows
            .iter()
            .chain(self.rolling.iter())
            .map(|(id, s)| (id.as_str(), s.policy()))
    }

    /// Drop every sample; configs are kept.
    pub fn clear_samples(&mut self) {
        for series in self.windows.values_mut() {
            series.clear();
        }
        self.rolling.clear();
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}
