use crate::simulation::SystemStatus;
use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};

/// Metrics the agent extrapolates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Power,
    Storage,
    Bandwidth,
}

impl Metric {
    pub fn read(self, status: &SystemStatus) -> f64 {
        match self {
            Metric::Power => status.power.consumption_w,
            Metric::Storage => status.storage_mb,
            Metric::Bandwidth => status.bandwidth_mbps,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Prediction {
    pub value: f64,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricPrediction {
    pub metric: Metric,
    pub value: f64,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionSnapshot {
    pub predictions: Vec<MetricPrediction>,
    pub last_update: Option<DateTime<Utc>>,
}

/// Linear one-step extrapolation of `current` from the mean first difference of `history`.
///
/// With fewer than two historical values the current value is returned with
/// a neutral confidence of `0.5`.
#[allow(clippy::cast_precision_loss)]
pub fn predict(history: &[f64], current: f64) -> Prediction {
    if history.len() < 2 {
        return Prediction { value: current, confidence: 0.5 };
    }
    let trend = history.iter().tuple_windows().map(|(a, b)| b - a).sum::<f64>()
        / (history.len() - 1) as f64;
    let variance =
        history.iter().map(|v| (v - trend).powi(2)).sum::<f64>() / history.len() as f64;
    Prediction {
        value: current + trend,
        confidence: 1.0 / (1.0 + variance.sqrt()),
    }
}

/// Per-metric history, latest predictions and a running accuracy score.
#[derive(Debug)]
pub struct TrendModel {
    capacity: usize,
    history: HashMap<Metric, VecDeque<f64>>,
    predictions: HashMap<Metric, Prediction>,
    accuracy_sum: f64,
    accuracy_samples: u32,
    last_update: Option<DateTime<Utc>>,
}

impl TrendModel {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            history: HashMap::new(),
            predictions: HashMap::new(),
            accuracy_sum: 0.0,
            accuracy_samples: 0,
            last_update: None,
        }
    }

    /// Scores the previous predictions against `status`, predicts the next
    /// values and appends the current readings to the history.
    pub fn observe(&mut self, status: &SystemStatus, now: DateTime<Utc>) {
        for metric in Metric::iter() {
            let current = metric.read(status);
            if let Some(previous) = self.predictions.get(&metric).copied() {
                self.score(previous.value, current);
            }
            let history = self.history.entry(metric).or_default();
            let prediction = predict(history.make_contiguous(), current);
            history.push_back(current);
            while history.len() > self.capacity {
                history.pop_front();
            }
            self.predictions.insert(metric, prediction);
        }
        self.last_update = Some(now);
    }

    fn score(&mut self, predicted: f64, actual: f64) {
        let err = (predicted - actual).abs();
        let score = if actual.abs() > f64::EPSILON {
            1.0 - (err / actual.abs()).min(1.0)
        } else if err <= f64::EPSILON {
            1.0
        } else {
            0.0
        };
        self.accuracy_sum += score;
        self.accuracy_samples += 1;
    }

    /// Mean accuracy of all scored predictions so far.
    pub fn accuracy(&self) -> Option<f64> {
        (self.accuracy_samples > 0).then(|| self.accuracy_sum / f64::from(self.accuracy_samples))
    }

    pub fn prediction(&self, metric: Metric) -> Option<Prediction> {
        self.predictions.get(&metric).copied()
    }

    pub fn snapshot(&self) -> PredictionSnapshot {
        let predictions = Metric::iter()
            .filter_map(|metric| {
                self.prediction(metric).map(|p| MetricPrediction {
                    metric,
                    value: p.value,
                    confidence: p.confidence,
                })
            })
            .collect();
        PredictionSnapshot { predictions, last_update: self.last_update }
    }
}
