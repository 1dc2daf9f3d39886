//! History filter
//!
//! Pure selection over the prediction log. Every active criterion must hold;
//! unset criteria match everything. Server order is preserved.

use std::str::FromStr;

use glycowatch_shared::chrono::NaiveDate;
use glycowatch_shared::date::calendar_date;
use glycowatch_shared::{
    HIGH_PROBABILITY_THRESHOLD, MEDIUM_PROBABILITY_THRESHOLD, PredictionHistoryRecord, RiskLevel,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProbabilityBucket {
    #[default]
    All,
    /// `p >= 0.7`
    High,
    /// `0.3 <= p < 0.7`
    Medium,
    /// `p < 0.3`
    Low,
}

impl ProbabilityBucket {
    pub fn contains(&self, probability: f64) -> bool {
        match self {
            ProbabilityBucket::All => true,
            ProbabilityBucket::High => probability >= HIGH_PROBABILITY_THRESHOLD,
            ProbabilityBucket::Medium => {
                (MEDIUM_PROBABILITY_THRESHOLD..HIGH_PROBABILITY_THRESHOLD).contains(&probability)
            }
            ProbabilityBucket::Low => probability < MEDIUM_PROBABILITY_THRESHOLD,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProbabilityBucket::All => "all",
            ProbabilityBucket::High => "high",
            ProbabilityBucket::Medium => "medium",
            ProbabilityBucket::Low => "low",
        }
    }
}

impl FromStr for ProbabilityBucket {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" | "" => Ok(ProbabilityBucket::All),
            "high" => Ok(ProbabilityBucket::High),
            "medium" => Ok(ProbabilityBucket::Medium),
            "low" => Ok(ProbabilityBucket::Low),
            other => Err(format!("unknown probability bucket: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct HistoryFilter {
    /// `None` matches every level.
    pub risk: Option<RiskLevel>,
    /// UTC calendar date of the record timestamp.
    pub date: Option<NaiveDate>,
    pub probability: ProbabilityBucket,
    pub glucose_min: Option<f64>,
    pub glucose_max: Option<f64>,
}

impl HistoryFilter {
    pub fn matches(&self, record: &PredictionHistoryRecord) -> bool {
        if let Some(risk) = &self.risk {
            if &record.risk_level != risk {
                return false;
            }
        }

        if let Some(date) = self.date {
            if calendar_date(&record.timestamp) != Some(date) {
                return false;
            }
        }

        if !self.probability.contains(record.probability) {
            return false;
        }

        // Records without features carry no glucose value and are not
        // constrained by the range.
        if let Some(glucose) = record.glucose() {
            if self.glucose_min.is_some_and(|min| glucose < min) {
                return false;
            }
            if self.glucose_max.is_some_and(|max| glucose > max) {
                return false;
            }
        }

        true
    }

    pub fn apply(&self, records: &[PredictionHistoryRecord]) -> Vec<PredictionHistoryRecord> {
        records.iter().filter(|r| self.matches(r)).cloned().collect()
    }

    pub fn is_active(&self) -> bool {
        self.risk.is_some()
            || self.date.is_some()
            || self.probability != ProbabilityBucket::All
            || self.glucose_min.is_some()
            || self.glucose_max.is_some()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Aggregate figures shown above the history table.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HistorySummary {
    pub total: usize,
    pub low_risk: usize,
    pub high_risk: usize,
    /// Mean probability, 0 when there are no records.
    pub average_probability: f64,
}

impl HistorySummary {
    pub fn of(records: &[PredictionHistoryRecord]) -> Self {
        let total = records.len();
        let count = |level: RiskLevel| records.iter().filter(|r| r.risk_level == level).count();
        let average_probability = if total == 0 {
            0.0
        } else {
            records.iter().map(|r| r.probability).sum::<f64>() / total as f64
        };

        Self {
            total,
            low_risk: count(RiskLevel::Low),
            high_risk: count(RiskLevel::High),
            average_probability,
        }
    }
}
