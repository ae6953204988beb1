//! Pattern analysis report: face frequencies, hour-of-day splits, recent
//! runs, and a rough risk reading.

use chrono::Timelike;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::history::sequence::SequenceDetector;
use crate::history::HistoryStore;
use crate::stats::{CombinationCount, StatsReporter, SumBucket, TOP_COMBINATIONS};
use crate::types::{percentage, Classification, SequenceRun, MAX_FACE, MIN_FACE};

/// Faces listed in each of the hot and cold lists.
pub const FACE_LIST_LEN: usize = 3;
/// Hours need strictly more rounds than this to be reported.
pub const MIN_GAMES_PER_HOUR: usize = 5;
/// Below this many rounds the hourly split is skipped.
pub const MIN_ROUNDS_FOR_HOURS: usize = 10;
pub const RECENT_RUNS: usize = 5;
/// A sum bucket above this share flags the distribution as skewed.
pub const SKEWED_BUCKET_SHARE: f64 = 15.0;
/// More retained runs than this per class flags streaky play.
pub const RUN_ALERT: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceFrequency {
    pub face: u8,
    pub count: usize,
    /// Share of all dice thrown.
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyPattern {
    /// UTC hour of day.
    pub hour: u32,
    pub games: usize,
    pub high_percentage: f64,
    pub low_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentRuns {
    pub high: Vec<SequenceRun>,
    pub low: Vec<SequenceRun>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    pub reasons: Vec<String>,
}

/// Trailing run of identical classifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentRun {
    pub classification: Classification,
    pub length: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternAnalysis {
    pub hot_faces: Vec<FaceFrequency>,
    pub cold_faces: Vec<FaceFrequency>,
    pub hourly_patterns: Vec<HourlyPattern>,
    pub sum_distribution: Vec<SumBucket>,
    /// Most seen dice combinations, including evicted rounds.
    pub frequent_combinations: Vec<CombinationCount>,
    pub recent_runs: RecentRuns,
    pub current_run: Option<CurrentRun>,
    pub insights: Vec<String>,
    pub risk: RiskAssessment,
}

pub fn analyze(history: &HistoryStore, sequences: &SequenceDetector) -> PatternAnalysis {
    let faces = face_frequencies(history);
    let hot_faces = hot_faces(&faces);
    let cold_faces = cold_faces(&faces);
    let hourly_patterns = hourly_patterns(history);
    let sum_distribution = StatsReporter::sum_buckets(history);
    let recent_runs = RecentRuns {
        high: sequences.recent(Classification::High, RECENT_RUNS),
        low: sequences.recent(Classification::Low, RECENT_RUNS),
    };
    let insights = insights(&hot_faces, &cold_faces, &hourly_patterns);
    let risk = assess_risk(&sum_distribution, sequences);

    PatternAnalysis {
        hot_faces,
        cold_faces,
        hourly_patterns,
        sum_distribution,
        frequent_combinations: StatsReporter::top_combinations(history, TOP_COMBINATIONS),
        recent_runs,
        current_run: current_run(history),
        insights,
        risk,
    }
}

/// Per-face counts over every stored die, in face order. Empty for an
/// empty history.
pub fn face_frequencies(history: &HistoryStore) -> Vec<FaceFrequency> {
    if history.is_empty() {
        return Vec::new();
    }
    let mut counts = [0usize; MAX_FACE as usize + 1];
    for record in history.iter() {
        for face in record.dice.faces() {
            counts[face as usize] += 1;
        }
    }
    let thrown = history.len() * 3;
    (MIN_FACE..=MAX_FACE)
        .map(|face| FaceFrequency {
            face,
            count: counts[face as usize],
            percentage: percentage(counts[face as usize], thrown),
        })
        .collect()
}

/// Most frequent faces; lower faces win ties.
pub fn hot_faces(faces: &[FaceFrequency]) -> Vec<FaceFrequency> {
    let mut sorted = faces.to_vec();
    sorted.sort_by(|a, b| b.count.cmp(&a.count));
    sorted.truncate(FACE_LIST_LEN);
    sorted
}

/// Least frequent faces; lower faces win ties.
pub fn cold_faces(faces: &[FaceFrequency]) -> Vec<FaceFrequency> {
    let mut sorted = faces.to_vec();
    sorted.sort_by(|a, b| a.count.cmp(&b.count));
    sorted.truncate(FACE_LIST_LEN);
    sorted
}

/// High/Low split per UTC hour, busiest hours first.
pub fn hourly_patterns(history: &HistoryStore) -> Vec<HourlyPattern> {
    if history.len() < MIN_ROUNDS_FOR_HOURS {
        return Vec::new();
    }

    let mut by_hour: BTreeMap<u32, (usize, usize)> = BTreeMap::new();
    for record in history.iter() {
        let entry = by_hour.entry(record.observed_at.hour()).or_default();
        entry.0 += 1;
        if record.classification == Classification::High {
            entry.1 += 1;
        }
    }

    let mut patterns: Vec<HourlyPattern> = by_hour
        .into_iter()
        .filter(|&(_, (games, _))| games > MIN_GAMES_PER_HOUR)
        .map(|(hour, (games, highs))| HourlyPattern {
            hour,
            games,
            high_percentage: percentage(highs, games),
            low_percentage: percentage(games - highs, games),
        })
        .collect();
    patterns.sort_by(|a, b| b.games.cmp(&a.games));
    patterns
}

pub fn current_run(history: &HistoryStore) -> Option<CurrentRun> {
    if history.len() < 2 {
        return None;
    }
    let last = history.last()?.classification;
    let length = history
        .iter()
        .rev()
        .take_while(|r| r.classification == last)
        .count();
    Some(CurrentRun {
        classification: last,
        length,
    })
}

fn insights(hot: &[FaceFrequency], cold: &[FaceFrequency], hours: &[HourlyPattern]) -> Vec<String> {
    let join = |faces: &[FaceFrequency]| {
        faces
            .iter()
            .map(|f| f.face.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    };

    let mut lines = Vec::new();
    if !hot.is_empty() {
        lines.push(format!("Hot faces: {}", join(hot)));
    }
    if !cold.is_empty() {
        lines.push(format!("Cold faces: {}", join(cold)));
    }
    if let Some(busiest) = hours.first() {
        lines.push(format!(
            "Busiest hour: {:02}:00 UTC (High {:.2}%)",
            busiest.hour, busiest.high_percentage
        ));
    }
    lines
}

pub fn assess_risk(buckets: &[SumBucket], sequences: &SequenceDetector) -> RiskAssessment {
    let mut reasons = Vec::new();

    if buckets.iter().any(|b| b.percentage > SKEWED_BUCKET_SHARE) {
        reasons.push("Uneven sum distribution, possible bias".to_string());
    }
    if Classification::ALL
        .iter()
        .any(|&class| sequences.runs(class).len() > RUN_ALERT)
    {
        reasons.push("Frequent runs of identical outcomes".to_string());
    }

    let level = if reasons.is_empty() {
        RiskLevel::Medium
    } else {
        RiskLevel::High
    };
    RiskAssessment { level, reasons }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
