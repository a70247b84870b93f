//! Report generation
//!
//! Writes the run's outputs into one directory:
//! - `transition_counts.csv`: raw edge counts, most frequent first
//! - `transition_probabilities.csv`: row-normalized probabilities
//! - `states.csv`: the state registry indexing the matrix
//! - `flip_causes.csv`: possession flips broken down by cause
//! - `transition_matrix.csv`: dense smoothed matrix (optional)
//! - `blocks.csv`: the matrix split into attack/defense blocks
//! - `run_summary.json`: configuration, counters and model metrics

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use possession_markov::{
    ChainConfig, FlipCounts, RegistryScope, SegmentStats, StateRegistry, TransitionCounts,
    TransitionModel, TransitionProbabilities,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize)]
struct CountRow {
    from: String,
    to: String,
    count: u64,
}

#[derive(Debug, Serialize)]
struct ProbabilityRow {
    from: String,
    to: String,
    probability: f64,
}

#[derive(Debug, Serialize)]
struct StateRow {
    id: usize,
    key: String,
    side: &'static str,
    zone: String,
    action: &'static str,
    situation: Option<&'static str>,
}

#[derive(Debug, Serialize)]
struct BlockRow<'a> {
    block: &'static str,
    row_key: &'a str,
    col_key: &'a str,
    p: f64,
}

#[derive(Debug, Serialize)]
struct FlipRow {
    from: String,
    to: String,
    cause: &'static str,
    is_restart: bool,
    count: u64,
}

/// Summary of one run, written as JSON
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub generated_at: DateTime<Utc>,
    pub library_version: &'static str,
    pub config: ChainConfig,
    pub registry: RegistryScope,
    pub matches_loaded: usize,
    pub matches_used: usize,
    pub matches_failed: usize,
    pub segmentation: SegmentStats,
    pub distinct_transitions: usize,
    pub total_transitions: u64,
    pub states: usize,
    /// Matrix indices of attack (Possessor) states
    pub attack_ids: Vec<usize>,
    /// Matrix indices of defense (NonPossessor) states
    pub defense_ids: Vec<usize>,
    pub log_likelihood: f64,
    pub perplexity: Option<f64>,
    pub flips_by_cause: BTreeMap<String, u64>,
}

/// Everything a run produces
pub struct RunOutputs<'a> {
    pub counts: &'a TransitionCounts,
    pub flips: &'a FlipCounts,
    pub model: &'a TransitionModel,
    pub summary: &'a RunSummary,
    pub write_matrix: bool,
}

/// Write all reports into `dir`, returning the written paths
pub fn write_reports(dir: &Path, outputs: &RunOutputs<'_>) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory: {:?}", dir))?;

    let mut written = Vec::new();

    let path = dir.join("transition_counts.csv");
    write_transition_counts(&path, outputs.counts)?;
    written.push(path);

    let path = dir.join("transition_probabilities.csv");
    write_transition_probabilities(&path, &outputs.counts.probabilities())?;
    written.push(path);

    let path = dir.join("states.csv");
    write_states(&path, outputs.model.registry())?;
    written.push(path);

    let path = dir.join("flip_causes.csv");
    write_flip_causes(&path, outputs.flips)?;
    written.push(path);

    if outputs.write_matrix {
        let path = dir.join("transition_matrix.csv");
        write_matrix(&path, outputs.model)?;
        written.push(path);
    }

    let path = dir.join("blocks.csv");
    write_blocks(&path, outputs.model)?;
    written.push(path);

    let path = dir.join("run_summary.json");
    write_summary(&path, outputs.summary)?;
    written.push(path);

    for path in &written {
        log::info!("Wrote {:?}", path);
    }
    Ok(written)
}

fn csv_writer(path: &Path) -> Result<csv::Writer<File>> {
    csv::Writer::from_path(path).with_context(|| format!("Failed to create report: {:?}", path))
}

/// Edge counts by descending count, ties in state order
pub fn write_transition_counts(path: &Path, counts: &TransitionCounts) -> Result<()> {
    let mut writer = csv_writer(path)?;
    for (t, count) in counts.sorted_by_count() {
        writer.serialize(CountRow {
            from: t.from.key(),
            to: t.to.key(),
            count,
        })?;
    }
    writer.flush()?;
    Ok(())
}

/// Probabilities by descending value
pub fn write_transition_probabilities(path: &Path, probs: &TransitionProbabilities) -> Result<()> {
    let mut writer = csv_writer(path)?;
    for (t, probability) in probs.sorted_by_probability() {
        writer.serialize(ProbabilityRow {
            from: t.from.key(),
            to: t.to.key(),
            probability,
        })?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_states(path: &Path, registry: &StateRegistry) -> Result<()> {
    let mut writer = csv_writer(path)?;
    for (id, state) in registry.states().iter().enumerate() {
        writer.serialize(StateRow {
            id,
            key: state.key(),
            side: state.side.code(),
            zone: state.zone.to_string(),
            action: state.action.code(),
            situation: state.situation.map(|s| s.code()),
        })?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_flip_causes(path: &Path, flips: &FlipCounts) -> Result<()> {
    let mut writer = csv_writer(path)?;
    for (key, count) in flips.iter() {
        writer.serialize(FlipRow {
            from: key.transition.from.key(),
            to: key.transition.to.key(),
            cause: key.cause.label(),
            is_restart: key.cause.is_restart(),
            count,
        })?;
    }
    writer.flush()?;
    Ok(())
}

/// Dense matrix with state keys as the header row and first column
pub fn write_matrix(path: &Path, model: &TransitionModel) -> Result<()> {
    let keys: Vec<String> = model.registry().states().iter().map(|s| s.key()).collect();
    let matrix = model.matrix();

    let mut writer = csv_writer(path)?;
    writer.write_record(std::iter::once("state").chain(keys.iter().map(String::as_str)))?;
    for (i, key) in keys.iter().enumerate() {
        let mut record = Vec::with_capacity(keys.len() + 1);
        record.push(key.clone());
        record.extend(matrix.row(i).iter().map(|p| p.to_string()));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

/// One row per cell of the AA, AD, DA and DD blocks
pub fn write_blocks(path: &Path, model: &TransitionModel) -> Result<()> {
    let keys: Vec<String> = model.registry().states().iter().map(|s| s.key()).collect();
    let blocks = model.blocks();
    let parts = [
        ("attack_attack", &blocks.attack, &blocks.attack, &blocks.attack_attack),
        ("attack_defense", &blocks.attack, &blocks.defense, &blocks.attack_defense),
        ("defense_attack", &blocks.defense, &blocks.attack, &blocks.defense_attack),
        ("defense_defense", &blocks.defense, &blocks.defense, &blocks.defense_defense),
    ];

    let mut writer = csv_writer(path)?;
    for (block, rows, cols, matrix) in parts {
        for (r, &i) in rows.iter().enumerate() {
            for (c, &j) in cols.iter().enumerate() {
                writer.serialize(BlockRow {
                    block,
                    row_key: &keys[i],
                    col_key: &keys[j],
                    p: matrix[(r, c)],
                })?;
            }
        }
    }
    writer.flush()?;
    Ok(())
}

pub fn write_summary(path: &Path, summary: &RunSummary) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create report: {:?}", path))?;
    serde_json::to_writer_pretty(file, summary)
        .with_context(|| format!("Failed to write summary: {:?}", path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use possession_markov::{
        Action, Estimator, FlipCause, Side, State, Transition, Zone, ZoneGranularity,
    };
    use possession_markov::state::Third;

    fn state(side: Side, third: Third, action: Action) -> State {
        State::new(side, Zone::third(third), action)
    }

    fn sample() -> (TransitionCounts, FlipCounts) {
        let pass_d = state(Side::Possessor, Third::Defensive, Action::Pass);
        let pass_m = state(Side::Possessor, Third::Middle, Action::Pass);
        let loss_m = state(Side::Possessor, Third::Middle, Action::Loss);
        let rec_m = state(Side::NonPossessor, Third::Middle, Action::Recovery);

        let counts: TransitionCounts = vec![
            Transition::new(pass_m, loss_m),
            Transition::new(pass_d, pass_m),
            Transition::new(pass_d, pass_m),
            Transition::new(loss_m, rec_m),
        ]
        .into_iter()
        .collect();

        let mut flips = FlipCounts::new();
        flips.record(Transition::new(loss_m, rec_m), FlipCause::BallRecovery);
        (counts, flips)
    }

    fn summary(model: &TransitionModel) -> RunSummary {
        RunSummary {
            generated_at: Utc::now(),
            library_version: possession_markov::VERSION,
            config: ChainConfig::new().with_reference_team(1),
            registry: RegistryScope::Full,
            matches_loaded: 1,
            matches_used: 1,
            matches_failed: 0,
            segmentation: SegmentStats::default(),
            distinct_transitions: 3,
            total_transitions: 4,
            states: model.len(),
            attack_ids: model.blocks().attack,
            defense_ids: model.blocks().defense,
            log_likelihood: model.log_likelihood(),
            perplexity: model.perplexity(),
            flips_by_cause: BTreeMap::new(),
        }
    }

    #[test]
    fn test_transition_counts_sorted() {
        let (counts, _) = sample();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counts.csv");
        write_transition_counts(&path, &counts).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "from,to,count");
        assert_eq!(lines[1], "P_D_PASS,P_M_PASS,2");
        // Equal counts follow state order: PASS before LOSS
        assert_eq!(lines[2], "P_M_PASS,P_M_LOSS,1");
        assert_eq!(lines[3], "P_M_LOSS,S_M_RECOVERY,1");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_write_all_reports() {
        let (counts, flips) = sample();
        let model = Estimator::new(0.3)
            .unwrap()
            .estimate(&counts, StateRegistry::full(ZoneGranularity::Thirds, false));
        let summary = summary(&model);

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("reports");
        let written = write_reports(
            &out,
            &RunOutputs {
                counts: &counts,
                flips: &flips,
                model: &model,
                summary: &summary,
                write_matrix: true,
            },
        )
        .unwrap();
        assert_eq!(written.len(), 7);

        let states = fs::read_to_string(out.join("states.csv")).unwrap();
        assert_eq!(states.lines().count(), 25);
        assert!(states.starts_with("id,key,side,zone,action,situation"));

        let flips_csv = fs::read_to_string(out.join("flip_causes.csv")).unwrap();
        assert!(flips_csv.contains("P_M_LOSS,S_M_RECOVERY,ball_recovery,false,1"));

        let matrix = fs::read_to_string(out.join("transition_matrix.csv")).unwrap();
        let header: Vec<&str> = matrix.lines().next().unwrap().split(',').collect();
        assert_eq!(header.len(), 25);
        assert_eq!(header[0], "state");

        let blocks = fs::read_to_string(out.join("blocks.csv")).unwrap();
        let lines: Vec<&str> = blocks.lines().collect();
        assert_eq!(lines[0], "block,row_key,col_key,p");
        assert_eq!(lines.len(), 24 * 24 + 1);
        for block in ["attack_attack", "attack_defense", "defense_attack", "defense_defense"] {
            let rows = lines.iter().filter(|l| l.starts_with(&format!("{},", block))).count();
            assert_eq!(rows, 12 * 12);
        }
        let id = |key: &str| model.registry().states().iter().position(|s| s.key() == key).unwrap();
        let expected = model.matrix()[(id("P_M_LOSS"), id("S_M_RECOVERY"))];
        let cell: f64 = lines
            .iter()
            .find_map(|l| l.strip_prefix("attack_defense,P_M_LOSS,S_M_RECOVERY,"))
            .unwrap()
            .parse()
            .unwrap();
        assert!((cell - expected).abs() < 1e-12);

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(out.join("run_summary.json")).unwrap()).unwrap();
        assert_eq!(json["states"], 24);
        assert_eq!(json["attack_ids"].as_array().unwrap().len(), 12);
        assert_eq!(json["defense_ids"].as_array().unwrap().len(), 12);
        assert_eq!(json["registry"], "full");
        assert_eq!(json["config"]["zone_granularity"], 3);
    }

    #[test]
    fn test_matrix_is_optional() {
        let (counts, flips) = sample();
        let model = Estimator::new(0.3)
            .unwrap()
            .estimate(&counts, StateRegistry::observed(&counts));
        let summary = summary(&model);

        let dir = tempfile::tempdir().unwrap();
        let written = write_reports(
            dir.path(),
            &RunOutputs {
                counts: &counts,
                flips: &flips,
                model: &model,
                summary: &summary,
                write_matrix: false,
            },
        )
        .unwrap();
        assert_eq!(written.len(), 6);
        assert!(!dir.path().join("transition_matrix.csv").exists());
    }
}
