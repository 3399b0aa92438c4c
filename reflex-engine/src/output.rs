//! Writing and reading run records.
//!
//! Every writer goes through a temporary file in the destination directory
//! that is renamed over the target once fully flushed, so a reader never sees
//! a half-written record.

use std::io::Write;
use std::path::{Path, PathBuf};

use log::{info, warn};
use reflex_core::RunResult;
use tempfile::NamedTempFile;

use crate::error::{EngineError, Result};

/// Where a finished run should be written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputTargets {
    pub json: Option<PathBuf>,
    pub csv: Option<PathBuf>,
}

impl OutputTargets {
    /// Writes every requested file, or none of them.
    ///
    /// Both files are staged in full before either is renamed into place. The
    /// JSON record is renamed last since it is the file callers wait on; if
    /// that rename fails the CSV already committed is removed again.
    pub fn write_all(&self, result: &RunResult) -> Result<()> {
        let csv = match &self.csv {
            Some(path) => Some((path, stage(path, |file| fill_csv(file, result))?)),
            None => None,
        };
        let json = match &self.json {
            Some(path) => {
                let text = json_document(result)?;
                Some((path, stage(path, |file| file.write_all(text.as_bytes()))?))
            }
            None => None,
        };

        if let Some((path, file)) = csv {
            commit(file, path)?;
            info!("CSV exported: {}", path.display());
        }
        if let Some((path, file)) = json {
            if let Err(e) = commit(file, path) {
                if let Some(csv_path) = &self.csv {
                    if let Err(cleanup) = std::fs::remove_file(csv_path) {
                        warn!("could not remove {}: {}", csv_path.display(), cleanup);
                    }
                }
                return Err(e);
            }
            info!("JSON exported: {}", path.display());
        }
        Ok(())
    }
}

pub fn to_json(result: &RunResult, compact: bool) -> Result<String> {
    let encoded = if compact {
        serde_json::to_string(result)
    } else {
        serde_json::to_string_pretty(result)
    };
    encoded.map_err(|e| EngineError::Encode(e.to_string()))
}

pub fn write_json_atomic(path: &Path, result: &RunResult) -> Result<()> {
    let text = json_document(result)?;
    let file = stage(path, |file| file.write_all(text.as_bytes()))?;
    commit(file, path)
}

/// Spreadsheet export: one row per trial, then an `average` row.
pub fn write_csv_atomic(path: &Path, result: &RunResult) -> Result<()> {
    let file = stage(path, |file| fill_csv(file, result))?;
    commit(file, path)
}

fn json_document(result: &RunResult) -> Result<String> {
    let mut json = to_json(result, false)?;
    json.push('\n');
    Ok(json)
}

fn fill_csv(file: &mut NamedTempFile, result: &RunResult) -> std::io::Result<()> {
    let mut writer = csv::WriterBuilder::new().from_writer(file);
    writer.write_record(["trial", "random_delay_seconds", "reaction_ms", "false_start"])?;
    for trial in result.trials() {
        let (reaction, flag) = match trial.reaction_ms() {
            Some(ms) => (format!("{:.6}", ms), "0"),
            None => (String::new(), "1"),
        };
        writer.write_record([
            trial.index().to_string(),
            format!("{:.6}", trial.planned_delay_seconds()),
            reaction,
            flag.to_string(),
        ])?;
    }
    let average = result
        .average_reaction_ms()
        .map(|ms| format!("{:.6}", ms))
        .unwrap_or_default();
    writer.write_record(["average", "", average.as_str(), ""])?;
    writer.flush()
}

/// Parses a run record and re-checks every record invariant.
pub fn read_run_result(path: &Path) -> Result<RunResult> {
    let text = std::fs::read_to_string(path).map_err(|source| EngineError::Output {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|e| EngineError::Encode(e.to_string()))
}

/// Fills and syncs a temp file next to `path`. Dropping it unpersisted
/// removes it.
fn stage<F>(path: &Path, fill: F) -> Result<NamedTempFile>
where
    F: FnOnce(&mut NamedTempFile) -> std::io::Result<()>,
{
    let output_err = |source| EngineError::Output {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir).map_err(output_err)?;
    fill(&mut file).map_err(output_err)?;
    file.as_file().sync_all().map_err(output_err)?;
    Ok(file)
}

fn commit(file: NamedTempFile, path: &Path) -> Result<()> {
    file.persist(path)
        .map(|_| ())
        .map_err(|e| EngineError::Output {
            path: path.to_path_buf(),
            source: e.error,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use reflex_core::TrialRecord;
    use tempfile::tempdir;

    fn sample() -> RunResult {
        RunResult::from_trials(vec![
            TrialRecord::timed(1, 0.75, 200.0).unwrap(),
            TrialRecord::false_start(2, 1.25).unwrap(),
            TrialRecord::timed(3, 0.5, 150.0).unwrap(),
        ])
        .unwrap()
    }

    #[test]
    fn json_record_uses_contract_field_names() {
        let value: serde_json::Value =
            serde_json::from_str(&to_json(&sample(), true).unwrap()).unwrap();
        assert_eq!(value["trial_count"], 3);
        assert_eq!(value["valid_count"], 2);
        assert_eq!(value["false_start_count"], 1);
        assert_eq!(value["average_reaction_ms"], 175.0);
        assert_eq!(value["trials"][1]["trial"], 2);
        assert_eq!(value["trials"][1]["reaction_ms"], serde_json::Value::Null);
        assert_eq!(value["trials"][1]["false_start"], true);
        assert_eq!(value["trials"][0]["random_delay_seconds"], 0.75);
    }

    #[test]
    fn writes_and_reads_back_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.json");
        write_json_atomic(&path, &sample()).unwrap();
        assert_eq!(read_run_result(&path).unwrap(), sample());
        // only the target is left behind
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn csv_matches_spreadsheet_layout() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.csv");
        write_csv_atomic(&path, &sample()).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "trial,random_delay_seconds,reaction_ms,false_start",
                "1,0.750000,200.000000,0",
                "2,1.250000,,1",
                "3,0.500000,150.000000,0",
                "average,,175.000000,",
            ]
        );
    }

    #[test]
    fn csv_average_is_blank_without_valid_trials() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.csv");
        let result = RunResult::from_trials(vec![TrialRecord::false_start(1, 0.9).unwrap()]).unwrap();
        write_csv_atomic(&path, &result).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().last(), Some("average,,,"));
    }

    #[test]
    fn missing_directory_fails_without_output() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("run.json");
        let err = write_json_atomic(&path, &sample()).unwrap_err();
        assert!(matches!(err, EngineError::Output { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn rejects_inconsistent_record() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.json");
        std::fs::write(
            &path,
            r#"{"trial_count":1,"valid_count":1,"false_start_count":0,"average_reaction_ms":null,
               "trials":[{"trial":1,"random_delay_seconds":0.8,"reaction_ms":210.0,"false_start":false}]}"#,
        )
        .unwrap();
        assert!(matches!(
            read_run_result(&path),
            Err(EngineError::Encode(_))
        ));
    }

    #[test]
    fn write_all_puts_both_files() {
        let dir = tempdir().unwrap();
        let targets = OutputTargets {
            json: Some(dir.path().join("run.json")),
            csv: Some(dir.path().join("run.csv")),
        };
        targets.write_all(&sample()).unwrap();
        assert!(dir.path().join("run.json").exists());
        assert!(dir.path().join("run.csv").exists());
    }

    #[test]
    fn write_all_leaves_no_csv_when_json_fails() {
        let dir = tempdir().unwrap();
        let csv = dir.path().join("run.csv");
        let targets = OutputTargets {
            json: Some(dir.path().join("missing").join("run.json")),
            csv: Some(csv.clone()),
        };
        let err = targets.write_all(&sample()).unwrap_err();
        assert!(matches!(err, EngineError::Output { .. }));
        assert!(!csv.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn csv_is_rolled_back_when_json_rename_fails() {
        let dir = tempdir().unwrap();
        let csv = dir.path().join("run.csv");
        // a directory sits where the record should go
        let json = dir.path().join("run.json");
        std::fs::create_dir(&json).unwrap();
        std::fs::write(json.join("keep"), b"x").unwrap();
        let targets = OutputTargets {
            json: Some(json.clone()),
            csv: Some(csv.clone()),
        };
        assert!(targets.write_all(&sample()).is_err());
        assert!(!csv.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
