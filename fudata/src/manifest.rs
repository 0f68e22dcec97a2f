// Copyright (c) James Kassemi, SC, US. All rights reserved.

//! Run manifests under `<root>/logs/run_manifests/`.

use std::{
    fs::{self, File},
    io::{self, Write},
    path::{Path, PathBuf},
};

use crate::{error::PipelineError, report::RunReport};

const MANIFEST_DIR: [&str; 2] = ["logs", "run_manifests"];
const MAX_SUFFIX: u32 = 1000;

pub fn manifest_dir(root: &Path) -> PathBuf {
    MANIFEST_DIR.iter().fold(root.to_path_buf(), |dir, part| dir.join(part))
}

/// Writes `report` as pretty JSON to `run_<UTC start>.json`, never replacing an
/// existing manifest: a name already taken gets a `-N` suffix. The file appears
/// fully written or not at all.
pub fn write_manifest(root: &Path, report: &RunReport) -> Result<PathBuf, PipelineError> {
    let dir = manifest_dir(root);
    fs::create_dir_all(&dir)?;
    let stem = format!("run_{}", report.started_at.format("%Y%m%dT%H%M%SZ"));
    let bytes = serde_json::to_vec_pretty(report)?;

    let temp = dir.join(format!(".{stem}.{}.tmp", std::process::id()));
    {
        let mut file = File::create(&temp)?;
        file.write_all(&bytes)?;
        file.write_all(b"\n")?;
        file.sync_all()?;
    }
    let result = link_unique(&temp, &dir, &stem);
    let _ = fs::remove_file(&temp);
    result
}

/// Hard-links `temp` to the first free manifest name; linking fails rather
/// than overwriting when the name exists.
fn link_unique(temp: &Path, dir: &Path, stem: &str) -> Result<PathBuf, PipelineError> {
    for attempt in 0..MAX_SUFFIX {
        let name = if attempt == 0 {
            format!("{stem}.json")
        } else {
            format!("{stem}-{attempt}.json")
        };
        let target = dir.join(name);
        match fs::hard_link(temp, &target) {
            Ok(()) => return Ok(target),
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(err) => return Err(err.into()),
        }
    }
    Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("no free manifest name for {stem} in {}", dir.display()),
    )
    .into())
}

pub fn read_manifest(path: &Path) -> Result<RunReport, PipelineError> {
    let bytes = fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use core_types::FailureKind;
    use tempfile::tempdir;

    use crate::report::UnitFailure;

    fn report() -> RunReport {
        let at = Utc.with_ymd_and_hms(2024, 6, 21, 16, 5, 9).unwrap();
        RunReport {
            started_at: at,
            finished_at: at,
            start: NaiveDate::from_ymd_opt(2024, 6, 17).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 6, 21).unwrap(),
            symbols: vec!["NIFTY".to_string()],
            gold: Vec::new(),
            summaries: Vec::new(),
            warnings: Vec::new(),
            failures: vec![UnitFailure {
                unit: "gold 2024-06-18".to_string(),
                kind: FailureKind::MissingInput,
                message: "missing input".to_string(),
            }],
        }
    }

    #[test]
    fn manifests_never_overwrite_each_other() {
        let dir = tempdir().unwrap();
        let first = write_manifest(dir.path(), &report()).unwrap();
        let second = write_manifest(dir.path(), &report()).unwrap();

        assert_eq!(
            first,
            dir.path().join("logs/run_manifests/run_20240621T160509Z.json")
        );
        assert_eq!(
            second,
            dir.path().join("logs/run_manifests/run_20240621T160509Z-1.json")
        );
        let entries: Vec<_> = fs::read_dir(manifest_dir(dir.path()))
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(entries.len(), 2);

        let parsed = read_manifest(&first).unwrap();
        assert_eq!(parsed.failures, report().failures);
        assert!(!parsed.is_success());
    }

    #[test]
    fn failure_kinds_serialize_in_snake_case() {
        let json = serde_json::to_string(&report()).unwrap();
        assert!(json.contains("\"kind\":\"missing_input\""));
    }
}
