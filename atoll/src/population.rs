use std::{
    collections::HashSet,
    fs::{self, File},
    io::{self, BufRead, BufReader},
    path::{Path, PathBuf},
};

use board_api::{Eligibility, EligibilityProbe, OwnerId, PopulationRecord, PopulationScan, ScanError};
use log::warn;
use serde::Deserialize;

/// One json-lines record in the population file.
#[derive(Debug, Deserialize)]
struct PopulationLine {
    entity_id: String,
    score: i64,
    is_owner: bool,
}

/// Population scan backed by a json-lines file. A missing file is an empty
/// population; malformed lines are skipped with a warning.
pub struct FilePopulationScan {
    path: PathBuf,
}

impl FilePopulationScan {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl PopulationScan for FilePopulationScan {
    fn records(&self) -> Result<Box<dyn Iterator<Item = PopulationRecord> + Send + '_>, ScanError> {
        if !self.path.exists() {
            return Ok(Box::new(std::iter::empty()));
        }
        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);
        let records = reader.lines().filter_map(|line| {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    warn!("stopping population read: {err}");
                    return None;
                }
            };
            if line.trim().is_empty() {
                return None;
            }
            match serde_json::from_str::<PopulationLine>(&line) {
                Ok(record) => Some(PopulationRecord {
                    entity_id: record.entity_id,
                    score: record.score,
                    is_owner: record.is_owner,
                }),
                Err(err) => {
                    warn!("skipping malformed population line: {err}");
                    None
                }
            }
        });
        Ok(Box::new(records))
    }
}

/// Owners explicitly barred from the standings. Anyone not listed gets an
/// `Unknown` verdict, which the controller keeps ranked.
pub struct FileDenyList {
    denied: HashSet<OwnerId>,
}

impl FileDenyList {
    pub fn load(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self {
                denied: HashSet::new(),
            });
        }
        let bytes = fs::read(path)?;
        if bytes.is_empty() {
            return Ok(Self {
                denied: HashSet::new(),
            });
        }
        let denied: Vec<OwnerId> = serde_json::from_slice(&bytes).map_err(json_err)?;
        Ok(Self {
            denied: denied.into_iter().collect(),
        })
    }
}

impl EligibilityProbe for FileDenyList {
    fn check(&self, owner: OwnerId) -> Eligibility {
        if self.denied.contains(&owner) {
            Eligibility::Ineligible
        } else {
            Eligibility::Unknown
        }
    }
}

fn json_err(err: serde_json::Error) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use uuid::Uuid;

    #[test]
    fn population_file_parses_and_skips_bad_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("population.jsonl");
        let owner = Uuid::from_u128(7);
        let contents = format!(
            "{{\"entity_id\":\"{owner}\",\"score\":42,\"is_owner\":true}}\n\nnot json\n{{\"entity_id\":\"x\",\"score\":1,\"is_owner\":false}}\n"
        );
        fs::write(&path, contents).unwrap();

        let scan = FilePopulationScan::new(&path);
        let records: Vec<_> = scan.records().unwrap().collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].entity_id, owner.to_string());
        assert_eq!(records[0].score, 42);
        assert!(records[0].is_owner);
        assert!(!records[1].is_owner);
    }

    #[test]
    fn missing_population_file_is_an_empty_population() {
        let dir = tempdir().unwrap();
        let scan = FilePopulationScan::new(dir.path().join("population.jsonl"));
        assert_eq!(scan.records().unwrap().count(), 0);
    }

    #[test]
    fn deny_list_flags_only_listed_owners() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("deny-list.json");
        let barred = Uuid::from_u128(1);
        fs::write(&path, serde_json::to_vec(&vec![barred]).unwrap()).unwrap();

        let probe = FileDenyList::load(&path).unwrap();
        assert_eq!(probe.check(barred), Eligibility::Ineligible);
        assert_eq!(probe.check(Uuid::from_u128(2)), Eligibility::Unknown);
    }

    #[test]
    fn missing_deny_list_bars_nobody() {
        let dir = tempdir().unwrap();
        let probe = FileDenyList::load(dir.path().join("deny-list.json")).unwrap();
        assert_eq!(probe.check(Uuid::from_u128(1)), Eligibility::Unknown);
    }
}
