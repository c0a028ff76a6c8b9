//! Choosing which quiz or results file a command should read.

use crate::errors::ConfigError;
use anyhow::Result;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Select;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Number of candidates offered by the interactive picker.
pub const RECENT_LIMIT: usize = 3;

pub trait FileSelector {
    /// Picks one file. `candidates` are sorted newest first.
    fn select(&self, candidates: &[PathBuf]) -> Result<PathBuf>;
}

/// Uses the path given on the command line.
pub struct Explicit(pub PathBuf);

impl FileSelector for Explicit {
    fn select(&self, _candidates: &[PathBuf]) -> Result<PathBuf> {
        if !self.0.is_file() {
            return Err(ConfigError(format!("file not found: {}", self.0.display())).into());
        }
        Ok(self.0.clone())
    }
}

/// Takes the newest candidate without asking.
pub struct MostRecent;

impl FileSelector for MostRecent {
    fn select(&self, candidates: &[PathBuf]) -> Result<PathBuf> {
        candidates
            .first()
            .cloned()
            .ok_or_else(|| ConfigError("no candidate files found".into()).into())
    }
}

/// Asks on the terminal, offering the newest [`RECENT_LIMIT`] candidates.
pub struct Interactive {
    pub prompt: String,
}

impl FileSelector for Interactive {
    fn select(&self, candidates: &[PathBuf]) -> Result<PathBuf> {
        let shown = offered(candidates);
        if shown.is_empty() {
            return Err(ConfigError("no candidate files found".into()).into());
        }
        let labels: Vec<String> = shown.iter().map(|p| p.display().to_string()).collect();
        let idx = Select::with_theme(&ColorfulTheme::default())
            .with_prompt(&self.prompt)
            .items(&labels)
            .default(0)
            .interact()?;
        Ok(shown[idx].clone())
    }
}

/// The candidates the interactive picker shows: the newest [`RECENT_LIMIT`],
/// newest first.
pub fn offered(candidates: &[PathBuf]) -> &[PathBuf] {
    &candidates[..candidates.len().min(RECENT_LIMIT)]
}

/// Lists `*.csv` files under `dir`, newest modification time first.
/// A missing directory yields an empty list.
pub fn csv_files_newest_first(dir: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    let mut found: Vec<(SystemTime, PathBuf)> = Vec::new();
    collect_csv(dir, recursive, &mut found)?;
    found.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
    Ok(found.into_iter().map(|(_, p)| p).collect())
}

fn collect_csv(dir: &Path, recursive: bool, out: &mut Vec<(SystemTime, PathBuf)>) -> Result<()> {
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    };
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        let meta = entry.metadata()?;
        if meta.is_dir() {
            if recursive {
                collect_csv(&path, recursive, out)?;
            }
        } else if path.extension().is_some_and(|e| e == "csv") {
            out.push((meta.modified()?, path));
        }
    }
    Ok(())
}

/// Lists candidates in `dir` and lets `selector` pick one.
pub fn choose_file(selector: &dyn FileSelector, dir: &Path, recursive: bool) -> Result<PathBuf> {
    let candidates = csv_files_newest_first(dir, recursive)?;
    tracing::debug!(
        event = "file_candidates",
        dir = %dir.display(),
        count = candidates.len()
    );
    selector.select(&candidates).map_err(|e| {
        if e.downcast_ref::<ConfigError>().is_some() && candidates.is_empty() {
            ConfigError(format!("no CSV files found in {}", dir.display())).into()
        } else {
            e
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::time::Duration;

    fn touch(path: &Path, age_secs: u64) {
        let f = File::create(path).unwrap();
        let t = SystemTime::now() - Duration::from_secs(age_secs);
        f.set_modified(t).unwrap();
    }

    #[test]
    fn test_newest_first_and_recursive() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        touch(&dir.path().join("old.csv"), 300);
        touch(&dir.path().join("new.csv"), 10);
        touch(&dir.path().join("notes.txt"), 1);
        touch(&dir.path().join("sub/mid.csv"), 100);

        let flat = csv_files_newest_first(dir.path(), false).unwrap();
        assert_eq!(flat.len(), 2);
        assert!(flat[0].ends_with("new.csv"));

        let deep = csv_files_newest_first(dir.path(), true).unwrap();
        let names: Vec<_> = deep
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["new.csv", "mid.csv", "old.csv"]);
    }

    #[test]
    fn test_most_recent_and_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("a.csv"), 50);
        touch(&dir.path().join("b.csv"), 5);
        let picked = choose_file(&MostRecent, dir.path(), false).unwrap();
        assert!(picked.ends_with("b.csv"));

        let err = choose_file(&MostRecent, &dir.path().join("nope"), false).unwrap_err();
        assert!(err.to_string().contains("no CSV files found"));
    }

    #[test]
    fn test_picker_offers_three_newest() {
        let dir = tempfile::tempdir().unwrap();
        for (name, age) in [("e", 500), ("a", 10), ("c", 30), ("b", 20), ("d", 40)] {
            touch(&dir.path().join(format!("{name}.csv")), age);
        }
        let candidates = csv_files_newest_first(dir.path(), false).unwrap();
        assert_eq!(candidates.len(), 5);

        let names: Vec<_> = offered(&candidates)
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.csv", "b.csv", "c.csv"]);
        assert_eq!(offered(&candidates[..2]).len(), 2);
        assert!(offered(&[]).is_empty());
    }

    #[test]
    fn test_explicit_requires_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.csv");
        assert!(Explicit(path.clone()).select(&[]).is_err());
        touch(&path, 0);
        assert_eq!(Explicit(path.clone()).select(&[]).unwrap(), path);
    }
}
