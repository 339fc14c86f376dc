use std::path::{Path, PathBuf};

use anyhow::Result;
use biopulse_common::Briefing;
use tracing::info;

/// Writes the finished briefing to disk: a stable `latest.json` for
/// consumers plus a dated copy under `archive/`.
pub struct BriefingWriter {
    out_dir: PathBuf,
}

impl BriefingWriter {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    pub fn write(&self, briefing: &Briefing) -> Result<(PathBuf, PathBuf)> {
        let archive_dir = self.out_dir.join("archive");
        std::fs::create_dir_all(&archive_dir)?;

        let json = serde_json::to_string_pretty(briefing)?;

        let latest = self.out_dir.join("latest.json");
        std::fs::write(&latest, &json)?;

        let dated = archive_dir.join(format!("{}.json", briefing.date));
        std::fs::write(&dated, &json)?;

        info!(
            path = %latest.display(),
            items = briefing.items.len(),
            "Briefing saved"
        );
        Ok((latest, dated))
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }
}
