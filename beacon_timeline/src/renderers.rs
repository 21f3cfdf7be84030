use core::fmt::Write as _;
use std::{
    io::{BufWriter, Write},
    path::Path,
};

use anyhow::Result;
use chain_tracker::TimelineRenderer;
use fs_err::{File, OpenOptions};
use helper_functions::misc;
use log::{info, warn};
use types::{
    config::ChainConfig,
    nonstandard::{EpochRecord, SlotRecord, TimelineRecord},
    phase0::primitives::Root,
};

/// Logs one line per record.
pub struct LogRenderer {
    chain_config: ChainConfig,
}

impl TimelineRenderer for LogRenderer {
    fn accept_record(&mut self, record: TimelineRecord) {
        match record {
            TimelineRecord::Slot(record) => info!("{}", self.describe_slot(&record)),
            TimelineRecord::Epoch(record) => info!("{}", describe_epoch(&record)),
        }
    }
}

impl LogRenderer {
    #[must_use]
    pub const fn new(chain_config: ChainConfig) -> Self {
        Self { chain_config }
    }

    fn describe_slot(&self, record: &SlotRecord) -> String {
        let SlotRecord {
            slot,
            epoch,
            status,
            finality,
            block_root,
            parent_root,
            ..
        } = record;

        format!(
            "slot {slot} | {} / {} | {:>2} | {status}/{finality} | epoch {epoch}",
            short_root(parent_root.as_ref()),
            short_root(block_root.as_ref()),
            misc::slots_since_epoch_start(&self.chain_config, *slot),
        )
    }
}

fn describe_epoch(record: &EpochRecord) -> String {
    let EpochRecord {
        label,
        kind,
        finality,
        time,
        participation,
        ..
    } = record;

    let mut line = format!("epoch {label} | {kind} | {finality} | {}", time.to_rfc3339());

    if let Some(participation) = participation {
        // Writing to a `String` cannot fail.
        write!(
            line,
            " | participation {:.3} ({}/{} Gwei)",
            participation.global_participation_rate,
            participation.voted_ether,
            participation.eligible_ether,
        )
        .ok();
    }

    line
}

fn short_root(root: Option<&Root>) -> String {
    root.map_or_else(|| "----".to_owned(), Root::short)
}

fn record_label(record: &TimelineRecord) -> String {
    match record {
        TimelineRecord::Slot(record) => format!("slot {}", record.slot),
        TimelineRecord::Epoch(record) => format!("epoch {}", record.epoch),
    }
}

/// Appends every record to a file as one JSON object per line.
pub struct JsonLinesRenderer {
    writer: BufWriter<File>,
}

impl TimelineRenderer for JsonLinesRenderer {
    fn accept_record(&mut self, record: TimelineRecord) {
        if let Err(error) = self.write_record(&record) {
            warn!("could not write record for {}: {error}", record_label(&record));
        }
    }
}

impl JsonLinesRenderer {
    /// Creates `path` if it does not exist.
    pub fn create(path: &Path) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    fn write_record(&mut self, record: &TimelineRecord) -> Result<()> {
        serde_json::to_writer(&mut self.writer, record)?;
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;
    use serde_json::{json, Value};
    use tempfile::NamedTempFile;
    use types::nonstandard::{EpochFinality, EpochRecordKind, SlotFinality, SlotStatus};

    use super::*;

    fn proposed_slot() -> SlotRecord {
        SlotRecord {
            slot: 65,
            epoch: 2,
            status: SlotStatus::Proposed,
            finality: SlotFinality::Justified,
            time: DateTime::UNIX_EPOCH,
            block_root: Some(Root::from_hex("0xabcd0000").expect("root is valid hex")),
            parent_root: Some(Root::from_hex("0x12340000").expect("root is valid hex")),
            parent_slot: Some(64),
        }
    }

    fn missing_slot() -> SlotRecord {
        SlotRecord {
            slot: 66,
            status: SlotStatus::Missing,
            block_root: None,
            parent_root: None,
            parent_slot: None,
            ..proposed_slot()
        }
    }

    fn pending_epoch() -> EpochRecord {
        EpochRecord {
            epoch: 3,
            label: "3".to_owned(),
            kind: EpochRecordKind::Scheduled,
            finality: EpochFinality::Pending,
            time: DateTime::UNIX_EPOCH,
            participation: None,
        }
    }

    #[test]
    fn log_renderer_describes_slots() {
        let renderer = LogRenderer::new(ChainConfig::mainnet());

        assert_eq!(
            renderer.describe_slot(&proposed_slot()),
            "slot 65 | 1234 / abcd |  1 | proposed/justified | epoch 2",
        );
        assert_eq!(
            renderer.describe_slot(&missing_slot()),
            "slot 66 | ---- / ---- |  2 | missing/justified | epoch 2",
        );
    }

    #[test]
    fn log_renderer_describes_epochs() {
        assert_eq!(
            describe_epoch(&pending_epoch()),
            "epoch 3 | scheduled | pending | 1970-01-01T00:00:00+00:00",
        );
    }

    #[test]
    fn records_are_labeled_by_their_own_kind() {
        assert_eq!(record_label(&proposed_slot().into()), "slot 65");
        assert_eq!(record_label(&pending_epoch().into()), "epoch 3");
    }

    #[test]
    fn json_lines_renderer_writes_one_object_per_record() -> Result<()> {
        let file = NamedTempFile::new()?;
        let mut renderer = JsonLinesRenderer::create(file.path())?;

        renderer.accept_record(proposed_slot().into());
        renderer.accept_record(pending_epoch().into());

        let output = fs_err::read_to_string(file.path())?;
        let lines = output.lines().collect::<Vec<_>>();

        assert_eq!(lines.len(), 2);

        let slot = serde_json::from_str::<Value>(lines[0])?;
        let epoch = serde_json::from_str::<Value>(lines[1])?;

        assert_eq!(slot["category"], json!("Blocks"));
        assert_eq!(slot["slot"], json!(65));
        assert_eq!(slot["status"], json!("proposed"));
        assert_eq!(slot["parent_slot"], json!(64));
        assert_eq!(epoch["category"], json!("Epochs"));
        assert_eq!(epoch["kind"], json!("scheduled"));
        assert_eq!(epoch.get("participation"), None);

        Ok(())
    }

    #[test]
    fn json_lines_renderer_appends_to_existing_file() -> Result<()> {
        let file = NamedTempFile::new()?;

        for record in [proposed_slot(), missing_slot()] {
            let mut renderer = JsonLinesRenderer::create(file.path())?;
            renderer.accept_record(record.into());
        }

        let contents = fs_err::read_to_string(file.path())?;

        assert_eq!(contents.lines().count(), 2);

        Ok(())
    }
}
