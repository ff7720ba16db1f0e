//! Human-readable progress on stdout, one line per file.

use camsync_library::{FileOutcome, FileReport, MediaClass, RunSummary, SkipReason, UploadEvent};
use std::io::Write;
use std::path::PathBuf;

pub struct Reporter<W> {
    out: W,
    /// `DCIM/` of the card, named in the banners.
    dcim: PathBuf,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W, dcim: PathBuf) -> Self {
        Self { out, dcim }
    }

    pub fn event(&mut self, event: &UploadEvent) {
        match event {
            UploadEvent::Started | UploadEvent::IndexFetched { .. } | UploadEvent::PassComplete { .. } => {},
            UploadEvent::PassStarted { class, files } => {
                let kind = match class {
                    MediaClass::Still => "still images",
                    MediaClass::Video => "videos",
                };
                let dcim = self.dcim.display();
                write_line(&mut self.out, format_args!("camsync working on {dcim} with {files} {kind}"))
            },
            UploadEvent::Processed(report) => self.file(report),
            UploadEvent::Complete(summary) => self.summary(summary),
        }
    }

    /// Reason the run stopped, e.g. a card without `DCIM/`.
    pub fn abort(&mut self, reason: &dyn std::fmt::Display) {
        write_line(&mut self.out, format_args!("{reason}, exiting..."))
    }

    fn file(&mut self, report: &FileReport) {
        let out = &mut self.out;
        let file = report.file.path.display();
        match &report.outcome {
            FileOutcome::Uploaded { destination } => write_line(out, format_args!("Upload success {file} → {destination}")),
            FileOutcome::Skipped(SkipReason::Duplicate) => write_line(out, format_args!("Already uploaded {file}")),
            FileOutcome::Skipped(SkipReason::Unreadable(e)) => {
                write_line(out, format_args!("Could not read {file}: {}", &**e))
            },
            FileOutcome::Skipped(SkipReason::Metadata(e)) => {
                write_line(out, format_args!("No usable metadata in {file}: {}", &**e))
            },
            FileOutcome::Failed(e) => write_line(out, format_args!("Upload failed {file}: {}", &**e)),
        }
    }

    fn summary(&mut self, summary: &RunSummary) {
        let RunSummary {
            uploaded,
            duplicates,
            unreadable,
            metadata,
            failed,
        } = summary;
        write_line(
            &mut self.out,
            format_args!(
                "camsync done with {}: {uploaded} uploaded, {duplicates} already uploaded, {unreadable} unreadable, \
                 {metadata} without metadata, {failed} failed",
                self.dcim.display(),
            ),
        )
    }

    #[cfg(test)]
    pub(crate) fn into_inner(self) -> W {
        self.out
    }
}

/// Each line is flushed right away so progress shows up while a large video
/// is still uploading.
///
/// Nobody may be reading: a mount hook can close stdout early. The upload
/// carries on regardless, so a failed write is only logged.
pub(crate) fn write_line(out: &mut impl Write, line: std::fmt::Arguments<'_>) {
    if let Err(e) = writeln!(out, "{line}").and_then(|()| out.flush()) {
        tracing::warn!(error = ?e, %line, "Could not write progress");
    }
}
