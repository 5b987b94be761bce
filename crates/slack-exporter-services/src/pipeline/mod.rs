//! Export pipeline: reads every entry of the input archive in order, passes
//! it through or hands it to the active rewriter, and writes the result to
//! the output archive.
//!
//! Processing is strictly sequential. Entries produced by a rewriter are
//! written as they are produced, directly after the entry they came from.

mod report;

pub use report::RunReport;

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use slack_exporter_api_client::ResourceFetcher;
use slack_exporter_archive::{ArchiveEntry, ArchiveReader, ArchiveWriter, EntryHeader};
use slack_exporter_core::{ExportConfig, ExportError, ExportMode, ExportResult, Severity};

use crate::rewrite::{AttachmentRewriter, Disposition, EmailRewriter, EntryRewriter, EntrySink};

/// Writes rewriter output straight into the output archive.
struct OutputSink<'a> {
    writer: &'a mut ArchiveWriter,
}

impl EntrySink for OutputSink<'_> {
    fn contains(&self, name: &str) -> bool {
        self.writer.contains(name)
    }

    fn add(&mut self, entry: ArchiveEntry) -> ExportResult<()> {
        self.writer
            .write_entry(&entry.name, &entry.metadata, &entry.content)?;
        Ok(())
    }
}

pub struct ExportPipeline {
    rewriter: Box<dyn EntryRewriter>,
}

impl ExportPipeline {
    pub fn new(rewriter: Box<dyn EntryRewriter>) -> Self {
        Self { rewriter }
    }

    /// Validate `config` and build the pipeline for its mode.
    pub fn for_config(
        config: &ExportConfig,
        fetcher: Arc<dyn ResourceFetcher>,
    ) -> ExportResult<Self> {
        config.validate()?;

        let rewriter: Box<dyn EntryRewriter> = match &config.mode {
            ExportMode::FetchAttachments { token } => {
                Box::new(AttachmentRewriter::new(fetcher, token.clone()))
            }
            ExportMode::FetchEmails { token } => {
                let token = token.clone().ok_or_else(|| {
                    ExportError::MissingCredential("fetch-emails requires --api-token".to_string())
                })?;
                Box::new(EmailRewriter::new(fetcher, token))
            }
        };

        Ok(Self::new(rewriter))
    }

    pub fn mode(&self) -> &'static str {
        self.rewriter.name()
    }

    /// Run over `input`, writing `output`.
    ///
    /// The input is opened before the output is created, so an unreadable
    /// input leaves nothing on disk. A run-level error stops processing
    /// immediately and leaves a partial output archive behind.
    pub async fn run(&mut self, input: &Path, output: &Path) -> ExportResult<RunReport> {
        let start = Instant::now();
        let mut report = RunReport::default();

        let mut reader = ArchiveReader::open(input)?;
        let mut writer = ArchiveWriter::create(output)?;

        tracing::info!(
            mode = self.mode(),
            input = %input.display(),
            output = %output.display(),
            entries = reader.len(),
            "Starting export"
        );

        for index in 0..reader.len() {
            let header = reader.header(index)?;
            report.entries_read += 1;
            tracing::info!(entry = %header.name, "Processing file");

            if writer.contains(&header.name) {
                tracing::warn!(entry = %header.name, "Entry already in output archive, skipping");
                report.duplicates_skipped += 1;
                continue;
            }

            if !self.rewriter.selects(&header.name) {
                writer.copy_raw(&mut reader, &header)?;
                report.entries_copied += 1;
                continue;
            }

            self.rewrite_entry(&mut reader, &mut writer, &header, &mut report)
                .await?;
        }

        if let Err(e) = writer.seal() {
            tracing::error!(
                output = %output.display(),
                error = %e,
                "Failed to close the output archive"
            );
            return Err(ExportError::Seal(e.to_string()));
        }

        report.duration = start.elapsed();
        tracing::info!(
            duration_ms = report.duration.as_secs_f64() * 1000.0,
            attachments_added = report.attachments_added,
            items_skipped = report.items_skipped,
            "Export finished"
        );

        Ok(report)
    }

    async fn rewrite_entry(
        &mut self,
        reader: &mut ArchiveReader,
        writer: &mut ArchiveWriter,
        header: &EntryHeader,
        report: &mut RunReport,
    ) -> ExportResult<()> {
        let disposition = self.rewriter.disposition();
        if disposition == Disposition::Keep {
            writer.copy_raw(reader, header)?;
            report.entries_copied += 1;
        }

        let entry = reader.read(header)?;
        let mut sink = OutputSink {
            writer: &mut *writer,
        };

        let rewrite = match self.rewriter.rewrite(&entry, &mut sink).await {
            Ok(rewrite) => rewrite,
            Err(e) if e.severity() == Severity::Item => {
                tracing::warn!(entry = %header.name, error = %e, "Skipping entry");
                report.entries_skipped += 1;
                return Ok(());
            }
            Err(e) => {
                tracing::error!(entry = %header.name, error = %e, "Aborting export");
                return Err(e);
            }
        };
        report.absorb(&rewrite.stats);

        if disposition == Disposition::Replace {
            match rewrite.replacement {
                Some(content) => {
                    writer.replace_entry(reader, header, &content)?;
                    report.entries_rewritten += 1;
                }
                None => {
                    writer.copy_raw(reader, header)?;
                    report.entries_copied += 1;
                }
            }
        }

        Ok(())
    }
}

/// Build the pipeline for `config` and run it.
pub async fn run_export(
    config: &ExportConfig,
    fetcher: Arc<dyn ResourceFetcher>,
) -> ExportResult<RunReport> {
    let mut pipeline = ExportPipeline::for_config(config, fetcher)?;
    pipeline
        .run(&config.input_archive, &config.output_archive)
        .await
}
