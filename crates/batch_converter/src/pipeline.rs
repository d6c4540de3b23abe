//! The per-file pipeline: classify, extract, rewrite, synthesize, write.

use log::{debug, info, warn};
use std::fs;
use std::io::Write;
use std::path::Path;

use code_synthesizer::{GeneratedModule, synthesize};
use prompt_rewriter::{RewrittenPrompt, rewrite_prompt};
use source_extractor::{
    ExtractionBundle, ExtractionWarning, SourceModule, extract, is_already_converted,
    needs_conversion,
};

use crate::pkg_config::ConverterConfig;
use crate::report::{ConvertError, FileReport, FileStatus};

/// Every intermediate product of one conversion.
pub struct Prepared {
    pub bundle: ExtractionBundle,
    pub prompt: RewrittenPrompt,
    pub generated: GeneratedModule,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionOutcome {
    Converted {
        text: String,
        tools: Vec<String>,
        warnings: Vec<ExtractionWarning>,
    },
    AlreadyConverted,
    NotApplicable,
}

/// Run extraction, rewriting and synthesis on source text. No classification.
pub fn prepare(text: &str, cfg: &ConverterConfig) -> Result<Prepared, ConvertError> {
    // Syntax errors stop here, before anything is generated
    let module = SourceModule::parse(text)?;
    let bundle = extract(&module, &cfg.extraction);
    // A missing prompt falls back to the default one
    let prompt = rewrite_prompt(&bundle.prompt_or_default().raw, &bundle.tool_names());
    // Re-parses its own output
    let generated = synthesize(&bundle, &prompt, &cfg.generation)?;
    Ok(Prepared {
        bundle,
        prompt,
        generated,
    })
}

/// Classify and convert source text in memory.
pub fn convert_source(text: &str, cfg: &ConverterConfig) -> Result<ConversionOutcome, ConvertError> {
    // Converted output can still match the framework markers
    if is_already_converted(text) {
        return Ok(ConversionOutcome::AlreadyConverted);
    }
    if !needs_conversion(text) {
        return Ok(ConversionOutcome::NotApplicable);
    }

    let prepared = prepare(text, cfg)?;
    Ok(ConversionOutcome::Converted {
        text: prepared.generated.text,
        tools: prepared.generated.dispatch_keys,
        warnings: prepared.bundle.warnings,
    })
}

/// Convert one file in place. Errors are folded into the report.
pub fn convert_file(path: &Path, cfg: &ConverterConfig, dry_run: bool) -> FileReport {
    let status = match convert_path(path, cfg, dry_run) {
        Ok(status) => status,
        Err(err) => {
            warn!("{}: {}", path.display(), err);
            FileStatus::Failed(err)
        }
    };
    FileReport {
        path: path.to_path_buf(),
        status,
        dry_run,
    }
}

fn convert_path(path: &Path, cfg: &ConverterConfig, dry_run: bool) -> Result<FileStatus, ConvertError> {
    debug!("Processing {}", path.display());
    let text = fs::read_to_string(path).map_err(ConvertError::Read)?;

    match convert_source(&text, cfg)? {
        ConversionOutcome::AlreadyConverted => Ok(FileStatus::AlreadyConverted),
        ConversionOutcome::NotApplicable => Ok(FileStatus::NotApplicable),
        ConversionOutcome::Converted {
            text,
            tools,
            warnings,
        } => {
            // Dry runs classify and report only
            if !dry_run {
                write_atomic(path, &text).map_err(ConvertError::Write)?;
                info!("Converted {} ({} tool(s))", path.display(), tools.len());
            }
            Ok(FileStatus::Converted { tools, warnings })
        }
    }
}

/// Temp file in the target's directory, then rename over the target.
pub fn write_atomic(path: &Path, text: &str) -> std::io::Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    // Same directory as the target so the rename stays on one filesystem
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(text.as_bytes())?;
    tmp.as_file().sync_all()?;
    // Keep the original mode (e.g. executable scripts)
    if let Ok(metadata) = fs::metadata(path) {
        fs::set_permissions(tmp.path(), metadata.permissions())?;
    }
    // Readers see the old file or the new one, never a partial write
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
