//! Output writers for load results.
//!
//! Text output is the execution handoff: each resource's content is written
//! to the stream in request order, ready for whatever interprets it next.
//! JSON output carries the whole outcome for scripting.

use std::io::Write;

use anyhow::{Context, Result};

use crate::cli::OutputFormat;
use crate::key::CacheKey;
use crate::loader::LoadOutcome;

/// Write a load outcome in the requested format.
pub fn write_outcome<W: Write>(
    out: &mut W,
    outcome: &LoadOutcome,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Text => {
            for resource in outcome {
                out.write_all(resource.content.as_bytes())
                    .with_context(|| format!("Failed to write {}", resource.identifier))?;
            }
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, outcome)
                .context("Failed to serialize load outcome")?;
            writeln!(out)?;
        }
    }
    out.flush()?;
    Ok(())
}

/// Write `<key>  <identifier>` lines, one per identifier.
pub fn write_keys<W: Write, I: AsRef<str>>(out: &mut W, identifiers: &[I]) -> Result<()> {
    for identifier in identifiers {
        let identifier = identifier.as_ref();
        writeln!(out, "{}  {}", CacheKey::derive(identifier), identifier)?;
    }
    out.flush()?;
    Ok(())
}
