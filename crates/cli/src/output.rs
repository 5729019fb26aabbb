//! Terminal rendering for build reports and plans.
//!
//! Packaged targets, plans and summaries go to stdout. Skipped targets and fatal
//! errors go to stderr. Colors are only used when the stream supports them.

use std::fmt::Display;
use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use clap::ValueEnum;
use owo_colors::{OwoColorize, Stream};

use distrobuild_lib::{BuildReport, Plan};

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
  #[default]
  Text,
  Json,
}

impl OutputFormat {
  pub fn is_json(self) -> bool {
    matches!(self, OutputFormat::Json)
  }
}

/// Leading marker of a status line.
#[derive(Debug, Clone, Copy)]
enum Mark {
  Packaged,
  Skipped,
  Target,
  Fatal,
}

impl Mark {
  fn symbol(self) -> &'static str {
    match self {
      Mark::Packaged => "✓",
      Mark::Skipped => "⚠",
      Mark::Target => "•",
      Mark::Fatal => "✗",
    }
  }

  /// `text` behind this mark. Skipped and fatal lines are colored whole.
  fn line(self, stream: Stream, text: &str) -> String {
    let symbol = self.symbol();
    match self {
      Mark::Packaged => format!("{} {text}", symbol.if_supports_color(stream, |s| s.green())),
      Mark::Target => format!("{} {text}", symbol.if_supports_color(stream, |s| s.blue())),
      Mark::Skipped => format!(
        "{} {}",
        symbol.if_supports_color(stream, |s| s.yellow()),
        text.if_supports_color(stream, |s| s.yellow())
      ),
      Mark::Fatal => format!(
        "{} {}",
        symbol.if_supports_color(stream, |s| s.red()),
        text.if_supports_color(stream, |s| s.red())
      ),
    }
  }
}

fn field(out: &mut impl Write, label: &str, value: impl Display) -> io::Result<()> {
  writeln!(out, "  {}: {value}", label.if_supports_color(Stream::Stdout, |s| s.dimmed()))
}

fn list(out: &mut impl Write, label: &str, items: &[String]) -> io::Result<()> {
  writeln!(out, "  {label}:")?;
  for item in items {
    writeln!(out, "    + {item}")?;
  }
  Ok(())
}

/// Write one line per target and the run summary.
///
/// Packaged targets are written to `out` with the size of their distribution, skipped
/// targets to `err` with the reason.
pub fn write_report(
  out: &mut impl Write,
  err: &mut impl Write,
  report: &BuildReport,
  elapsed: Duration,
) -> io::Result<()> {
  writeln!(out)?;
  for packaged in &report.packaged {
    let mut text = format!("{} -> {}", packaged.target, packaged.output.display());
    if let Ok(metadata) = std::fs::metadata(&packaged.output) {
      text.push_str(&format!(" ({})", size_label(metadata.len())));
    }
    writeln!(out, "{}", Mark::Packaged.line(Stream::Stdout, &text))?;
  }
  for failed in &report.failed {
    let text = format!("{}: {}", failed.target, failed.reason);
    writeln!(err, "{}", Mark::Skipped.line(Stream::Stderr, &text))?;
  }

  writeln!(out)?;
  writeln!(out, "Build complete!")?;
  field(out, "Packaged", report.packaged.len())?;
  field(out, "Failed", report.failed.len())?;
  field(out, "Elapsed", elapsed_label(elapsed))
}

/// Write every planned target with its output, inputs and installer command line.
pub fn write_plan(out: &mut impl Write, plan: &Plan) -> io::Result<()> {
  writeln!(out, "Targets: {}", plan.targets.len())?;
  for target in &plan.targets {
    writeln!(out)?;
    writeln!(out, "{}", Mark::Target.line(Stream::Stdout, &target.target.to_string()))?;
    match &target.output {
      Some(path) => field(out, "Output", path.display())?,
      None => field(out, "Output", "(unsupported base image name)")?,
    }
    list(out, "Install units", &target.install_units)?;
    list(out, "Repositories", &target.repositories)?;
    field(out, "Command", target.command.join(" "))?;
  }
  Ok(())
}

pub fn write_no_targets(out: &mut impl Write, target_dir: &Path) -> io::Result<()> {
  let text = format!("No build targets found in {}", target_dir.display());
  writeln!(out, "{}", Mark::Target.line(Stream::Stdout, &text))
}

pub fn write_json<T: serde::Serialize>(out: &mut impl Write, value: &T) -> anyhow::Result<()> {
  serde_json::to_writer_pretty(&mut *out, value).context("Failed to serialize to JSON")?;
  writeln!(out)?;
  Ok(())
}

/// Print a fatal error to stderr.
pub fn report_error(message: &str) {
  eprintln!("{}", Mark::Fatal.line(Stream::Stderr, message));
}

fn size_label(bytes: u64) -> String {
  const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];

  let mut value = bytes as f64;
  let mut unit = 0;
  while value >= 1024.0 && unit < UNITS.len() - 1 {
    value /= 1024.0;
    unit += 1;
  }

  if unit == 0 {
    format!("{bytes} B")
  } else {
    format!("{value:.1} {}", UNITS[unit])
  }
}

fn elapsed_label(elapsed: Duration) -> String {
  let secs = elapsed.as_secs();
  match secs {
    0 => format!("{}ms", elapsed.as_millis()),
    1..60 => format!("{:.1}s", elapsed.as_secs_f64()),
    _ => format!("{}m {:02}s", secs / 60, secs % 60),
  }
}
