//! CSV export of pass history

use chrono::{DateTime, Utc};
use passpilot_api::{ExportRow, Pass};
use passpilot_client::PassSource;
use passpilot_util::{PassPilotError, Result, SchoolId, format_timestamp};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::service::upstream_error;
use crate::{DurationQuality, assess_duration, export_duration};

/// Outcome of an export run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub rows: usize,
    /// Rows whose duration data looked inconsistent
    pub flagged: usize,
}

/// Build the export row for a pass
pub fn export_row(pass: &Pass) -> ExportRow {
    ExportRow {
        pass_id: pass.id.clone(),
        student_name: pass.student_name.clone(),
        destination: pass.destination.clone(),
        issued_by: pass.issued_by.clone(),
        issued_at: pass.issued_at,
        returned_at: pass.returned_at,
        duration_minutes: export_duration(pass),
    }
}

/// Write `passes` as CSV (header line first)
pub fn write_csv<W: Write>(out: W, passes: &[Pass]) -> Result<ExportSummary> {
    let mut out = BufWriter::new(out);
    let mut flagged = 0;

    write_record(&mut out, ExportRow::HEADERS.iter().map(|h| h.to_string()))?;

    for pass in passes {
        let quality = assess_duration(pass);
        if !quality.is_consistent() {
            flagged += 1;
            log_quality(pass, quality);
        }

        let row = export_row(pass);
        write_record(
            &mut out,
            [
                row.pass_id.to_string(),
                row.student_name,
                row.destination.unwrap_or_default(),
                row.issued_by.unwrap_or_default(),
                row.issued_at.as_ref().map(format_timestamp).unwrap_or_default(),
                row.returned_at.as_ref().map(format_timestamp).unwrap_or_default(),
                row.duration_minutes.map(|m| m.to_string()).unwrap_or_default(),
            ]
            .into_iter(),
        )?;
    }

    out.flush().map_err(|e| PassPilotError::export(e.to_string()))?;

    Ok(ExportSummary {
        rows: passes.len(),
        flagged,
    })
}

/// Default file name for an export taken at `now`
pub fn export_file_name(scope: &SchoolId, now: DateTime<Utc>) -> String {
    format!("passes-{}-{}.csv", scope, now.format("%Y%m%d-%H%M%S"))
}

/// Fetch the full pass history for `scope` and write it to `path`
pub async fn export_history(
    source: &dyn PassSource,
    scope: &SchoolId,
    path: &Path,
) -> Result<ExportSummary> {
    let passes = source
        .fetch_passes(scope)
        .await
        .map_err(|e| upstream_error(scope, e))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| PassPilotError::export(format!("{}: {}", parent.display(), e)))?;
    }

    let file = File::create(path)
        .map_err(|e| PassPilotError::export(format!("{}: {}", path.display(), e)))?;
    let summary = write_csv(file, &passes)?;

    info!(
        school_id = %scope,
        path = %path.display(),
        rows = summary.rows,
        flagged = summary.flagged,
        "Pass history exported"
    );

    Ok(summary)
}

/// Where an export lands when only a directory is configured
pub fn default_export_path(dir: &Path, scope: &SchoolId, now: DateTime<Utc>) -> PathBuf {
    dir.join(export_file_name(scope, now))
}

fn log_quality(pass: &Pass, quality: DurationQuality) {
    match quality {
        DurationQuality::ClockSkew { raw_minutes } => warn!(
            pass_id = %pass.id,
            raw_minutes,
            "Pass returned before it was issued; reporting minimum duration"
        ),
        DurationQuality::StoredMismatch { stored, computed } => warn!(
            pass_id = %pass.id,
            stored,
            computed,
            "Stored duration disagrees with timestamps; reporting computed value"
        ),
        DurationQuality::Consistent => {}
    }
}

fn write_record<W: Write>(out: &mut W, fields: impl Iterator<Item = String>) -> Result<()> {
    let line = fields.map(|f| escape_field(&f)).collect::<Vec<_>>().join(",");
    writeln!(out, "{}", line).map_err(|e| PassPilotError::export(e.to_string()))
}

/// Quote a field when it contains a delimiter, quote or line break
fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use passpilot_client::MockPassSource;
    use passpilot_util::{PassId, parse_timestamp};

    fn pass(id: &str, name: &str, returned: Option<&str>, stored: Option<i64>) -> Pass {
        Pass {
            id: PassId::new(id),
            student_name: name.into(),
            issued_at: parse_timestamp("2025-08-18T20:19:59.196Z"),
            returned_at: returned.and_then(parse_timestamp),
            expires_at: None,
            stored_duration: stored,
            destination: Some("Library".into()),
            issued_by: None,
        }
    }

    #[test]
    fn open_pass_exports_empty_duration() {
        let row = export_row(&pass("p-1", "Avery", None, Some(45)));
        assert_eq!(row.duration_minutes, None);
    }

    #[test]
    fn csv_layout() {
        let passes = vec![
            pass("p-1", "Avery", Some("2025-08-18T22:37:58.451Z"), Some(138)),
            pass("p-2", "Chen, Jordan", None, Some(45)),
        ];

        let mut buf = Vec::new();
        let summary = write_csv(&mut buf, &passes).unwrap();
        assert_eq!(summary, ExportSummary { rows: 2, flagged: 0 });

        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "pass_id,student_name,destination,issued_by,issued_at,returned_at,duration_minutes"
        );
        assert_eq!(
            lines[1],
            "p-1,Avery,Library,,2025-08-18T20:19:59.196Z,2025-08-18T22:37:58.451Z,138"
        );
        assert_eq!(
            lines[2],
            "p-2,\"Chen, Jordan\",Library,,2025-08-18T20:19:59.196Z,,"
        );
    }

    #[test]
    fn inconsistent_rows_are_counted() {
        let passes = vec![
            pass("p-1", "Avery", Some("2025-08-18T22:37:58.451Z"), Some(12)),
            pass("p-2", "Jordan", Some("2025-08-18T20:00:00Z"), None),
        ];
        let summary = write_csv(Vec::new(), &passes).unwrap();
        assert_eq!(summary.flagged, 2);
    }

    #[test]
    fn escape_quotes() {
        assert_eq!(escape_field("plain"), "plain");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_field("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn file_name_includes_scope_and_time() {
        let now = parse_timestamp("2025-08-18T20:19:59Z").unwrap();
        assert_eq!(
            export_file_name(&SchoolId::new("lincoln-high"), now),
            "passes-lincoln-high-20250818-201959.csv"
        );
    }

    #[tokio::test]
    async fn export_history_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.csv");
        let scope = SchoolId::new("lincoln-high");

        let source = MockPassSource::new();
        source.set_passes(
            &scope,
            vec![pass("p-1", "Avery", Some("2025-08-18T22:37:58.451Z"), None)],
        );

        let summary = export_history(&source, &scope, &path).await.unwrap();
        assert_eq!(summary.rows, 1);

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.trim_end().ends_with(",138"));
    }

    #[tokio::test]
    async fn export_history_reports_upstream_failure() {
        let dir = tempfile::tempdir().unwrap();
        let source = MockPassSource::new();
        source.set_failure(Some("offline"));

        let err = export_history(&source, &SchoolId::new("s1"), &dir.path().join("out.csv"))
            .await
            .unwrap_err();
        assert!(matches!(err, PassPilotError::UpstreamError(_)));
    }
}
