//! FRD import and export.
//!
//! FRD (frequency response data) is the plain-text exchange format read by
//! REW and most crossover tools: one point per line, `frequency magnitude
//! [phase]`, whitespace separated, with `*` or `#` comment lines.

use std::fmt::Write as _;
use std::path::Path;

use crate::error::{AnalysisError, Result};
use crate::response::FrequencyResponse;

/// Render a response as FRD text.
///
/// The phase column is written only when the response carries phase. Values
/// use the shortest representation that parses back to the same `f64`.
pub fn to_frd_string(response: &FrequencyResponse) -> String {
    let mut out = String::with_capacity(response.len() * 40 + 64);
    out.push_str("* Frequency response exported by resona\n");
    out.push_str(match response.phases_deg {
        Some(_) => "* Freq(Hz) Magnitude(dB) Phase(deg)\n",
        None => "* Freq(Hz) Magnitude(dB)\n",
    });

    for (i, (f, m)) in response
        .frequencies
        .iter()
        .zip(&response.magnitudes_db)
        .enumerate()
    {
        // Writing into a String cannot fail
        let _ = match response.phases_deg.as_ref().and_then(|p| p.get(i)) {
            Some(p) => writeln!(out, "{f} {m} {p}"),
            None => writeln!(out, "{f} {m}"),
        };
    }
    out
}

/// Parse FRD text into a validated response.
///
/// Phase is kept only when every data row has a third column. Non-numeric
/// lines without a leading number (column headers) are skipped.
pub fn parse_frd(text: &str) -> Result<FrequencyResponse> {
    let mut frequencies = Vec::new();
    let mut magnitudes_db = Vec::new();
    let mut phases_deg = Vec::new();
    let mut all_phase = true;

    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('*') || line.starts_with('#') {
            continue;
        }

        let mut fields = line
            .split(|c: char| c.is_whitespace() || c == ',' || c == ';')
            .filter(|s| !s.is_empty());
        let Some(freq) = fields.next().and_then(|s| s.parse::<f64>().ok()) else {
            continue;
        };
        let mag = fields
            .next()
            .and_then(|s| s.parse::<f64>().ok())
            .ok_or_else(|| AnalysisError::Parse {
                line: idx + 1,
                reason: "missing or invalid magnitude".to_string(),
            })?;

        frequencies.push(freq);
        magnitudes_db.push(mag);
        match fields.next().and_then(|s| s.parse::<f64>().ok()) {
            Some(p) => phases_deg.push(p),
            None => all_phase = false,
        }
    }

    let phases = (all_phase && !frequencies.is_empty()).then_some(phases_deg);
    FrequencyResponse::new(frequencies, magnitudes_db, phases)
}

/// Write a response to an FRD file.
pub fn export_frd(response: &FrequencyResponse, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    std::fs::write(path, to_frd_string(response)).map_err(|e| AnalysisError::io(path, e))
}

/// Read a response from an FRD file.
pub fn import_frd(path: impl AsRef<Path>) -> Result<FrequencyResponse> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| AnalysisError::io(path, e))?;
    let response = parse_frd(&text)?;
    tracing::debug!(path = %path.display(), points = response.len(), "imported FRD");
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_phase_column_only_when_present() {
        let with = FrequencyResponse::new(vec![100.0], vec![-3.0], Some(vec![45.0])).unwrap();
        let without = FrequencyResponse::new(vec![100.0], vec![-3.0], None).unwrap();
        assert!(to_frd_string(&with).ends_with("100 -3 45\n"));
        assert!(to_frd_string(&without).ends_with("100 -3\n"));
    }

    #[test]
    fn parses_rew_style_text() {
        let text = "* Measurement\nFreq(Hz) SPL(dB) Phase(deg)\n20 -6 10\n1000 0 -90\n\n20000 -3 170\n";
        let r = parse_frd(text).unwrap();
        assert_eq!(r.frequencies, vec![20.0, 1000.0, 20000.0]);
        assert_eq!(r.magnitudes_db, vec![-6.0, 0.0, -3.0]);
        assert_eq!(r.phases_deg, Some(vec![10.0, -90.0, 170.0]));
    }

    #[test]
    fn partial_phase_column_is_dropped() {
        let r = parse_frd("20 -6 10\n1000 0\n").unwrap();
        assert_eq!(r.phases_deg, None);
        assert_eq!(r.len(), 2);
    }

    #[test]
    fn missing_magnitude_reports_line() {
        let err = parse_frd("# x\n20 -6\n40\n").unwrap_err();
        assert!(matches!(err, AnalysisError::Parse { line: 3, .. }));
    }

    #[test]
    fn unordered_rows_are_rejected() {
        assert!(matches!(
            parse_frd("1000 0\n20 0\n"),
            Err(AnalysisError::NotIncreasing { .. })
        ));
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ch0.frd");
        let r = FrequencyResponse::new(
            vec![20.0, 1000.0, 20000.0],
            vec![-1.5, 0.1 + 0.2, -3.125],
            Some(vec![0.0, 90.0, -180.0]),
        )
        .unwrap();
        export_frd(&r, &path).unwrap();
        assert_eq!(import_frd(&path).unwrap(), r);
    }
}
