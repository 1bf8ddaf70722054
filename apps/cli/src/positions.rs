use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

use chrono::{DateTime, Utc};
use presence_app::{PositionError, PositionFix, PositionRequest, PositionSource};
use presence_core::GeoPoint;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct FixLine {
    lat: f64,
    lng: f64,
    #[serde(default)]
    accuracy: f64,
    #[serde(default)]
    timestamp: Option<DateTime<Utc>>,
}

/// Replays fixes from a JSON-lines file, one line per request.
///
/// A `null` line means no fix could be obtained in time. End of file reads as
/// an unavailable signal.
pub struct FilePositionSource {
    lines: Lines<BufReader<File>>,
}

impl FilePositionSource {
    pub fn open(path: &Path) -> std::io::Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            lines: BufReader::new(file).lines(),
        })
    }

    fn next_fix(&mut self) -> Result<PositionFix, PositionError> {
        loop {
            let line = match self.lines.next() {
                Some(Ok(line)) => line,
                Some(Err(err)) => return Err(PositionError::Other(err.to_string())),
                None => return Err(PositionError::Unavailable),
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let parsed: Option<FixLine> = serde_json::from_str(line)
                .map_err(|err| PositionError::Other(format!("bad fix line: {}", err)))?;
            let Some(fix) = parsed else {
                return Err(PositionError::Timeout);
            };
            return Ok(PositionFix {
                point: GeoPoint::new(fix.lat, fix.lng),
                accuracy: fix.accuracy,
                timestamp: fix.timestamp,
            });
        }
    }
}

impl PositionSource for FilePositionSource {
    fn current_position(
        &mut self,
        request: &PositionRequest,
    ) -> Result<PositionFix, PositionError> {
        // a replayed file has no accuracy modes; the low-accuracy retry reads the next line
        tracing::trace!(high_accuracy = request.high_accuracy, "reading next fix");
        self.next_fix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn replays_fixes_gaps_and_end_of_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, r#"{{"lat":30.0444,"lng":31.2357,"accuracy":9.5}}"#).unwrap();
        writeln!(file).unwrap();
        writeln!(file, "null").unwrap();
        writeln!(
            file,
            r#"{{"lat":30.05,"lng":31.24,"timestamp":"2025-03-10T09:01:00Z"}}"#
        )
        .unwrap();
        let mut source = FilePositionSource::open(file.path()).expect("open");
        let request = PositionRequest::HIGH_ACCURACY;

        let first = source.current_position(&request).expect("first fix");
        assert_eq!(first.accuracy, 9.5);
        assert_eq!(first.timestamp, None);
        assert_eq!(
            source.current_position(&request),
            Err(PositionError::Timeout)
        );
        let second = source.current_position(&request).expect("second fix");
        assert!(second.timestamp.is_some());
        assert_eq!(
            source.current_position(&request),
            Err(PositionError::Unavailable)
        );
    }
}
