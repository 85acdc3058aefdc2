use std::io::BufRead;
use std::thread::{self, JoinHandle};

use anyhow::{anyhow, Context};
use bevy::log::{debug, info, warn};

use crate::tile_system::{FixSink, NavSatFix};

/// Parse a `lat,lon` line in decimal degrees
pub fn parse_fix(line: &str) -> anyhow::Result<NavSatFix> {
    let (latitude, longitude) = line
        .split_once(',')
        .ok_or_else(|| anyhow!("expected `lat,lon`"))?;
    let latitude: f64 = latitude.trim().parse().context("invalid latitude")?;
    let longitude: f64 = longitude.trim().parse().context("invalid longitude")?;
    Ok(NavSatFix { latitude, longitude })
}

/// Forward every fix read from `input` to `sink` until the input ends.
/// Blank lines and `#` comments are skipped.
pub fn forward_fixes(input: impl BufRead, sink: &FixSink) -> usize {
    let mut forwarded = 0;
    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                warn!("Stopped reading fixes: {err}");
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match parse_fix(line) {
            Ok(fix) => {
                if sink.on_coordinate_received(fix).is_ok() {
                    forwarded += 1;
                }
            }
            Err(err) => warn!("Ignoring malformed fix {line:?}: {err:#}"),
        }
    }
    forwarded
}

/// Read fixes from stdin on a background thread
pub fn spawn_stdin_reader(sink: FixSink) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("fix-reader".into())
        .spawn(move || {
            debug!("Reading `lat,lon` fixes from stdin");
            let forwarded = forward_fixes(std::io::stdin().lock(), &sink);
            info!("Fix input closed after {forwarded} fixes");
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile_system::{AerialMapEngine, FetchCoordinator, HttpTileFetcher, LatLon};
    use rstest::rstest;
    use std::io::Cursor;
    use std::sync::Arc;

    #[rstest]
    #[case("37.7749,-122.4194", 37.7749, -122.4194)]
    #[case(" 48.8566 , 2.3522 ", 48.8566, 2.3522)]
    #[case("-33.8688,151.2093", -33.8688, 151.2093)]
    fn parses_decimal_degrees(#[case] line: &str, #[case] latitude: f64, #[case] longitude: f64) {
        assert_eq!(parse_fix(line).unwrap(), NavSatFix { latitude, longitude });
    }

    #[rstest]
    #[case("")]
    #[case("37.7749")]
    #[case("north,east")]
    #[case("37.7749;-122.4194")]
    fn rejects_malformed_lines(#[case] line: &str) {
        assert!(parse_fix(line).is_err());
    }

    #[test]
    fn forwards_valid_fixes_only() {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let fetcher = HttpTileFetcher::openstreetmap().unwrap();
        let engine = AerialMapEngine::new(FetchCoordinator::new(Arc::new(fetcher), runtime.handle().clone()));

        let input = "# recorded drive\n37.7749,-122.4194\n\ngarbage\n89.9,0.0\n37.7750,-122.4194\n";
        let forwarded = forward_fixes(Cursor::new(input), &engine.fix_sink());
        assert_eq!(forwarded, 2);
        assert_eq!(engine.reference(), Some(LatLon::new(37.7749, -122.4194)));
    }
}
