//! Conversion of KML into the formats GPSBabel knows about.

use crate::error::{OxPointsError, Result};
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

pub const DEFAULT_GPSBABEL_PATH: &str = "/usr/bin/gpsbabel";
const VERSION_PREFIX: &str = "GPSBabel Version ";

/// A handle on the GPSBabel executable.
#[derive(Debug)]
pub struct GpsBabel {
    path: PathBuf,
    version: OnceCell<String>,
}

impl Default for GpsBabel {
    fn default() -> Self {
        Self::new(DEFAULT_GPSBABEL_PATH)
    }
}

impl GpsBabel {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            version: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Converts `input` from `format_in` to `format_out` by piping it through GPSBabel.
    pub async fn convert(&self, input: &str, format_in: &str, format_out: &str) -> Result<String> {
        if let Some(invalid) = [format_in, format_out]
            .into_iter()
            .find(|format| !is_valid_format(format))
        {
            return Err(OxPointsError::bad_request(format!(
                "Unexpected format {invalid}"
            )));
        }
        debug!(path = %self.path.display(), format_in, format_out, "Running GPSBabel");
        let mut child = Command::new(&self.path)
            .args(["-i", format_in, "-o", format_out, "-f", "-", "-F", "-"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|error| {
                warn!(path = %self.path.display(), %error, "Unable to start GPSBabel");
                OxPointsError::NotImplemented(
                    "Not able to use GPSBabel to produce the desired output.".to_owned(),
                )
            })?;

        // Feed stdin from its own task so a large output cannot block the input.
        let feeder = child.stdin.take().map(|mut stdin| {
            let input = input.as_bytes().to_vec();
            tokio::spawn(async move {
                stdin.write_all(&input).await?;
                stdin.shutdown().await
            })
        });
        let output = child.wait_with_output().await?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            warn!(format_out, stderr = %stderr.trim(), "GPSBabel reported an error");
            return Err(OxPointsError::GpsBabel(format!(
                "GPSBabel conversion to {format_out} gave error:\n{stderr}"
            )));
        }
        if let Some(feeder) = feeder {
            feeder.await.map_err(io::Error::other)??;
        }
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if stdout.is_empty() {
            return Err(OxPointsError::GpsBabel(
                "No output created by GPSBabel".to_owned(),
            ));
        }
        Ok(stdout)
    }

    /// The version reported by `gpsbabel -V`, computed once.
    pub async fn version(&self) -> Result<&str> {
        let version = self
            .version
            .get_or_try_init(|| async {
                let output = Command::new(&self.path).arg("-V").output().await?;
                let stderr = String::from_utf8_lossy(&output.stderr);
                if !stderr.trim().is_empty() {
                    return Err(OxPointsError::GpsBabel(format!(
                        "GPSBabel version query gave error:\n{stderr}"
                    )));
                }
                let stdout = String::from_utf8_lossy(&output.stdout);
                Ok(parse_version(&stdout).to_owned())
            })
            .await?;
        Ok(version)
    }
}

/// Format names may only hold the characters GPSBabel option strings use.
pub fn is_valid_format(format: &str) -> bool {
    !format.is_empty()
        && format
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | ',' | '=' | '.'))
}

fn parse_version(output: &str) -> &str {
    let output = output.trim();
    output.strip_prefix(VERSION_PREFIX).unwrap_or(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_names() {
        assert!(is_valid_format("gpx"));
        assert!(is_valid_format("garmin_txt,date=YYYY.MM.DD"));
        assert!(!is_valid_format(""));
        assert!(!is_valid_format("gpx -F /etc/passwd"));
        assert!(!is_valid_format("gpx;rm"));
    }

    #[test]
    fn version_prefix_is_stripped() {
        assert_eq!(parse_version("GPSBabel Version 1.3.6\n"), "1.3.6");
        assert_eq!(parse_version("1.8.0"), "1.8.0");
    }

    #[tokio::test]
    async fn missing_executable_is_not_implemented() {
        let gpsbabel = GpsBabel::new("/nonexistent/gpsbabel");
        let error = gpsbabel.convert("<kml/>", "kml", "gpx").await.unwrap_err();
        assert_eq!(error.status(), 501);
    }

    #[tokio::test]
    async fn invalid_format_is_rejected_before_running() {
        let gpsbabel = GpsBabel::new("/nonexistent/gpsbabel");
        let error = gpsbabel
            .convert("<kml/>", "kml", "gpx -x")
            .await
            .unwrap_err();
        assert_eq!(error.status(), 400);
    }

    #[tokio::test]
    async fn invalid_input_format_is_named() {
        let gpsbabel = GpsBabel::new("/nonexistent/gpsbabel");
        let error = gpsbabel
            .convert("<kml/>", "kml;rm", "gpx")
            .await
            .unwrap_err();
        assert_eq!(error.status(), 400);
        assert!(error.to_string().contains("kml;rm"));
    }
}
