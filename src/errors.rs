// Error types for swingview

use snafu::Snafu;
use std::io;

#[derive(Debug, Snafu)]
pub enum SwingError {
    // Errors talking to the analyzer or the simulated data source
    #[snafu(display("Request to {url} failed"))]
    Transport { url: String, source: reqwest::Error },
    #[snafu(display("Request to {url} returned HTTP {status}"))]
    HttpStatus { url: String, status: u16 },
    #[snafu(display("Response from {url} is not valid JSON"))]
    InvalidJson { url: String, source: reqwest::Error },
    #[snafu(display("Response from {url} has an unexpected shape: {reason}"))]
    UnexpectedShape { url: String, reason: String },
    #[snafu(display("Analyzer reported an error: {message}"))]
    AnalyzerReported { message: String },
    #[snafu(display("Could not build HTTP client"))]
    ClientBuild { source: reqwest::Error },

    // Preference storage errors
    #[snafu(display("Could not find application data directory to save preferences"))]
    NoDataDir,
    #[snafu(display("Preference storage error for key {key}"))]
    StorageIO { key: String, source: io::Error },
    #[snafu(display("Could not encode or decode preference {key}"))]
    StorageSerialize {
        key: String,
        source: serde_json::Error,
    },
    #[snafu(display("Stored value for {key} is not valid: {reason}"))]
    InvalidStoredValue { key: String, reason: String },

    // Config management errors
    #[snafu(display("Error reading or writing config file"))]
    ConfigIOError { source: io::Error },
    #[snafu(display("Error serializing config file"))]
    ConfigSerializeError { source: serde_json::Error },

    // User input validation errors
    #[snafu(display("Invalid user input: {field} - {reason}"))]
    InvalidUserInput { field: String, reason: String },

    // Export errors
    #[snafu(display("Error writing swing export file"))]
    WriterError { source: io::Error },
}
