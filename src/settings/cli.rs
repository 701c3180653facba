use super::Parser;

/// Relationship and notification core.
#[derive(Parser, Debug)]
#[command(name = "rapport", version)]
pub struct Cli {
    /// Settings file; defaults to the file of the build profile.
    #[arg(long)]
    pub settings: Option<String>,
    /// Listen address, overriding `http.address`.
    #[arg(long)]
    pub address: Option<String>,
}
