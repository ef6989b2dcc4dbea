use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "hypermail", version, about = "Terminal email client for Resend")]
pub(crate) struct Cli {
    /// Path of the JSON state file.
    #[arg(long = "config", value_name = "PATH")]
    pub(crate) config: Option<PathBuf>,
    /// UI theme: default, nord or gruvbox.
    #[arg(long = "theme", value_name = "NAME")]
    pub(crate) theme: Option<String>,
}

impl Cli {
    /// `--theme`, then `HYPERMAIL_THEME`, then `default`.
    pub(crate) fn theme_name(&self) -> String {
        self.theme
            .clone()
            .or_else(|| std::env::var("HYPERMAIL_THEME").ok())
            .map(|name| name.trim().to_ascii_lowercase())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "default".to_string())
    }
}
