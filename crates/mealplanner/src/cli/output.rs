use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// How command results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Pretty,
    /// JSON, one document per command
    Json,
}

impl OutputFormat {
    /// Renders `value` as JSON or through `pretty`.
    pub fn render<T: Serialize>(
        self,
        value: &T,
        pretty: impl FnOnce(&T) -> String,
    ) -> anyhow::Result<String> {
        Ok(match self {
            OutputFormat::Json => serde_json::to_string_pretty(value)?,
            OutputFormat::Pretty => pretty(value),
        })
    }

    pub fn print<T: Serialize>(
        self,
        value: &T,
        pretty: impl FnOnce(&T) -> String,
    ) -> anyhow::Result<()> {
        println!("{}", self.render(value, pretty)?);
        Ok(())
    }
}

/// Renders rows as a rounded-border table with a header line.
pub fn table<R: Tabled>(rows: impl IntoIterator<Item = R>) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}
