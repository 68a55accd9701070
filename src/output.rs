//! Presentation of query results, as text tables or JSON

use crate::{
    flip::{GenderSplits, NameFlips},
    popularity::{PopularityChange, ShareSeries},
    regions,
    top::{GenderTop, PerGroupTop},
    Result,
};
use anyhow::Context;
use serde::Serialize;
use std::fmt::{self, Display, Write as _};
use tokio::io::{self, AsyncWriteExt, BufWriter};

/// Width of name columns in text output
const NAME_WIDTH: usize = 15;

/// Destination of query results
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Output {
    /// Truth that results should be emitted as JSON
    json: bool,
}
//
impl Output {
    /// Set up result output
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    /// Write a query result to stdout
    pub async fn emit<T: Serialize + Display>(&self, value: &T) -> Result<()> {
        let text = self.render(value)?;
        let mut stdout = BufWriter::new(io::stdout());
        stdout
            .write_all(text.as_bytes())
            .await
            .context("writing results to stdout")?;
        stdout.flush().await.context("flushing stdout")?;
        Ok(())
    }

    /// Format a query result, ending with a newline
    fn render<T: Serialize + Display>(&self, value: &T) -> Result<String> {
        let mut text = if self.json {
            serde_json::to_string_pretty(value).context("converting results to JSON")?
        } else {
            value.to_string()
        };
        if !text.ends_with('\n') {
            text.push('\n');
        }
        Ok(text)
    }
}

impl Display for GenderTop<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>4}  {:<NAME_WIDTH$} {:>9}  {:<NAME_WIDTH$} {:>9}",
            "Rank", "Female", "Count", "Male", "Count"
        )?;
        let num_rows = self.female.len().max(self.male.len());
        for row in 0..num_rows {
            write!(f, "{:>4}", row + 1)?;
            for ranking in [&self.female, &self.male] {
                match ranking.get(row) {
                    Some(entry) => write!(f, "  {:<NAME_WIDTH$} {:>9}", entry.key, entry.count)?,
                    None => write!(f, "  {:<NAME_WIDTH$} {:>9}", "-", "")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl Display for PerGroupTop<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for group in &self.groups {
            writeln!(f, "{}", group.group)?;
            for (idx, slot) in group.slots.iter().enumerate() {
                let Some(entry) = slot else {
                    writeln!(f, "  {:>3}. -", idx + 1)?;
                    continue;
                };
                let mut key = String::new();
                for value in entry.key.iter() {
                    if !key.is_empty() {
                        key.push(' ');
                    }
                    write!(key, "{value}")?;
                }
                writeln!(f, "  {:>3}. {key:<24} {:>9}", entry.rank, entry.count)?;
            }
        }
        Ok(())
    }
}

impl Display for PopularityChange<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (Some(from), Some(to)) = (self.from_year, self.to_year) else {
            return writeln!(f, "No data");
        };
        writeln!(f, "Share of births, {from} -> {to}")?;
        for (title, entries) in [("Gainers", &self.gainers), ("Decliners", &self.decliners)] {
            writeln!(f, "\n{title}")?;
            for entry in entries {
                writeln!(
                    f,
                    "  {:<NAME_WIDTH$} {:>5.1}% -> {:>5.1}% ({:+.1})",
                    entry.name, entry.percent_from, entry.percent_to, entry.delta
                )?;
            }
        }
        Ok(())
    }
}

impl Display for NameFlips<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (Some(from), Some(to)) = (self.from_year, self.to_year) else {
            return writeln!(f, "No data");
        };
        writeln!(f, "Proportion of boys, {from} -> {to}")?;
        for entry in &self.entries {
            writeln!(
                f,
                "  {:<NAME_WIDTH$} {:.3} -> {:.3} ({:+.3})",
                entry.name, entry.proportion_male_from, entry.proportion_male_to, entry.delta
            )?;
        }
        Ok(())
    }
}

impl Display for GenderSplits<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<NAME_WIDTH$} {:>9} {:>9} {:>6}",
            "Name", "Male", "Female", "%Male"
        )?;
        for split in &self.0 {
            writeln!(
                f,
                "{:<NAME_WIDTH$} {:>9} {:>9} {:>6.3}",
                split.name, split.male_count, split.female_count, split.proportion_male
            )?;
        }
        Ok(())
    }
}

impl Display for ShareSeries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Share of births named {}", self.name)?;
        if let Some(code) = &self.region {
            let region = regions::get(code).map_or(&**code, |region| region.name);
            write!(f, " in {region}")?;
        }
        if let Some(gender) = &self.gender {
            write!(f, " among gender {gender}")?;
        }
        writeln!(f)?;
        for point in &self.points {
            writeln!(f, "  {} {:>8.4}%", point.year, point.percent)?;
        }
        Ok(())
    }
}
