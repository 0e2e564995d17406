use anyhow::Result;
use clap::ValueEnum;
use colored::{Color, Colorize};
use comfy_table::{Attribute, Cell, Color as TableColor, Table};
use facetnav::SearchResponse;
use serde::Serialize;

/// Status glyph and colour for each kind of message line.
const SUCCESS: (&str, Color) = ("✓", Color::Green);
const INFO: (&str, Color) = ("ℹ", Color::Blue);
const DETAIL: (&str, Color) = ("→", Color::BrightBlack);
const HEADING: Color = Color::BrightBlue;
const SELECTED: &str = "✓";

/// Output format options for CLI commands
#[derive(Clone, Debug, ValueEnum, Default, PartialEq)]
pub enum OutputFormat {
    /// Formatted table output (default)
    #[default]
    Table,
    /// JSON output for scripting
    Json,
    /// Compact single-line output
    Compact,
}

/// Global CLI options that affect output and behavior
#[derive(Clone, Debug, Default)]
pub struct GlobalOptions {
    pub output_format: OutputFormat,
    pub quiet: bool,
    pub verbose: bool,
    pub no_color: bool,
}

/// Data that can be displayed as a table
pub trait TableDisplay {
    fn to_table(&self, options: &GlobalOptions) -> Table;
    fn to_compact(&self) -> String;
}

/// Output manager handles formatting and display
pub struct OutputManager {
    pub options: GlobalOptions,
}

impl OutputManager {
    pub fn new(options: GlobalOptions) -> Self {
        if options.no_color {
            colored::control::set_override(false);
        }
        Self { options }
    }

    /// Display data according to the configured output format
    pub fn display<T>(&self, data: &T) -> Result<()>
    where
        T: Serialize + TableDisplay,
    {
        if self.options.quiet {
            return Ok(());
        }

        match self.options.output_format {
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(data)?;
                println!("{json}");
            }
            OutputFormat::Table => {
                let table = data.to_table(&self.options);
                println!("{table}");
            }
            OutputFormat::Compact => {
                println!("{}", data.to_compact());
            }
        }
        Ok(())
    }

    pub fn success(&self, message: &str) {
        if !self.options.quiet {
            println!("{}", self.decorate(SUCCESS, message));
        }
    }

    pub fn info(&self, message: &str) {
        if !self.options.quiet {
            println!("{}", self.decorate(INFO, message));
        }
    }

    /// Only shown with --verbose
    pub fn verbose(&self, message: &str) {
        if self.options.verbose && !self.options.quiet {
            eprintln!("{}", self.decorate(DETAIL, message));
        }
    }

    pub fn heading(&self, text: &str) {
        if !self.options.quiet {
            let output = if self.options.no_color {
                format!("\n{text}\n{}", "=".repeat(text.len()))
            } else {
                format!("\n{}", text.color(HEADING).bold())
            };
            println!("{output}");
        }
    }

    fn decorate(&self, (icon, color): (&str, Color), message: &str) -> String {
        if self.options.no_color {
            format!("{icon} {message}")
        } else {
            format!("{} {}", icon.color(color), message.color(color))
        }
    }
}

fn header_cell(text: &str, options: &GlobalOptions) -> Cell {
    let cell = Cell::new(text).add_attribute(Attribute::Bold);
    if options.no_color {
        cell
    } else {
        cell.fg(TableColor::Cyan)
    }
}

fn link_cell(link: Option<&str>, options: &GlobalOptions) -> Cell {
    match link {
        Some(link) if options.no_color => Cell::new(format!("?{link}")),
        Some(link) => Cell::new(format!("?{link}")).fg(TableColor::Green),
        None => Cell::new("-"),
    }
}

impl TableDisplay for SearchResponse {
    fn to_table(&self, options: &GlobalOptions) -> Table {
        let mut table = Table::new();
        table.set_header(vec![
            header_cell("Section", options),
            header_cell("Name", options),
            header_cell("Detail", options),
            header_cell("Link", options),
        ]);

        table.add_row(vec![
            Cell::new("hits"),
            Cell::new(self.hits.len()),
            Cell::new(format!("{} total in {}ms", self.total_hit_count, self.duration_ms)),
            Cell::new("-"),
        ]);

        if let Some(pages) = &self.pages {
            let detail = format!("page {} of {}", pages.current, pages.count);
            table.add_row(vec![
                Cell::new("pages"),
                Cell::new("previous"),
                Cell::new(&detail),
                link_cell(pages.previous.as_deref(), options),
            ]);
            table.add_row(vec![
                Cell::new("pages"),
                Cell::new("next"),
                Cell::new(&detail),
                link_cell(pages.next.as_deref(), options),
            ]);
        }

        for option in self.sort_options.iter().flatten() {
            let mut detail = if option.ascending { "asc" } else { "desc" }.to_string();
            if option.selected {
                detail.push_str(&format!(" {SELECTED}"));
            }
            table.add_row(vec![
                Cell::new("sort"),
                Cell::new(&option.name),
                Cell::new(detail),
                link_cell(Some(option.query.as_str()), options),
            ]);
        }

        for (facet, buckets) in &self.buckets {
            if buckets.is_empty() {
                table.add_row(vec![Cell::new(facet), Cell::new("-"), Cell::new(0), Cell::new("-")]);
            }
            for bucket in buckets {
                table.add_row(vec![
                    Cell::new(facet),
                    Cell::new(facetnav::response::bucket_text(&bucket.value)),
                    Cell::new(bucket.count),
                    link_cell(Some(bucket.query.as_str()), options),
                ]);
            }
        }

        table
    }

    fn to_compact(&self) -> String {
        let page = self
            .pages
            .as_ref()
            .map(|pages| format!(" page={}/{}", pages.current, pages.count))
            .unwrap_or_default();
        let sort = self
            .sort_options
            .iter()
            .flatten()
            .find(|option| option.selected)
            .map(|option| format!(" sort={}", option.name))
            .unwrap_or_default();
        format!(
            "hits={}/{}{page}{sort} facets={}",
            self.hits.len(),
            self.total_hit_count,
            self.buckets.len()
        )
    }
}
