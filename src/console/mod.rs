//! Interactive console
//!
//! A line-oriented terminal front-end over the record list:
//!
//! - **commands**: parsing of one input line into a `Command`
//! - **render**: table, edit form, and text charts
//!
//! The session loads the store once at start, then drives the list manager,
//! the creation form, and the CSV importer from typed commands.

pub mod commands;
pub mod render;

pub use commands::{ChartKind, Command, CommandError, HELP};

use std::io::{self, Write};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};

use crate::config::ImportConfig;
use crate::form::RecordForm;
use crate::import::{BulkImporter, CsvImporter};
use crate::list::{ChartOptions, DataListManager, Notice};
use crate::records::Field;
use crate::store::RecordStore;

/// Whether the session keeps reading input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Interactive session over one record store
pub struct Console<S: ?Sized> {
    manager: DataListManager<S>,
    form: RecordForm<S>,
    csv: CsvImporter,
    bulk: BulkImporter<S>,
}

impl<S: RecordStore + ?Sized> Console<S> {
    pub fn new(store: Arc<S>, import: &ImportConfig) -> Self {
        Self {
            manager: DataListManager::new(Arc::clone(&store)),
            form: RecordForm::new(Arc::clone(&store)),
            csv: CsvImporter::new(),
            bulk: BulkImporter::new(store).with_max_concurrency(import.max_concurrency),
        }
    }

    pub fn manager(&self) -> &DataListManager<S> {
        &self.manager
    }

    /// Load the records, then read commands until `quit` or end of input
    pub async fn run<R, W>(&mut self, input: R, out: &mut W) -> io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        writeln!(out, "Dengue Data Management")?;
        writeln!(out, "Loading data...")?;
        out.flush()?;
        self.manager.load().await;
        self.show_list(out).await?;
        writeln!(out, "Type `help` for commands.")?;

        let mut lines = input.lines();
        loop {
            write!(out, "> ")?;
            out.flush()?;

            let Some(line) = lines.next_line().await? else {
                break;
            };

            let flow = match line.parse::<Command>() {
                Ok(command) => self.execute(command, &mut lines, out).await?,
                Err(CommandError::Empty) => Flow::Continue,
                Err(e) => {
                    writeln!(out, "{}", e)?;
                    Flow::Continue
                }
            };

            self.show_notices(out).await?;
            if flow == Flow::Quit {
                break;
            }
        }

        Ok(())
    }

    /// Run one command; `lines` feeds prompts such as the `add` form
    pub async fn execute<R, W>(
        &mut self,
        command: Command,
        lines: &mut Lines<R>,
        out: &mut W,
    ) -> io::Result<Flow>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        match command {
            Command::Help => writeln!(out, "{}", HELP)?,
            Command::List => self.show_list(out).await?,
            Command::Search(term) => {
                self.manager.set_search(term).await;
                self.show_list(out).await?;
            }
            Command::Page(page) => self.move_page(self.manager.go_to_page(page).await, out).await?,
            Command::Next => self.move_page(self.manager.next_page().await, out).await?,
            Command::Prev => self.move_page(self.manager.previous_page().await, out).await?,
            Command::Add => self.add(lines, out).await?,
            Command::Edit(id) => match self.manager.begin_edit(&id).await {
                Ok(()) => self.show_list(out).await?,
                Err(e) => writeln!(out, "{}", e)?,
            },
            Command::Set(field, value) => match self.manager.edit_field(field, value).await {
                Ok(()) => self.show_list(out).await?,
                Err(e) => writeln!(out, "{}", e)?,
            },
            Command::Save => {
                writeln!(out, "Updating...")?;
                out.flush()?;
                // Failures are reported through the manager's notice
                if self.manager.commit_edit().await.is_ok() {
                    self.show_list(out).await?;
                }
            }
            Command::Cancel => {
                if self.manager.cancel_edit().await {
                    self.show_list(out).await?;
                } else {
                    writeln!(out, "Nothing is being edited")?;
                }
            }
            Command::Delete(id) => {
                if self.manager.delete(&id).await.is_ok() {
                    self.show_list(out).await?;
                }
            }
            Command::Import { path, dry_run } => {
                let parsed = match self.csv.parse_path(&path) {
                    Ok(parsed) => parsed,
                    Err(e) => {
                        writeln!(out, "Import failed: {}", e)?;
                        return Ok(Flow::Continue);
                    }
                };
                if dry_run {
                    writeln!(out, "{}", render::render_parse_result(&parsed))?;
                    writeln!(out, "(Dry run - no data was imported)")?;
                } else {
                    writeln!(out, "Importing {} rows...", parsed.rows.len())?;
                    out.flush()?;
                    let report = self.bulk.submit(parsed).await;
                    writeln!(out, "{}", render::render_import_report(&report))?;
                    writeln!(out, "Run `refresh` to see imported records in the list.")?;
                }
            }
            Command::Chart(kind) => self.show_charts(kind, out).await?,
            Command::Refresh => match self.manager.refresh().await {
                Ok(_) => self.show_list(out).await?,
                Err(e) => writeln!(out, "Refresh failed: {}", e)?,
            },
            Command::Quit => return Ok(Flow::Quit),
        }

        Ok(Flow::Continue)
    }

    /// Prompt for each field, then submit the form
    async fn add<R, W>(&mut self, lines: &mut Lines<R>, out: &mut W) -> io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        for field in Field::all() {
            let hint = match field {
                Field::Date => " (YYYY-MM-DD)",
                _ => "",
            };
            write!(out, "{}{}: ", field.label(), hint)?;
            out.flush()?;

            match lines.next_line().await? {
                Some(value) => self.form.set_field(*field, value.trim()),
                None => {
                    writeln!(out)?;
                    writeln!(out, "Input closed; record not added")?;
                    return Ok(());
                }
            }
        }

        writeln!(out, "Adding...")?;
        out.flush()?;
        if self.form.submit().await.is_err() {
            if let Some(error) = self.form.error() {
                writeln!(out, "{}", error)?;
            }
        }
        Ok(())
    }

    async fn move_page<W: Write>(&self, moved: bool, out: &mut W) -> io::Result<()> {
        if moved {
            self.show_list(out).await
        } else {
            writeln!(out, "No such page")
        }
    }

    /// The edit form while editing, otherwise the table
    async fn show_list<W: Write>(&self, out: &mut W) -> io::Result<()> {
        if self.manager.is_loading().await {
            return writeln!(out, "Loading data...");
        }

        let search = self.manager.search().await;
        if !search.is_empty() {
            writeln!(out, "Filter: {:?}", search)?;
        }

        match self.manager.editing().await {
            Some(session) => writeln!(out, "{}", render::render_edit_form(&session)),
            None => writeln!(out, "{}", render::render_table(&self.manager.page_view().await)),
        }
    }

    async fn show_charts<W: Write>(&self, kind: ChartKind, out: &mut W) -> io::Result<()> {
        let charts = self.manager.chart_datasets().await;

        if kind == ChartKind::Json {
            let payload = serde_json::json!({
                "bar": { "data": charts.bar, "options": ChartOptions::bar() },
                "scatter": { "data": charts.scatter, "options": ChartOptions::scatter() },
            });
            let text = serde_json::to_string_pretty(&payload).map_err(io::Error::other)?;
            return writeln!(out, "{}", text);
        }

        if matches!(kind, ChartKind::Both | ChartKind::Bar) {
            writeln!(out, "{}", render::render_bar_chart(&charts.bar, &ChartOptions::bar()))?;
        }
        if kind == ChartKind::Both {
            writeln!(out)?;
        }
        if matches!(kind, ChartKind::Both | ChartKind::Scatter) {
            writeln!(
                out,
                "{}",
                render::render_scatter(&charts.scatter, &ChartOptions::scatter())
            )?;
        }
        Ok(())
    }

    async fn show_notices<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        let notices = [self.manager.take_notice().await, self.form.take_notice()];
        for notice in notices.into_iter().flatten() {
            match notice {
                Notice::Success(message) => writeln!(out, "{}", message)?,
                Notice::Alert(message) => writeln!(out, "! {}", message)?,
            }
        }
        Ok(())
    }
}
