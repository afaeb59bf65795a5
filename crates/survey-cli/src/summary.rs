use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use polars::prelude::{AnyValue, DataFrame};

use survey_cli::scripts::{ScriptRegistry, ScriptRun};

use crate::types::AnalyzeResult;

pub fn print_summary(result: &AnalyzeResult) {
    if let Some(path) = &result.settings_file {
        println!("Settings: {}", path.display());
    }
    println!(
        "Data: {} ({} participants, {} answers, {} coercion)",
        result.ingest.data_source,
        result.ingest.participants,
        result.ingest.answers,
        result.coercion
    );
    println!(
        "Metadata: {} collections added, {} replaced, {} skipped",
        result.metadata.added.len(),
        result.metadata.replaced.len(),
        result.metadata.skipped.len()
    );
    if !result.ingest.ignored_columns.is_empty() {
        println!("Ignored columns: {}", result.ingest.ignored_columns.join(", "));
    }
    if !result.ingest.truncated_rows.is_empty() {
        let rows: Vec<String> = result
            .ingest
            .truncated_rows
            .iter()
            .map(ToString::to_string)
            .collect();
        println!("Rows wider than the header (extra cells dropped): {}", rows.join(", "));
    }
    print_skipped(result);

    for run in &result.runs {
        for output in &run.outputs {
            println!();
            println!("{}", output.title);
            println!("{}", frame_table(&output.frame));
        }
    }
    println!();
    println!("{}", run_table(&result.runs));
}

fn print_skipped(result: &AnalyzeResult) {
    let ingest = &result.ingest;
    if ingest.skipped_rows.is_empty() && ingest.skipped_cells.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Row / participant"),
        header_cell("Question"),
        header_cell("Reason"),
    ]);
    apply_table_style(&mut table);
    for row in &ingest.skipped_rows {
        table.add_row(vec![
            Cell::new(format!("row {}", row.row)),
            dim_cell("-"),
            Cell::new(&row.reason).fg(Color::Yellow),
        ]);
    }
    for cell in &ingest.skipped_cells {
        table.add_row(vec![
            Cell::new(&cell.participant),
            Cell::new(cell.question.as_str()),
            Cell::new(&cell.reason).fg(Color::Yellow),
        ]);
    }
    println!("Skipped:");
    println!("{table}");
}

fn run_table(runs: &[ScriptRun]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Analysis"),
        header_cell("Tables"),
        header_cell("Time (ms)"),
        header_cell("Status"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    for run in runs {
        let status = match &run.error {
            None => Cell::new("ok").fg(Color::Green).add_attribute(Attribute::Bold),
            Some(message) => Cell::new(format!("failed: {message}")).fg(Color::Red),
        };
        table.add_row(vec![
            Cell::new(run.name).fg(Color::Blue).add_attribute(Attribute::Bold),
            count_cell(run.outputs.len()),
            Cell::new(run.duration_ms),
            status,
        ]);
    }
    table
}

pub fn print_scripts(registry: &ScriptRegistry) {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Analysis"), header_cell("Description")]);
    apply_table_style(&mut table);
    for script in registry.scripts() {
        table.add_row(vec![
            Cell::new(script.name).fg(Color::Blue).add_attribute(Attribute::Bold),
            Cell::new(script.description),
        ]);
    }
    println!("{table}");
}

/// Renders a frame as a terminal table; nulls show as a dimmed dash.
pub fn frame_table(frame: &DataFrame) -> Table {
    let mut table = Table::new();
    table.set_header(
        frame
            .get_column_names()
            .into_iter()
            .map(|name| header_cell(name.as_str()))
            .collect::<Vec<_>>(),
    );
    apply_table_style(&mut table);
    for (index, column) in frame.get_columns().iter().enumerate() {
        if column.dtype().is_primitive_numeric() {
            align_column(&mut table, index, CellAlignment::Right);
        }
    }
    for row in 0..frame.height() {
        let cells: Vec<Cell> = frame
            .get_columns()
            .iter()
            .map(|column| match column.get(row) {
                Ok(value) => value_cell(&value),
                Err(_) => dim_cell("?"),
            })
            .collect();
        table.add_row(cells);
    }
    table
}

fn value_cell(value: &AnyValue<'_>) -> Cell {
    match value {
        AnyValue::Null => dim_cell("-"),
        AnyValue::String(text) => Cell::new(text),
        AnyValue::StringOwned(text) => Cell::new(text.as_str()),
        AnyValue::Float64(number) => Cell::new(format!("{number:.2}")),
        AnyValue::Boolean(flag) => Cell::new(flag),
        other => Cell::new(other),
    }
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn count_cell(count: usize) -> Cell {
    if count > 0 {
        Cell::new(count).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
