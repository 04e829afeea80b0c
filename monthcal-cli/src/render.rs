//! TUI rendering for month views.
//!
//! Extension traits that draw monthcal-core types as coloured terminal text
//! using owo_colors.

use chrono::Datelike;
use monthcal_core::calendar::MonthView;
use monthcal_core::event::{Event, EventCategory};
use monthcal_core::presentation::{
    CellContent, CellView, category_color, format_time, listing_heading, summary_label,
    weekday_labels,
};
use owo_colors::OwoColorize;

/// Extension trait for TUI rendering with colors.
pub trait Render {
    fn render(&self) -> String;
}

impl Render for EventCategory {
    fn render(&self) -> String {
        let color = category_color(self);
        "■".truecolor(color.r, color.g, color.b).to_string()
    }
}

impl Render for Event {
    fn render(&self) -> String {
        let tag = format!("[{}]", self.category);
        format!(
            "{} {} {} {}",
            self.category.render(),
            format_time(self.start).dimmed(),
            self.title,
            tag.dimmed()
        )
    }
}

/// Width of one day column, in characters.
const CELL_WIDTH: usize = 11;

/// Pad or truncate to exactly `width` characters.
fn fit(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return format!("{:<width$}", text);
    }

    let mut truncated: String = text.chars().take(width.saturating_sub(1)).collect();
    truncated.push('…');
    truncated
}

fn day_line(cell: &CellView) -> String {
    let text = fit(&format!(" {:>2}", cell.date.day()), CELL_WIDTH);

    if cell.is_today {
        text.reversed().bold().to_string()
    } else if !cell.in_month {
        text.dimmed().to_string()
    } else {
        text
    }
}

fn content_line(cell: &CellView) -> String {
    match &cell.content {
        CellContent::Empty => " ".repeat(CELL_WIDTH),
        CellContent::Single { event, color } => fit(&format!(" {}", event.title), CELL_WIDTH)
            .white()
            .on_truecolor(color.r, color.g, color.b)
            .to_string(),
        CellContent::Multiple { count, .. } => fit(&format!(" {}", summary_label(*count)), CELL_WIDTH)
            .bold()
            .to_string(),
    }
}

/// Rendering for a whole month view
pub trait MonthViewRender {
    fn render_grid(&self, today: chrono::NaiveDate) -> String;
    fn render_agenda(&self, today: chrono::NaiveDate) -> String;
}

impl MonthViewRender for MonthView {
    fn render_grid(&self, today: chrono::NaiveDate) -> String {
        let width = CELL_WIDTH * 7 + 6;
        let cells = self.cells(today);
        let mut lines = Vec::new();

        let title = format!("‹  {}  ›", self.month().label());
        lines.push(format!("{:^width$}", title).bold().to_string());

        let headers: Vec<String> = weekday_labels(self.grid())
            .iter()
            .map(|label| fit(&format!(" {}", label), CELL_WIDTH))
            .collect();
        lines.push(headers.join(" ").dimmed().to_string());

        for week in cells.chunks(7) {
            lines.push(week.iter().map(day_line).collect::<Vec<_>>().join(" "));
            lines.push(week.iter().map(content_line).collect::<Vec<_>>().join(" "));
        }

        lines.join("\n")
    }

    fn render_agenda(&self, today: chrono::NaiveDate) -> String {
        let mut lines = Vec::new();

        for cell in self.cells(today).iter().filter(|c| c.in_month) {
            let marker = if cell.is_today { " (today)" } else { "" };

            match &cell.content {
                CellContent::Empty => continue,
                CellContent::Single { event, .. } => {
                    let label = format!("{}{}", cell.date.format("%a %b %-d"), marker);
                    lines.push(label.bold().to_string());
                    lines.push(format!("   {}", event.render()));
                }
                CellContent::Multiple { count, listing } => {
                    let label = format!("{}{}", listing_heading(*count, cell.date), marker);
                    lines.push(label.bold().to_string());
                    lines.extend(listing.iter().map(|event| format!("   {}", event.render())));
                }
            }
        }

        if lines.is_empty() {
            return "No events this month".dimmed().to_string();
        }

        lines.join("\n")
    }
}
