use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{Context, Result};
use dialoguer::Select;
use monthcal_core::calendar::{MonthCalendar, MonthView};
use monthcal_core::config::MonthcalConfig;
use monthcal_core::month::CalendarMonth;
use monthcal_core::source::EventSource;
use owo_colors::OwoColorize;
use url::Url;

use crate::commands::{AnySource, display_timezone, load_with_spinner, open_calendar, today};
use crate::render::MonthViewRender;
use crate::utils::tui::create_spinner;

const ACTIONS: [&str; 4] = ["Next month", "Previous month", "Open an event", "Quit"];

pub async fn run(config: &MonthcalConfig, file: Option<PathBuf>) -> Result<()> {
    let tz = display_timezone(config)?;
    let base_url = config.base_url()?;

    let mut calendar = open_calendar(config, CalendarMonth::containing(today(tz)), file)?;
    load_with_spinner(&mut calendar).await;

    loop {
        let today = today(tz);
        let view = calendar.view();

        println!("\n{}\n", view.render_grid(today));
        println!("{}\n", view.render_agenda(today));

        let links = event_links(view);
        let action = Select::new()
            .with_prompt(view.month().label())
            .items(&ACTIONS)
            .default(0)
            .interact()?;

        match action {
            0 => navigate(&mut calendar, 1).await?,
            1 => navigate(&mut calendar, -1).await?,
            2 => open_event(&base_url, &links)?,
            _ => break,
        }
    }

    Ok(())
}

/// Show the new month's grid state and apply the reply for its ticket.
async fn navigate(calendar: &mut MonthCalendar<AnySource>, delta: i32) -> Result<()> {
    let ticket = calendar.navigate(delta)?;

    let spinner = create_spinner(format!("Fetching events for {}", ticket.month().label()));
    let result = calendar.source().fetch_month(ticket.month()).await;
    spinner.finish_and_clear();

    calendar.apply(ticket, result);
    Ok(())
}

/// (label, detail path) for each event of the month, once per event.
fn event_links(view: &MonthView) -> Vec<(String, String)> {
    let mut seen = HashSet::new();

    view.buckets()
        .iter()
        .filter(|(date, _)| view.grid().cell(*date).is_some_and(|c| c.in_month))
        .flat_map(|(_, events)| events.iter())
        .filter(|event| seen.insert(event.id.clone()))
        .map(|event| {
            let label = format!("{}  {}", event.start.format("%b %-d %H:%M"), event.title);
            (label, event.detail_path())
        })
        .collect()
}

fn open_event(base_url: &Url, links: &[(String, String)]) -> Result<()> {
    if links.is_empty() {
        println!("{}", "No events this month".dimmed());
        return Ok(());
    }

    let labels: Vec<&str> = links.iter().map(|(label, _)| label.as_str()).collect();
    let choice = Select::new()
        .with_prompt("Open which event?")
        .items(&labels)
        .default(0)
        .interact()?;

    let (_, path) = &links[choice];
    let url = base_url
        .join(path)
        .with_context(|| format!("Invalid event link '{}'", path))?;

    if open::that(url.as_str()).is_err() {
        println!("(Could not open browser automatically, please copy the URL below)");
    }
    println!("{}", url);

    Ok(())
}
