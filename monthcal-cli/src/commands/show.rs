use std::path::PathBuf;

use anyhow::Result;
use monthcal_core::config::MonthcalConfig;
use monthcal_core::month::CalendarMonth;

use crate::commands::{display_timezone, load_with_spinner, open_calendar, today};
use crate::render::MonthViewRender;

pub async fn run(config: &MonthcalConfig, month: CalendarMonth, file: Option<PathBuf>) -> Result<()> {
    let today = today(display_timezone(config)?);
    let mut calendar = open_calendar(config, month, file)?;

    // A failed fetch is logged by the calendar and still renders the bare grid
    load_with_spinner(&mut calendar).await;

    let view = calendar.view();
    println!("{}\n", view.render_grid(today));
    println!("{}", view.render_agenda(today));

    Ok(())
}
