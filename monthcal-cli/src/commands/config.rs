use anyhow::Result;
use monthcal_core::config::MonthcalConfig;
use monthcal_core::presentation::weekday_label;
use owo_colors::OwoColorize;

pub fn run(
    mut config: MonthcalConfig,
    base_url: Option<String>,
    first_day_of_week: Option<u8>,
    timezone: Option<String>,
) -> Result<()> {
    let config_path = MonthcalConfig::config_path()?;
    let changed = base_url.is_some() || first_day_of_week.is_some() || timezone.is_some();

    if let Some(base_url) = base_url {
        config.base_url = base_url;
    }
    if let Some(first_day_of_week) = first_day_of_week {
        config.first_day_of_week = first_day_of_week;
    }
    if let Some(timezone) = timezone {
        config.timezone = Some(timezone).filter(|tz| !tz.is_empty());
    }

    if changed {
        config.validate()?;
        config.save()?;
        println!("{} Saved {}\n", "✓".green(), config_path.display());
    }

    println!("{}", "Paths".bold());
    println!("  Config:     {}", config_path.display());

    println!("\n{}", "Settings".bold());
    println!("  Events:     {}", config.events_url()?);
    println!("  Week start: {}", weekday_label(config.first_day_of_week()?));
    println!(
        "  Timezone:   {}",
        config.timezone.as_deref().unwrap_or("system default")
    );
    println!("  Timeout:    {}s", config.request_timeout_secs);

    Ok(())
}
