//! SkyWatch command-line client.
//!
//! Signs in against the SkyWatch API, settles on a location (saved
//! preference, device position, then London) and renders the current
//! conditions and forecast. `dashboard --watch` keeps refreshing until
//! Ctrl-C.

use std::fmt::Display;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use skywatch_app::services::{
    auth_service, dashboard_service, preferences_service, search_service, watchlist_service,
};
use skywatch_app::{AppServices, DashboardView};
use skywatch_core::{AppError, Config, ConfigError};
use skywatch_services::{AddWatchlistRequest, WatchlistResponse};
use skywatch_weather::{format_date, format_temp, format_time, PreferencesUpdate, Units};

/// SkyWatch weather dashboard
#[derive(Parser)]
#[command(name = "skywatch", about = "SkyWatch weather dashboard client", version)]
struct Cli {
    /// Config file to use instead of the platform default.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in and store the session.
    Login {
        username: String,
        /// Read from stdin when omitted.
        #[arg(long)]
        password: Option<String>,
    },
    /// Create an account. Sign in separately afterwards.
    Signup {
        username: String,
        #[arg(long)]
        password: Option<String>,
        #[arg(long)]
        confirm: Option<String>,
    },
    Logout,
    /// Show the signed-in user.
    Whoami,
    /// Exchange the refresh token for a new session.
    Refresh,
    /// Resolve a location and show its weather.
    Dashboard {
        /// Keep refreshing until Ctrl-C.
        #[arg(long)]
        watch: bool,
        /// Highlight an hour of the forecast.
        #[arg(long)]
        hour: Option<usize>,
    },
    /// Show the weather for a city.
    Search {
        city: String,
        /// Also add the result to the watchlist.
        #[arg(long)]
        save: bool,
    },
    Watchlist {
        #[command(subcommand)]
        command: WatchlistCommand,
    },
    #[command(name = "prefs")]
    Preferences {
        #[command(subcommand)]
        command: PreferencesCommand,
    },
}

#[derive(Subcommand)]
enum WatchlistCommand {
    List,
    Add { city: String },
    /// Remove by entry id or city name.
    Remove { entry: String },
    /// Show an entry's weather.
    View { entry: String },
}

#[derive(Subcommand)]
enum PreferencesCommand {
    Show,
    Set {
        #[arg(long)]
        city: Option<String>,
        #[arg(long, value_enum)]
        units: Option<UnitsArg>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum UnitsArg {
    Metric,
    Imperial,
}

impl UnitsArg {
    fn as_api(self) -> &'static str {
        match self {
            Self::Metric => "metric",
            Self::Imperial => "imperial",
        }
    }
}

/// Convert a flow error into its user-facing message, keeping the detail.
fn user_error<E>(err: E) -> anyhow::Error
where
    E: Display,
    AppError: From<E>,
{
    let detail = err.to_string();
    let app = AppError::from(err);
    if app.is_auth_rejection() {
        return anyhow::anyhow!("{} Run `skywatch login`.", app.user_message());
    }
    anyhow::anyhow!("{} ({})", app.user_message(), detail)
}

fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::load_from(&path)?,
        None => Config::load()?,
    };

    let validation = config.validate();
    if !validation.is_valid() {
        return Err(user_error(ConfigError::Invalid(validation.error_summary())));
    }
    for warning in &validation.warnings {
        warn!("Config warning: {}", warning);
    }
    Ok(config)
}

async fn read_secret(prompt: &str, given: Option<String>) -> Result<String> {
    if let Some(value) = given {
        return Ok(value);
    }
    eprint!("{}: ", prompt);
    let mut line = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn wind_unit(units: Units) -> &'static str {
    match units {
        Units::Metric => "m/s",
        Units::Imperial => "mph",
    }
}

fn print_view(view: &DashboardView) {
    if let Err(e) = view.check() {
        eprintln!("{}", user_error(e));
        return;
    }
    let Some(current) = &view.current.data else {
        println!("Loading weather...");
        return;
    };
    let now = &current.data;
    let units = view.units;

    println!();
    if now.country_code.is_empty() {
        println!("{}", now.city_name);
    } else {
        println!("{}, {}", now.city_name, now.country_code);
    }
    println!(
        "  {}  feels like {}  {}",
        format_temp(now.temp, units),
        format_temp(now.feels_like, units),
        now.description
    );
    println!(
        "  Humidity {}%  Wind {:.1} {} {}",
        now.humidity,
        now.wind_speed,
        wind_unit(units),
        now.wind_direction
    );
    if let (Some(rise), Some(set)) = (&now.sunrise, &now.sunset) {
        println!("  Sunrise {}  Sunset {}", format_time(rise), format_time(set));
    }
    println!("  Backdrop: {}", view.backdrop());
    if current.data_source != "live" {
        println!("  (data source: {})", current.data_source);
    }

    let Some(forecast) = &view.forecast.data else {
        return;
    };

    if !forecast.hourly.is_empty() {
        println!("\nHourly");
        for (i, hour) in forecast.hourly.iter().take(12).enumerate() {
            let marker = if view.selection.selected_hour_index == Some(i) {
                '>'
            } else {
                ' '
            };
            println!(
                " {}{:>2}  {:>8}  {:>6}  {}",
                marker,
                i,
                format_time(&hour.timestamp),
                format_temp(hour.temp, units),
                hour.description
            );
        }
    }

    if !forecast.daily.is_empty() {
        println!("\nDaily");
        for day in &forecast.daily {
            println!(
                "  {:<12}  {:>6} / {:<6}  {}",
                format_date(&day.date),
                format_temp(day.temp_high, units),
                format_temp(day.temp_low, units),
                day.description
            );
        }
    }

    for alert in &forecast.alerts {
        println!("\nALERT: {}", alert.title);
        println!("  {}", alert.description);
    }
}

fn print_watchlist(list: &WatchlistResponse) {
    if list.items.is_empty() {
        println!("Watchlist is empty.");
        return;
    }
    for item in &list.items {
        let location = &item.location;
        match &location.country_code {
            Some(country) => println!("{}  {}, {}", item.id, location.city_name, country),
            None => println!("{}  {}", item.id, location.city_name),
        }
    }
}

async fn run(command: Command, services: &Arc<AppServices>) -> Result<()> {
    match command {
        Command::Login { username, password } => {
            let password = read_secret("Password", password).await?;
            let session = auth_service::login(services, &username, &password)
                .await
                .map_err(user_error)?;
            println!(
                "Signed in as {}",
                session.username.as_deref().unwrap_or(&username)
            );
        }
        Command::Signup {
            username,
            password,
            confirm,
        } => {
            let password = read_secret("Password", password).await?;
            let confirm = read_secret("Confirm password", confirm).await?;
            let user = auth_service::signup(services, &username, &password, &confirm)
                .await
                .map_err(user_error)?;
            println!("Created account {}. Run `skywatch login` to sign in.", user.username);
        }
        Command::Logout => {
            auth_service::logout(services);
            println!("Signed out.");
        }
        Command::Whoami => match auth_service::whoami(services) {
            Some(session) => println!(
                "{} ({})",
                session.username.unwrap_or_default(),
                session.role.unwrap_or_else(|| "user".to_string())
            ),
            None => println!("Not signed in."),
        },
        Command::Refresh => {
            auth_service::refresh(services).await.map_err(user_error)?;
            println!("Session refreshed.");
        }
        Command::Dashboard { watch, hour } => {
            let resolution = dashboard_service::bootstrap(services).await;
            info!("Location resolved: {:?}", resolution);

            let mut view = dashboard_service::refresh(services).await;
            if let Some(index) = hour {
                if dashboard_service::select_hour(services, index) {
                    view = dashboard_service::view(services);
                } else {
                    warn!("No forecast hour at index {}", index);
                }
            }
            print_view(&view);

            if watch {
                let handle =
                    dashboard_service::spawn_refresh_loop(services.clone(), |view| print_view(&view));
                tokio::signal::ctrl_c().await?;
                info!("Stopping dashboard");
                services.shutdown().await;
                handle.await?;
            }
        }
        Command::Search { city, save } => {
            let view = search_service::search(services, &city)
                .await
                .map_err(user_error)?;
            print_view(&view);
            if save {
                let item = search_service::save_result(services, &view)
                    .await
                    .map_err(user_error)?;
                println!("\nSaved {} to the watchlist.", item.location.city_name);
            }
        }
        Command::Watchlist { command } => match command {
            WatchlistCommand::List => {
                let list = watchlist_service::list(services).await.map_err(user_error)?;
                print_watchlist(&list);
            }
            WatchlistCommand::Add { city } => {
                let item = watchlist_service::add(services, AddWatchlistRequest::city(city))
                    .await
                    .map_err(user_error)?;
                println!("Added {} ({}).", item.location.city_name, item.id);
            }
            WatchlistCommand::Remove { entry } => {
                let item = watchlist_service::remove(services, &entry)
                    .await
                    .map_err(user_error)?;
                println!("Removed {}.", item.location.city_name);
            }
            WatchlistCommand::View { entry } => {
                let view = watchlist_service::view(services, &entry)
                    .await
                    .map_err(user_error)?;
                print_view(&view);
            }
        },
        Command::Preferences { command } => match command {
            PreferencesCommand::Show => {
                let prefs = preferences_service::load(services)
                    .await
                    .map_err(user_error)?;
                println!("Default city: {}", prefs.city().unwrap_or("(none)"));
                println!("Units: {}", prefs.units);
            }
            PreferencesCommand::Set { city, units } => {
                if city.is_none() && units.is_none() {
                    anyhow::bail!("Nothing to update; pass --city or --units");
                }
                let update = PreferencesUpdate {
                    default_city: city.map(|c| c.trim().to_string()),
                    units: units.map(|u| u.as_api().to_string()),
                    ..Default::default()
                };
                let prefs = preferences_service::update(services, &update)
                    .await
                    .map_err(user_error)?;
                println!(
                    "Saved. Default city: {}, units: {}",
                    prefs.city().unwrap_or("(none)"),
                    prefs.units
                );
            }
        },
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    skywatch_core::init()?;
    let config = load_config(cli.config)?;
    let services = AppServices::from_config(config)?;
    info!("SkyWatch client started");

    let result = run(cli.command, &services).await;

    // Graceful shutdown
    services.shutdown().await;
    result
}
