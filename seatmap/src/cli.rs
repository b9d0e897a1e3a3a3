//! Command line front end
//!
//! Every subcommand builds a [`Controller`], loads the places, runs one
//! transition and prints the resulting view plus the notices it produced.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use seatmap_lib::core::config::{ENV_API_URL, ENV_DATA_DIR};
use seatmap_lib::core::render::{AdminTableView, ManagerPanelView, UserListView};
use seatmap_lib::core::{
    AppConfig, BookingRequest, CategoryFilter, Controller, FavoritesStore, LocationTracker, LogMap,
    Notice, RatingRequest, ReplaySource, TrackerOptions,
};
use seatmap_lib::seatmap_client::{ClientConfig, OsrmRouter};
use seatmap_lib::shared::geo::{Coordinate, TravelMode};
use seatmap_lib::shared::models::{CrowdStatus, PlaceId, RatingEntry};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "seatmap")]
#[command(version)]
#[command(about = "Find free seats nearby, book, rate and manage places", long_about = None)]
pub struct Cli {
    /// Places backend base URL
    #[arg(long, global = true, env = ENV_API_URL)]
    pub api_url: Option<String>,

    /// Directory holding favorites, config and logs
    #[arg(long, global = true, env = ENV_DATA_DIR)]
    pub data_dir: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// List places
    Places {
        /// Only this category ("all" for every category)
        #[arg(short, long)]
        category: Option<String>,

        /// Only favorite places
        #[arg(short, long)]
        favorites: bool,

        /// Sort by distance from LAT,LNG
        #[arg(short, long, value_name = "LAT,LNG")]
        near: Option<Coordinate>,

        /// Print the view as JSON
        #[arg(long)]
        json: bool,
    },

    /// Add or remove a favorite
    Favorite { place_id: PlaceId },

    /// Book seats at a place
    Book {
        place_id: PlaceId,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "1")]
        people: u32,
        /// Requested time, e.g. 19:30
        #[arg(long)]
        time: String,
    },

    /// Rate a place and report how crowded it is
    Rate {
        place_id: PlaceId,
        /// 1 to 5
        #[arg(short, long)]
        rating: u8,
        /// busy, free or normal
        #[arg(short, long)]
        status: CrowdStatus,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        comment: Option<String>,
    },

    /// Show the rating history of a place
    Ratings { place_id: PlaceId },

    /// Update the free seats of a place (manager or admin)
    Seats {
        place_id: PlaceId,
        /// New free seat count
        #[arg(allow_negative_numbers = true)]
        free_seats: i64,
        #[command(flatten)]
        credentials: Credentials,
    },

    /// Show the manager panel
    Manager {
        #[command(flatten)]
        credentials: Credentials,
    },

    /// Show the admin table
    Admin {
        #[command(flatten)]
        credentials: Credentials,
    },

    /// Route from a location to a place
    Route {
        place_id: PlaceId,
        #[arg(long, value_name = "LAT,LNG")]
        from: Coordinate,
        /// walk or drive
        #[arg(short, long)]
        mode: Option<TravelMode>,
    },

    /// Replay recorded location fixes towards a place, printing ETA updates
    Track {
        place_id: PlaceId,
        /// JSON list of {"lat": .., "lng": ..}
        #[arg(long)]
        fixes: PathBuf,
        /// Delay between fixes in milliseconds
        #[arg(long, default_value = "1000")]
        interval_ms: u64,
        #[arg(short, long)]
        mode: Option<TravelMode>,
    },
}

#[derive(clap::Args)]
pub struct Credentials {
    #[arg(short, long, env = "SEATMAP_USERNAME")]
    username: String,
    #[arg(short, long, env = "SEATMAP_PASSWORD", hide_env_values = true)]
    password: String,
}

/// Failure already shown to the user as a notice
#[derive(Debug, Error)]
#[error("{0}")]
pub struct Reported(String);

fn reported(e: seatmap_lib::AppError) -> anyhow::Error {
    Reported(e.to_string()).into()
}

/// Prints controller notices as they queue up
struct NoticePrinter(broadcast::Receiver<Notice>);

impl NoticePrinter {
    fn flush(&mut self) {
        while let Ok(notice) = self.0.try_recv() {
            if notice.is_error() {
                eprintln!("{notice}");
            } else {
                println!("{notice}");
            }
        }
    }
}

fn build_controller(config: &AppConfig, data_dir: &Path) -> anyhow::Result<Controller> {
    let api = ClientConfig::new(&config.api_base_url)
        .with_timeout(config.request_timeout_secs)
        .build_http_client()
        .context("Failed to build the HTTP client")?;
    let router = OsrmRouter::new(
        &config.routing_url,
        &config.routing_profile,
        config.request_timeout_secs,
    )
    .context("Failed to build the routing client")?;
    let favorites = FavoritesStore::load(data_dir);

    Ok(Controller::new(
        Arc::new(api),
        Arc::new(router),
        Arc::new(LogMap),
        favorites,
        config.default_travel_mode,
    ))
}

pub async fn run(command: Command, config: AppConfig, data_dir: &Path) -> anyhow::Result<()> {
    let mut controller = build_controller(&config, data_dir)?;
    let mut out = NoticePrinter(controller.subscribe_notices());

    let loaded = controller.refresh().await;
    out.flush();
    loaded.map_err(reported)?;

    match command {
        Command::Places {
            category,
            favorites,
            near,
            json,
        } => {
            if let Some(category) = category {
                controller.set_category_filter(CategoryFilter::parse(&category));
            }
            controller.set_favorites_only(favorites);
            if let Some(here) = near {
                controller.handle_fix(here).await;
                controller.set_near_me(true);
            }
            out.flush();

            let view = controller.user_list();
            if json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                print_user_list(&view, &controller.state().cache().categories());
            }
        }

        Command::Favorite { place_id } => {
            let toggled = controller.toggle_favorite(place_id);
            out.flush();
            if toggled.map_err(reported)? {
                println!("★ Place {place_id} added to favorites");
            } else {
                println!("☆ Place {place_id} removed from favorites");
            }
        }

        Command::Book {
            place_id,
            name,
            people,
            time,
        } => {
            let request = BookingRequest { name, people, time };
            let booking = controller.create_booking(place_id, request).await;
            out.flush();
            let booking = booking.map_err(reported)?;
            println!(
                "Booking for {} ({} people) at {} is {}",
                booking.name, booking.people, booking.time, booking.status
            );
        }

        Command::Rate {
            place_id,
            rating,
            status,
            name,
            comment,
        } => {
            let request = RatingRequest {
                rating,
                status,
                name,
                comment,
            };
            let submitted = controller.submit_rating(place_id, request).await;
            out.flush();
            submitted.map_err(reported)?;
            if let Some(summary) = controller.state().cache().rating(place_id) {
                println!(
                    "Place {place_id}: {:.1} ★ from {} ratings",
                    summary.avg_rating, summary.count
                );
            }
        }

        Command::Ratings { place_id } => {
            let ratings = controller.place_ratings(place_id).await;
            out.flush();
            print_ratings(place_id, &ratings.map_err(reported)?);
        }

        Command::Seats {
            place_id,
            free_seats,
            credentials,
        } => {
            login(&mut controller, &mut out, &credentials).await?;
            let saved = controller.submit_seat_update(place_id, free_seats).await;
            out.flush();
            let place = saved.map_err(reported)?;
            println!(
                "{}: {} / {} seats free",
                place.name, place.free_seats, place.total_seats
            );
        }

        Command::Manager { credentials } => {
            login(&mut controller, &mut out, &credentials).await?;
            let loaded = controller.load_place_bookings().await;
            out.flush();
            loaded.map_err(reported)?;
            match controller.manager_panel() {
                Some(panel) => print_manager_panel(&panel),
                None => println!("Admin accounts use the `admin` command"),
            }
        }

        Command::Admin { credentials } => {
            login(&mut controller, &mut out, &credentials).await?;
            let loaded = controller.load_all_bookings().await;
            out.flush();
            loaded.map_err(reported)?;
            print_admin_table(&controller.admin_table());
        }

        Command::Route {
            place_id,
            from,
            mode,
        } => {
            if let Some(mode) = mode {
                controller.set_travel_mode(mode);
            }
            controller.handle_fix(from).await;
            let shown = controller.select_target(place_id).await;
            out.flush();
            shown.map_err(reported)?;
            if let Some(route) = controller.resolver().active() {
                println!(
                    "{:?} route with {} points",
                    route.kind,
                    route.path.len()
                );
            }
            if let Some(eta) = controller.resolver().eta(controller.state().travel_mode()) {
                println!("{eta}");
            }
        }

        Command::Track {
            place_id,
            fixes,
            interval_ms,
            mode,
        } => {
            if let Some(mode) = mode {
                controller.set_travel_mode(mode);
            }
            let source = ReplaySource::from_json_file(&fixes, Duration::from_millis(interval_ms))
                .map_err(|e| anyhow::anyhow!("{}: {e}", fixes.display()))?;
            let selected = controller.select_target(place_id).await;
            out.flush();
            selected.map_err(reported)?;

            let mut tracker = LocationTracker::new(Arc::new(source), TrackerOptions::default());
            let mut eta = controller.subscribe_eta();
            let done = CancellationToken::new();
            let printer_done = done.clone();
            let printer = tokio::spawn(async move {
                loop {
                    tokio::select! {
                        biased;
                        changed = eta.changed() => {
                            if changed.is_err() {
                                break;
                            }
                            if let Some(label) = *eta.borrow_and_update() {
                                println!("ETA {label}");
                            }
                        }
                        _ = printer_done.cancelled() => break,
                    }
                }
            });

            let cancel = CancellationToken::new();
            let ctrl_c = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    ctrl_c.cancel();
                }
            });

            controller.run_location_loop(&mut tracker, cancel).await;
            done.cancel();
            let _ = printer.await;
            out.flush();

            if let Some(position) = controller.state().location() {
                println!("Last position {position}");
            }
        }
    }

    Ok(())
}

async fn login(
    controller: &mut Controller,
    out: &mut NoticePrinter,
    credentials: &Credentials,
) -> anyhow::Result<()> {
    let result = controller
        .login(&credentials.username, &credentials.password)
        .await;
    out.flush();
    result.map(|_| ()).map_err(reported)
}

fn print_user_list(view: &UserListView, categories: &[String]) {
    if let Some(message) = view.empty_message {
        println!("{message}");
        return;
    }
    if !categories.is_empty() {
        println!("Categories: {}", categories.join(", "));
    }
    for row in &view.rows {
        let star = if row.favorite { "★" } else { " " };
        println!(
            "{star} [{}] {} ({}) - {}",
            row.place_id, row.name, row.category, row.address
        );
        let mut line = format!(
            "    Free seats: {} / {}  {}",
            row.free_seats,
            row.total_seats,
            row.availability.label()
        );
        match row.rating {
            Some(avg) => line.push_str(&format!("  {avg:.1} ★ ({})", row.rating_count)),
            None => line.push_str("  no ratings"),
        }
        if let Some(crowd) = row.crowd {
            line.push_str(&format!("  crowd: {crowd}"));
        }
        if let Some(distance) = row.distance_km {
            line.push_str(&format!("  {distance:.2} km"));
        }
        println!("{line}");
    }
}

fn print_ratings(place_id: PlaceId, ratings: &[RatingEntry]) {
    if ratings.is_empty() {
        println!("No ratings for place {place_id} yet.");
        return;
    }
    for entry in ratings {
        let who = entry.name.as_deref().unwrap_or("anonymous");
        let when = entry
            .created_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        println!("{} ★  {}  {who}  {when}", entry.rating, entry.status);
        if let Some(comment) = &entry.comment {
            println!("    {comment}");
        }
    }
}

fn print_manager_panel(panel: &ManagerPanelView) {
    println!("Manager: {}", panel.username);
    match &panel.editor {
        Some(editor) => println!(
            "[{}] {} ({}) - free seats {} (0..={})",
            editor.place_id, editor.name, editor.category, editor.free_seats, editor.max
        ),
        None => println!("{}", panel.empty_message.unwrap_or_default()),
    }
    if panel.bookings.is_empty() {
        println!("No bookings yet.");
    }
    for booking in &panel.bookings {
        println!(
            "  {} · {} people · {} · {}",
            booking.name, booking.people, booking.time, booking.status
        );
    }
}

fn print_admin_table(table: &AdminTableView) {
    println!(
        "{:>4}  {:<24} {:<12} {:>9} {:>7} {:>7} {:<7} {:>8}",
        "id", "name", "category", "free", "rating", "count", "crowd", "bookings"
    );
    for row in &table.rows {
        let rating = row
            .avg_rating
            .map(|r| format!("{r:.1}"))
            .unwrap_or_else(|| "-".to_string());
        let crowd = row.last_status.map(|s| s.as_str()).unwrap_or("-");
        println!(
            "{:>4}  {:<24} {:<12} {:>4}/{:<4} {:>7} {:>7} {:<7} {:>8}",
            row.place_id,
            row.name,
            row.category,
            row.free_seats,
            row.total_seats,
            rating,
            row.rating_count,
            crowd,
            row.booking_count
        );
    }
    println!("Total bookings: {}", table.total_bookings);
}
