use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use seatline_core::{FlightFilter, FlightUpdate, NewFlight};
use seatline_inventory::InventoryManager;
use serde_json::{json, Value};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "seatline-admin")]
#[command(version)]
#[command(about = "Manage flight seat inventory", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Apply database migrations
    Migrate,
    #[command(flatten)]
    Inventory(InventoryCommand),
}

/// Commands served by the inventory manager
#[derive(Subcommand)]
pub enum InventoryCommand {
    /// Create a flight with a fresh seat map
    Add {
        #[command(flatten)]
        schedule: ScheduleArgs,
        /// Number of seats (rows of six, A-F)
        #[arg(long)]
        seats: u32,
    },
    /// Change schedule and pricing of a flight
    Update {
        flight_id: Uuid,
        #[command(flatten)]
        schedule: ScheduleArgs,
    },
    /// Delete a flight and all its seats
    Delete { flight_id: Uuid },
    /// List flights
    List {
        /// Only flights with at least one open seat
        #[arg(short, long)]
        available: bool,
    },
    /// Route, schedule and price of a flight
    Details { flight_id: Uuid },
    /// Full flight record including the seat map
    Show { flight_id: Uuid },
    /// Whether a flight has an open seat
    Check { flight_id: Uuid },
    /// Book the next open seat
    Book { flight_id: Uuid },
    /// Release a booked seat
    Cancel { flight_id: Uuid, seat: String },
}

impl InventoryCommand {
    pub fn name(&self) -> &'static str {
        match self {
            InventoryCommand::Add { .. } => "add",
            InventoryCommand::Update { .. } => "update",
            InventoryCommand::Delete { .. } => "delete",
            InventoryCommand::List { .. } => "list",
            InventoryCommand::Details { .. } => "details",
            InventoryCommand::Show { .. } => "show",
            InventoryCommand::Check { .. } => "check",
            InventoryCommand::Book { .. } => "book",
            InventoryCommand::Cancel { .. } => "cancel",
        }
    }
}

#[derive(Args, Clone)]
pub struct ScheduleArgs {
    #[arg(long)]
    pub airline: String,
    #[arg(long)]
    pub origin: String,
    #[arg(long)]
    pub destination: String,
    /// RFC 3339, e.g. 2025-03-14T09:15:00Z
    #[arg(long)]
    pub departure: DateTime<Utc>,
    #[arg(long)]
    pub arrival: DateTime<Utc>,
    /// Price in minor units
    #[arg(long)]
    pub price: i32,
    #[arg(long, default_value = "USD")]
    pub currency: String,
}

impl ScheduleArgs {
    fn into_new_flight(self, total_seats: u32) -> NewFlight {
        NewFlight {
            airline: self.airline,
            origin: self.origin,
            destination: self.destination,
            departure_time: self.departure,
            arrival_time: self.arrival,
            price_amount: self.price,
            price_currency: self.currency,
            total_seats,
        }
    }

    fn into_update(self) -> FlightUpdate {
        FlightUpdate {
            airline: self.airline,
            origin: self.origin,
            destination: self.destination,
            departure_time: self.departure,
            arrival_time: self.arrival,
            price_amount: self.price,
            price_currency: self.currency,
        }
    }
}

/// Execute one inventory command and render its result as JSON
pub async fn run(manager: &InventoryManager, command: InventoryCommand) -> anyhow::Result<Value> {
    let output = match command {
        InventoryCommand::Add { schedule, seats } => {
            serde_json::to_value(manager.add_flight(schedule.into_new_flight(seats)).await?.summary())?
        }
        InventoryCommand::Update { flight_id, schedule } => {
            serde_json::to_value(manager.update_flight(flight_id, schedule.into_update()).await?.summary())?
        }
        InventoryCommand::Delete { flight_id } => {
            serde_json::to_value(manager.delete_flight(flight_id).await?.summary())?
        }
        InventoryCommand::List { available } => {
            let filter = if available {
                FlightFilter::WithAvailableSeats
            } else {
                FlightFilter::All
            };
            serde_json::to_value(manager.list_flights(filter).await?)?
        }
        InventoryCommand::Details { flight_id } => serde_json::to_value(manager.get_flight_details(flight_id).await?)?,
        InventoryCommand::Show { flight_id } => serde_json::to_value(manager.get_flight(flight_id).await?)?,
        InventoryCommand::Check { flight_id } => {
            json!({ "flight_id": flight_id, "available": manager.check_availability(flight_id).await? })
        }
        InventoryCommand::Book { flight_id } => serde_json::to_value(manager.book_seat(flight_id).await?)?,
        InventoryCommand::Cancel { flight_id, seat } => {
            manager.cancel_seat(flight_id, &seat).await?;
            json!({ "flight_id": flight_id, "seat": seat, "status": "Seat cancellation successful!" })
        }
    };

    Ok(output)
}
