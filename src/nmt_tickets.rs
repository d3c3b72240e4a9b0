// Tickets, fares and the purchase log
//
// A ticket is derived once from a found route and never changes. The session
// keeps every ticket bought during this run; saving appends the ones not yet
// written to a CSV log:
//
//   TicketID,From,To,Stops,Fare
//   PU1A2B3C4DGR,Whitefield (Kadugodi),Lalbagh,18,180

use crate::nmt_models::{MetroNetwork, NMTError, Result, StationId};
use crate::nmt_search::Route;
use chrono::{DateTime, Local};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const DEFAULT_FARE_PER_STOP: u32 = 10;

// ============================================================================
// Fares
// ============================================================================

/// Flat per-stop tariff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tariff {
    pub fare_per_stop: u32,
}

impl Default for Tariff {
    fn default() -> Self {
        Tariff {
            fare_per_stop: DEFAULT_FARE_PER_STOP,
        }
    }
}

impl Tariff {
    pub fn new(fare_per_stop: u32) -> Self {
        Tariff { fare_per_stop }
    }

    pub fn fare_for(&self, stops: usize) -> u32 {
        u32::try_from(stops)
            .unwrap_or(u32::MAX)
            .saturating_mul(self.fare_per_stop)
    }
}

// ============================================================================
// Tickets
// ============================================================================

#[derive(Debug, Clone)]
pub struct Ticket {
    ticket_id: String,
    start: StationId,
    end: StationId,
    stops: usize,
    fare: u32,
    route: Route,
    purchased_at: DateTime<Local>,
}

impl Ticket {
    /// Derive a ticket from a route found between `start` and `end`.
    pub fn issue(
        network: &MetroNetwork,
        start: StationId,
        end: StationId,
        route: Route,
        tariff: &Tariff,
    ) -> Result<Ticket> {
        if route.is_empty() {
            return Err(NMTError::NoRoute {
                from: network.station_name(start).to_string(),
                to: network.station_name(end).to_string(),
            });
        }

        if start == end {
            return Err(NMTError::SameStation(network.station_name(start).to_string()));
        }

        let stops = route.stops();
        let fare = tariff.fare_for(stops);
        let ticket_id = Self::generate_id(network, &route, start, end);

        debug!(
            "Issued {} for {} -> {} ({} stops, fare {})",
            ticket_id,
            network.station_name(start),
            network.station_name(end),
            stops,
            fare
        );

        Ok(Ticket {
            ticket_id,
            start,
            end,
            stops,
            fare,
            route,
            purchased_at: Local::now(),
        })
    }

    /// Start line prefix + random hex block + end line prefix, e.g. `PU1A2B3C4DGR`.
    fn generate_id(network: &MetroNetwork, route: &Route, start: StationId, end: StationId) -> String {
        let legs = route.legs();

        let start_line = match legs.first() {
            Some(leg) => network.line_color(leg.line),
            None => network.station(start).map(|s| s.line.as_str()).unwrap_or(""),
        };
        let end_line = match legs.last() {
            Some(leg) => network.line_color(leg.line),
            None => network.station(end).map(|s| s.line.as_str()).unwrap_or(""),
        };

        let unique = Uuid::new_v4().simple().to_string();

        format!(
            "{}{}{}",
            line_prefix(start_line),
            unique[..8].to_uppercase(),
            line_prefix(end_line)
        )
    }

    pub fn id(&self) -> &str {
        &self.ticket_id
    }

    pub fn start(&self) -> StationId {
        self.start
    }

    pub fn end(&self) -> StationId {
        self.end
    }

    pub fn stops(&self) -> usize {
        self.stops
    }

    pub fn fare(&self) -> u32 {
        self.fare
    }

    pub fn path(&self) -> &[StationId] {
        self.route.stations()
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn purchased_at(&self) -> DateTime<Local> {
        self.purchased_at
    }
}

fn line_prefix(line: &str) -> String {
    line.chars().take(2).collect::<String>().to_uppercase()
}

// ============================================================================
// Session
// ============================================================================

/// Tickets bought during this run, in purchase order.
#[derive(Debug, Default)]
pub struct TicketSession {
    tickets: Vec<Ticket>,
    saved: usize,
}

impl TicketSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn purchase(&mut self, ticket: Ticket) -> &Ticket {
        self.tickets.push(ticket);
        &self.tickets[self.tickets.len() - 1]
    }

    pub fn tickets(&self) -> &[Ticket] {
        &self.tickets
    }

    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }

    /// Tickets not yet appended to the log.
    pub fn unsaved(&self) -> &[Ticket] {
        &self.tickets[self.saved..]
    }

    /// Append unsaved tickets to `log`, returning how many were written.
    pub fn save_to(&mut self, log: &TicketLog, network: &MetroNetwork) -> Result<usize> {
        let written = log.append(network, self.unsaved())?;
        self.saved += written;
        Ok(written)
    }
}

// ============================================================================
// Ticket Log
// ============================================================================

/// One row of the ticket log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggedTicket {
    #[serde(rename = "TicketID")]
    pub ticket_id: String,
    #[serde(rename = "From")]
    pub from: String,
    #[serde(rename = "To")]
    pub to: String,
    #[serde(rename = "Stops")]
    pub stops: usize,
    #[serde(rename = "Fare")]
    pub fare: u32,
}

impl LoggedTicket {
    fn from_ticket(ticket: &Ticket, network: &MetroNetwork) -> Self {
        LoggedTicket {
            ticket_id: ticket.id().to_string(),
            from: network.station_name(ticket.start()).to_string(),
            to: network.station_name(ticket.end()).to_string(),
            stops: ticket.stops(),
            fare: ticket.fare(),
        }
    }
}

/// Append-only CSV file of purchased tickets.
#[derive(Debug, Clone)]
pub struct TicketLog {
    path: PathBuf,
}

impl TicketLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        TicketLog { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append tickets, writing the header row only into a new or empty file.
    pub fn append(&self, network: &MetroNetwork, tickets: &[Ticket]) -> Result<usize> {
        if tickets.is_empty() {
            return Ok(0);
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    NMTError::FileError(format!("Failed to create '{}': {}", parent.display(), e))
                })?;
            }
        }

        let needs_header = fs::metadata(&self.path)
            .map(|m| m.len() == 0)
            .unwrap_or(true);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                NMTError::FileError(format!("Failed to open '{}': {}", self.path.display(), e))
            })?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);

        for ticket in tickets {
            writer
                .serialize(LoggedTicket::from_ticket(ticket, network))
                .map_err(|e| NMTError::FileError(format!("Failed to write ticket: {}", e)))?;
        }

        writer
            .flush()
            .map_err(|e| NMTError::FileError(format!("Failed to write ticket log: {}", e)))?;

        info!("Appended {} tickets to {}", tickets.len(), self.path.display());
        Ok(tickets.len())
    }

    /// Every row in the log, oldest first. A missing log reads as empty.
    pub fn read_entries(&self) -> Result<Vec<LoggedTicket>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path).map_err(|e| {
            NMTError::FileError(format!("Failed to open '{}': {}", self.path.display(), e))
        })?;

        let mut reader = csv::Reader::from_reader(file);
        let mut entries = Vec::new();

        for result in reader.deserialize() {
            let entry: LoggedTicket =
                result.map_err(|e| NMTError::ParseError(format!("Ticket log: {}", e)))?;
            entries.push(entry);
        }

        Ok(entries)
    }
}
