// Controllers for the Namma Metro ticket terminal
use crate::nmt_config::AppConfig;
use crate::nmt_models::{MetroNetwork, NMTError, Result, StationId};
use crate::nmt_search::find_route;
use crate::nmt_tickets::{Tariff, Ticket, TicketLog, TicketSession};
use crate::nmt_views::NMTViews;
use log::warn;
use std::io::{self, BufRead, Write};

/// How many "did you mean" candidates to offer.
const MAX_SUGGESTIONS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuChoice {
    Purchase,
    ViewTickets,
    ListStations,
    SaveTickets,
    ViewLog,
    Quit,
    Invalid(String),
}

impl MenuChoice {
    pub fn parse(input: &str) -> Self {
        match input.trim().to_uppercase().as_str() {
            "1" => MenuChoice::Purchase,
            "2" => MenuChoice::ViewTickets,
            "3" => MenuChoice::ListStations,
            "4" => MenuChoice::SaveTickets,
            "5" => MenuChoice::ViewLog,
            "Q" => MenuChoice::Quit,
            other => MenuChoice::Invalid(other.to_string()),
        }
    }
}

/// What a save request did to the ticket log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    NothingPurchased,
    AlreadySaved,
    Saved(usize),
}

/// Append the session's unsaved tickets, telling apart an empty session
/// from one that was already written out.
pub fn save_session(
    network: &MetroNetwork,
    log: &TicketLog,
    session: &mut TicketSession,
) -> Result<SaveOutcome> {
    if session.is_empty() {
        return Ok(SaveOutcome::NothingPurchased);
    }
    if session.unsaved().is_empty() {
        return Ok(SaveOutcome::AlreadySaved);
    }

    session.save_to(log, network).map(SaveOutcome::Saved)
}

/// Outcome of matching typed text against station names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StationLookup {
    Found(StationId),
    Suggestions(Vec<StationId>),
    NotFound,
}

/// Exact (case-insensitive) match first, otherwise the closest names.
pub fn lookup_station(network: &MetroNetwork, input: &str) -> StationLookup {
    let input = input.trim();
    if input.is_empty() {
        return StationLookup::NotFound;
    }

    if let Some(id) = network.station_id(input) {
        return StationLookup::Found(id);
    }

    let suggestions: Vec<StationId> = network
        .suggest_stations(input, MAX_SUGGESTIONS)
        .into_iter()
        .map(|(id, _)| id)
        .collect();

    if suggestions.is_empty() {
        StationLookup::NotFound
    } else {
        StationLookup::Suggestions(suggestions)
    }
}

/// Validate the endpoints, search, and derive the ticket.
pub fn plan_trip(
    network: &MetroNetwork,
    start: StationId,
    end: StationId,
    tariff: &Tariff,
) -> Result<Ticket> {
    if start == end {
        return Err(NMTError::SameStation(network.station_name(start).to_string()));
    }

    let route = find_route(network, start, end);
    Ticket::issue(network, start, end, route, tariff)
}

pub struct NMTControllers;

impl NMTControllers {
    /// Main application loop
    pub fn run(network: &MetroNetwork, config: &AppConfig) {
        let tariff = config.tariff();
        let log = TicketLog::new(&config.tickets);
        let mut session = TicketSession::new();

        let stdin = io::stdin();
        let mut input = stdin.lock();

        NMTViews::show_welcome(network);

        loop {
            NMTViews::show_menu();

            let Some(line) = Self::read_input(&mut input) else {
                NMTViews::goodbye_message();
                break;
            };

            match MenuChoice::parse(&line) {
                MenuChoice::Purchase => Self::handle_purchase(&mut input, network, &tariff, &mut session),
                MenuChoice::ViewTickets => NMTViews::show_tickets(session.tickets(), network),
                MenuChoice::ListStations => NMTViews::show_lines(network),
                MenuChoice::SaveTickets => Self::handle_save(network, &log, &mut session),
                MenuChoice::ViewLog => Self::handle_view_log(&log),
                MenuChoice::Quit => {
                    NMTViews::goodbye_message();
                    break;
                }
                MenuChoice::Invalid(choice) => NMTViews::invalid_choice(&choice),
            }
        }
    }

    /// One-shot route query for the `route` subcommand
    pub fn run_route(network: &MetroNetwork, config: &AppConfig, from: &str, to: &str) -> Result<()> {
        let start = Self::resolve_exact(network, from)?;
        let end = Self::resolve_exact(network, to)?;

        let ticket = plan_trip(network, start, end, &config.tariff())?;

        for line in NMTViews::route_lines(ticket.route(), network) {
            println!("{}", line);
        }
        println!(
            "\n  STOPS: {}   CHANGES: {}   FARE: ₹{:.2}",
            ticket.stops(),
            NMTViews::changes(ticket.route(), network),
            ticket.fare() as f64
        );
        Ok(())
    }

    fn handle_purchase(
        input: &mut impl BufRead,
        network: &MetroNetwork,
        tariff: &Tariff,
        session: &mut TicketSession,
    ) {
        NMTViews::show_purchase_header();

        let Some(start) = Self::resolve_station(input, network, "Enter START station: ") else {
            return;
        };
        let Some(end) = Self::resolve_station(input, network, "Enter END station: ") else {
            return;
        };

        match plan_trip(network, start, end, tariff) {
            Ok(ticket) => {
                NMTViews::purchase_success();
                let ticket = session.purchase(ticket);
                NMTViews::show_ticket(ticket, network, true);
            }
            Err(NMTError::SameStation(_)) => NMTViews::same_station(),
            Err(NMTError::NoRoute { from, to }) => NMTViews::no_route(&from, &to),
            Err(e) => NMTViews::error(&e.to_string()),
        }
    }

    fn handle_save(network: &MetroNetwork, log: &TicketLog, session: &mut TicketSession) {
        match save_session(network, log, session) {
            Ok(SaveOutcome::NothingPurchased) => NMTViews::nothing_to_save(),
            Ok(SaveOutcome::AlreadySaved) => NMTViews::all_tickets_saved(),
            Ok(SaveOutcome::Saved(count)) => {
                NMTViews::tickets_saved(count, &log.path().display().to_string())
            }
            Err(e) => NMTViews::error(&format!("Error saving tickets: {}", e)),
        }
    }

    fn handle_view_log(log: &TicketLog) {
        match log.read_entries() {
            Ok(entries) => NMTViews::show_saved_log(&entries, &log.path().display().to_string()),
            Err(e) => NMTViews::error(&format!("Error reading ticket log: {}", e)),
        }
    }

    /// Ask for a station, confirming fuzzy matches one at a time
    fn resolve_station(
        input: &mut impl BufRead,
        network: &MetroNetwork,
        prompt: &str,
    ) -> Option<StationId> {
        let name = Self::prompt(input, prompt)?;

        match lookup_station(network, &name) {
            StationLookup::Found(id) => Some(id),
            StationLookup::Suggestions(candidates) => {
                for id in candidates {
                    let question = format!("Did you mean '{}'? (y/n): ", network.station_name(id));
                    let answer = Self::prompt(input, &question)?.to_lowercase();

                    match answer.as_str() {
                        "y" => return Some(id),
                        "n" => continue,
                        _ => {
                            NMTViews::invalid_answer();
                            return None;
                        }
                    }
                }
                NMTViews::station_not_found(&name);
                None
            }
            StationLookup::NotFound => {
                NMTViews::station_not_found(&name);
                None
            }
        }
    }

    fn resolve_exact(network: &MetroNetwork, name: &str) -> Result<StationId> {
        match lookup_station(network, name) {
            StationLookup::Found(id) => Ok(id),
            StationLookup::Suggestions(candidates) => {
                let names: Vec<&str> = candidates.iter().map(|&id| network.station_name(id)).collect();
                NMTViews::show_suggestions(&names);
                Err(NMTError::UnknownStation(name.trim().to_string()))
            }
            StationLookup::NotFound => Err(NMTError::UnknownStation(name.trim().to_string())),
        }
    }

    fn prompt(input: &mut impl BufRead, text: &str) -> Option<String> {
        print!("{}", text);
        let _ = io::stdout().flush();
        Self::read_input(input).map(|s| s.trim().to_string())
    }

    /// Read one line; `None` at end of input or on a read error
    fn read_input(input: &mut impl BufRead) -> Option<String> {
        let mut line = String::new();
        match input.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line),
            Err(e) => {
                warn!("Error reading input: {}", e);
                None
            }
        }
    }
}
