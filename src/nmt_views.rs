// Views for the Namma Metro ticket terminal
use crate::nmt_models::{line_color_rgb, Line, MetroNetwork, StationId, StationRole};
use crate::nmt_search::Route;
use crate::nmt_tickets::{LoggedTicket, Ticket};
use std::io::{self, Write};

pub struct NMTViews;

const WIDTH: usize = 50;
const LABEL_WIDTH: usize = 10;
const PADDING: &str = "  ";
const ROUTE_PADDING: &str = "    ";
/// Paths longer than this are shortened in the ticket list.
const PATH_PREVIEW: usize = 6;

impl NMTViews {
    pub fn show_welcome(network: &MetroNetwork) {
        println!("\n{}", "═".repeat(60));
        println!("     🚇 NAMMA METRO - CLI TICKET SYSTEM");
        println!("{}", "═".repeat(60));
        println!(
            "\n  {} stations on {} lines, {} interchanges",
            network.station_count(),
            network.line_count(),
            network.interchanges().count()
        );
    }

    /// Show main menu
    pub fn show_menu() {
        println!("\n{}", "=".repeat(30));
        println!("       MAIN MENU");
        println!("{}", "=".repeat(30));
        println!("1. Purchase Ticket");
        println!("2. View My Tickets");
        println!("3. List All Stations by Line");
        println!("4. Save My Tickets to CSV");
        println!("5. View Saved Ticket Log");
        println!("Q. Quit");
        print!("Enter your choice: ");
        let _ = io::stdout().flush();
    }

    pub fn show_purchase_header() {
        println!("\n--- Purchase New Ticket ---");
    }

    /// Print a ticket card, with the full route when `with_route` is set
    pub fn show_ticket(ticket: &Ticket, network: &MetroNetwork, with_route: bool) {
        for line in Self::ticket_card(ticket, network) {
            println!("{}", line);
        }

        if with_route {
            for line in Self::route_lines(ticket.route(), network) {
                println!("{}", line);
            }
            println!("{}", "-".repeat(WIDTH));
        } else {
            println!("{}", Self::labelled("PATH:", Self::path_summary(ticket, network)));
        }
    }

    pub fn ticket_card(ticket: &Ticket, network: &MetroNetwork) -> Vec<String> {
        vec![
            "-".repeat(WIDTH),
            Self::labelled("TICKET ID:", ticket.id().to_string()),
            Self::labelled("FROM:", Self::colorize_station(ticket.start(), network)),
            Self::labelled("TO:", Self::colorize_station(ticket.end(), network)),
            Self::labelled("STOPS:", ticket.stops().to_string()),
            Self::labelled("FARE:", format!("₹{:.2}", ticket.fare() as f64)),
            Self::labelled("CHANGES:", Self::changes(ticket.route(), network)),
            Self::labelled("BOUGHT:", ticket.purchased_at().format("%Y-%m-%d %H:%M").to_string()),
            "-".repeat(WIDTH),
        ]
    }

    /// Number of line changes, with the stations where they happen
    pub fn changes(route: &Route, network: &MetroNetwork) -> String {
        let stations = route.transfer_stations();
        if stations.is_empty() {
            return "0".to_string();
        }

        let names: Vec<&str> = stations.iter().map(|&id| network.station_name(id)).collect();
        format!("{} ({})", route.transfers(), names.join(", "))
    }

    /// Station names of the path, eliding the middle of long journeys
    pub fn path_summary(ticket: &Ticket, network: &MetroNetwork) -> String {
        let names: Vec<&str> = ticket.path().iter().map(|&id| network.station_name(id)).collect();
        if names.len() <= PATH_PREVIEW {
            return names.join(" → ");
        }

        let hidden = names.len() - 4;
        format!(
            "{} → {} → … {} more … → {} → {}",
            names[0],
            names[1],
            hidden,
            names[names.len() - 2],
            names[names.len() - 1]
        )
    }

    /// Route text: starting line, one arrow per station, and a note at each change of line
    pub fn route_lines(route: &Route, network: &MetroNetwork) -> Vec<String> {
        let mut out = Vec::new();
        let legs = route.legs();

        let Some(first) = legs.first() else {
            out.push(format!("{}ROUTE:", PADDING));
            out.push(format!("{}No path found.", PADDING));
            return out;
        };

        out.push(format!(
            "{}Start at {} on the {} line.\n",
            ROUTE_PADDING,
            network.station_name(first.stations[0]),
            Self::colorize_line_name(network.line_color(first.line))
        ));

        for (i, leg) in legs.iter().enumerate() {
            if i > 0 {
                out.push(format!(
                    "\n{}(Transfer at {} to {} line)\n",
                    ROUTE_PADDING,
                    network.station_name(leg.stations[0]),
                    Self::colorize_line_name(network.line_color(leg.line))
                ));
            }
            for &station in &leg.stations[1..] {
                out.push(format!("{} -> {}", ROUTE_PADDING, network.station_name(station)));
            }
        }

        out
    }

    pub fn show_tickets(tickets: &[Ticket], network: &MetroNetwork) {
        println!("\n--- Your Purchased Tickets ---");
        if tickets.is_empty() {
            println!("You have not purchased any tickets yet.");
            return;
        }

        for ticket in tickets {
            Self::show_ticket(ticket, network, false);
        }
    }

    pub fn show_saved_log(entries: &[LoggedTicket], path: &str) {
        println!("\n--- Saved Tickets ({}) ---", path);
        if entries.is_empty() {
            println!("No tickets have been saved yet.");
            return;
        }

        println!(
            "{}{:<14} {:<28} {:<28} {:>5} {:>8}",
            PADDING, "TICKET ID", "FROM", "TO", "STOPS", "FARE"
        );
        println!("{}", "-".repeat(90));
        for entry in entries {
            println!(
                "{}{:<14} {:<28} {:<28} {:>5} {:>8}",
                PADDING,
                entry.ticket_id,
                entry.from,
                entry.to,
                entry.stops,
                format!("₹{:.2}", entry.fare as f64)
            );
        }
    }

    /// All stations grouped by line, in physical order
    pub fn show_lines(network: &MetroNetwork) {
        println!("\n--- All Namma Metro Stations ---");
        println!("{}", "-".repeat(20));

        for (i, line) in network.lines().iter().enumerate() {
            if i > 0 {
                println!("{}", "-".repeat(20));
            }
            for text in Self::line_listing(line, network) {
                println!("{}", text);
            }
        }
    }

    pub fn line_listing(line: &Line, network: &MetroNetwork) -> Vec<String> {
        let mut out = vec![
            Self::colorize(&format!("--- {} LINE ---", line.color.to_uppercase()), &line.color),
            "-".repeat(20),
        ];

        for &id in &line.stations {
            let Some(station) = network.station(id) else {
                continue;
            };

            if station.is_interchange() {
                let others: Vec<String> = station
                    .line_ids()
                    .into_iter()
                    .filter(|&l| l != line.id)
                    .map(|l| network.line_color(l).to_uppercase())
                    .collect();
                out.push(format!("  - {} ⇄ {}", station.name, others.join(", ")));
            } else if station.role == StationRole::Endpoint {
                out.push(format!("  - {} ({})", station.name, station.role));
            } else {
                out.push(format!("  - {}", station.name));
            }
        }

        out
    }

    pub fn station_not_found(input: &str) {
        println!(
            "\n⚠️  Station '{}' not found. Please enter a valid metro station. Returning to Main Menu...",
            input
        );
    }

    pub fn show_suggestions(names: &[&str]) {
        println!("\n💡 Did you mean one of these stations?");
        for name in names {
            println!("  • {}", name);
        }
    }

    pub fn invalid_answer() {
        println!("\n✗ Invalid Input. Returning to Main Menu...");
    }

    pub fn same_station() {
        println!("\n✗ Start and end stations must be different.");
    }

    pub fn no_route(from: &str, to: &str) {
        println!("\n✗ Sorry, no route could be found from {} to {}.", from, to);
    }

    pub fn purchase_success() {
        println!("\n\n✓ Ticket Purchased Successfully!");
    }

    pub fn nothing_to_save() {
        println!("\nNo tickets to save. Purchase a ticket by pressing Option 1");
    }

    pub fn all_tickets_saved() {
        println!("\nAll purchased tickets are already saved. Nothing new to write.");
    }

    pub fn tickets_saved(count: usize, path: &str) {
        println!("\n✓ Successfully saved {} tickets to {}", count, path);
    }

    pub fn error(message: &str) {
        eprintln!("\n⚠️  {}", message);
    }

    pub fn invalid_choice(choice: &str) {
        if choice.is_empty() {
            println!("\n✗ Invalid choice. Please try again.");
        } else {
            println!("\n✗ Invalid choice '{}'. Please try again.", choice);
        }
    }

    pub fn goodbye_message() {
        println!("\nThank you for using Namma Metro CLI.");
    }

    fn labelled(label: &str, value: String) -> String {
        format!("{}{:<width$} {}", PADDING, label, value, width = LABEL_WIDTH)
    }

    fn colorize_station(id: StationId, network: &MetroNetwork) -> String {
        match network.station(id) {
            Some(station) => Self::colorize(&station.name, &station.line),
            None => "?".to_string(),
        }
    }

    fn colorize_line_name(color: &str) -> String {
        Self::colorize(&color.to_uppercase(), color)
    }

    /// Wrap text in a 24-bit background of the line's color with a readable foreground
    pub fn colorize(text: &str, line_color: &str) -> String {
        let (r, g, b) = line_color_rgb(line_color);

        // Calculate relative luminance for contrast
        let luminance = (0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32) / 255.0;
        let text_color = if luminance > 0.5 { "30" } else { "97" };

        format!(
            "\x1b[48;2;{};{};{}m\x1b[{}m {} \x1b[0m",
            r, g, b, text_color, text
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nmt_models::{StationRecord, StationRole};
    use crate::nmt_search::find_route;
    use crate::nmt_tickets::Tariff;

    fn strip_ansi(text: &str) -> String {
        let mut out = String::new();
        let mut chars = text.chars();
        while let Some(c) = chars.next() {
            if c == '\x1b' {
                for c in chars.by_ref() {
                    if c == 'm' {
                        break;
                    }
                }
            } else {
                out.push(c);
            }
        }
        out
    }

    fn red_blue() -> MetroNetwork {
        MetroNetwork::from_records(vec![
            StationRecord::new("red", "A", StationRole::Endpoint),
            StationRecord::new("red", "B", StationRole::Middle),
            StationRecord::new("red", "C", StationRole::Connector),
            StationRecord::new("blue", "C", StationRole::Connector),
            StationRecord::new("blue", "D", StationRole::Middle),
            StationRecord::new("blue", "E", StationRole::Endpoint),
        ])
    }

    #[test]
    fn test_route_lines_annotate_transfers() {
        let network = red_blue();
        let route = find_route(
            &network,
            network.station_id("A").unwrap(),
            network.station_id("E").unwrap(),
        );

        let lines: Vec<String> = NMTViews::route_lines(&route, &network)
            .iter()
            .map(|l| strip_ansi(l).trim().to_string())
            .collect();

        assert_eq!(lines[0], "Start at A on the  RED  line.");
        assert_eq!(lines[1], "-> B");
        assert_eq!(lines[2], "-> C");
        assert_eq!(lines[3], "(Transfer at C to  BLUE  line)");
        assert_eq!(lines[4], "-> D");
        assert_eq!(lines[5], "-> E");
        assert_eq!(lines.len(), 6);
    }

    #[test]
    fn test_empty_route_says_no_path() {
        let network = red_blue();
        let lines = NMTViews::route_lines(&Route::default(), &network);
        assert_eq!(lines[1].trim(), "No path found.");
    }

    #[test]
    fn test_ticket_card_fields() {
        let network = red_blue();
        let start = network.station_id("A").unwrap();
        let end = network.station_id("E").unwrap();
        let ticket = Ticket::issue(
            &network,
            start,
            end,
            find_route(&network, start, end),
            &Tariff::default(),
        )
        .unwrap();

        let card: Vec<String> = NMTViews::ticket_card(&ticket, &network)
            .iter()
            .map(|l| strip_ansi(l))
            .collect();

        assert!(card[1].contains(ticket.id()));
        assert!(card[2].contains(" A "));
        assert!(card[3].contains(" E "));
        assert!(card[4].ends_with(" 4"));
        assert!(card[5].ends_with("₹40.00"));
        assert!(card[6].ends_with(" 1 (C)"));
    }

    #[test]
    fn test_changes_without_transfer() {
        let network = red_blue();
        let route = find_route(
            &network,
            network.station_id("A").unwrap(),
            network.station_id("C").unwrap(),
        );
        assert_eq!(NMTViews::changes(&route, &network), "0");
    }

    #[test]
    fn test_path_summary_elides_long_paths() {
        let network = MetroNetwork::from_records(
            ["S1", "S2", "S3", "S4", "S5", "S6", "S7"]
                .iter()
                .map(|name| StationRecord::new("green", name, StationRole::Middle))
                .collect::<Vec<_>>(),
        );
        let issue = |from: &str, to: &str| {
            let start = network.station_id(from).unwrap();
            let end = network.station_id(to).unwrap();
            Ticket::issue(&network, start, end, find_route(&network, start, end), &Tariff::default())
                .unwrap()
        };

        assert_eq!(NMTViews::path_summary(&issue("S1", "S3"), &network), "S1 → S2 → S3");
        assert_eq!(
            NMTViews::path_summary(&issue("S1", "S7"), &network),
            "S1 → S2 → … 3 more … → S6 → S7"
        );
    }

    #[test]
    fn test_line_listing_marks_interchanges() {
        let network = red_blue();
        let listing = NMTViews::line_listing(&network.lines()[0], &network);

        assert_eq!(strip_ansi(&listing[0]).trim(), "--- RED LINE ---");
        assert_eq!(listing[2], "  - A (endpoint)");
        assert_eq!(listing[3], "  - B");
        assert_eq!(listing[4], "  - C ⇄ BLUE");
    }

    #[test]
    fn test_colorize_picks_contrasting_text() {
        assert!(NMTViews::colorize("x", "yellow").contains("\x1b[30m"));
        assert!(NMTViews::colorize("x", "purple").contains("\x1b[97m"));
        assert!(NMTViews::colorize("x", "purple").ends_with("\x1b[0m"));
    }
}
