// Command line and environment configuration
use crate::nmt_tickets::{Tariff, DEFAULT_FARE_PER_STOP};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "nmt", version, about = "Namma Metro route finder and ticket machine")]
pub struct AppConfig {
    /// Network CSV: one `line,station,type` row per station per line
    #[arg(long, env = "NMT_DATA", default_value = "data/metro_stations.csv")]
    pub data: PathBuf,

    /// Ticket log that saved tickets are appended to
    #[arg(long, env = "NMT_TICKETS", default_value = "data/my_tickets.csv")]
    pub tickets: PathBuf,

    /// Fare charged for every stop travelled
    #[arg(long, env = "NMT_FARE_PER_STOP", default_value_t = DEFAULT_FARE_PER_STOP)]
    pub fare_per_stop: u32,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Print the shortest route and its fare, then exit
    Route { from: String, to: String },
    /// Print every line with its stations, then exit
    Lines,
}

impl AppConfig {
    /// Read `.env` if present, then parse arguments (flags win over environment).
    pub fn load() -> Self {
        dotenvy::dotenv().ok();
        Self::parse()
    }

    pub fn tariff(&self) -> Tariff {
        Tariff::new(self.fare_per_stop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_and_route_subcommand() {
        let config = AppConfig::try_parse_from([
            "nmt",
            "--data",
            "stations.csv",
            "--tickets",
            "out/tickets.csv",
            "--fare-per-stop",
            "12",
            "route",
            "Majestic",
            "Indiranagar",
        ])
        .unwrap();

        assert_eq!(config.data, PathBuf::from("stations.csv"));
        assert_eq!(config.tickets, PathBuf::from("out/tickets.csv"));
        assert_eq!(config.tariff(), Tariff::new(12));
        assert_eq!(
            config.command,
            Some(Command::Route {
                from: "Majestic".to_string(),
                to: "Indiranagar".to_string(),
            })
        );
    }

    #[test]
    fn test_lines_subcommand() {
        let config = AppConfig::try_parse_from(["nmt", "lines"]).unwrap();
        assert_eq!(config.command, Some(Command::Lines));
    }

    #[test]
    fn test_rejects_non_numeric_fare() {
        assert!(AppConfig::try_parse_from(["nmt", "--fare-per-stop", "ten"]).is_err());
    }
}
