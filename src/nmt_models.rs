// Network model for the Namma Metro ticket terminal
//
// The network is read from a CSV file holding one row per station per line:
//
//   line,station,type
//   purple,Whitefield (Kadugodi),endpoint
//   purple,Hopefarm Channasandra,middle
//   ...
//
// Rows are grouped by line and listed in physical stop order, so track
// adjacency is simply "next row on the same line".

use log::{debug, info};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum NMTError {
    #[error("File error: {0}")]
    FileError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Network data contains no stations")]
    EmptyNetwork,
    #[error("Station '{0}' not found")]
    UnknownStation(String),
    #[error("Start and end stations must be different (got '{0}' twice)")]
    SameStation(String),
    #[error("No route could be found from {from} to {to}")]
    NoRoute { from: String, to: String },
}

pub type Result<T> = std::result::Result<T, NMTError>;

// ============================================================================
// Data Structures
// ============================================================================

pub type StationId = usize;
pub type LineId = usize;

/// Minimum similarity score for a station to be offered as a suggestion.
pub const SUGGESTION_THRESHOLD: u8 = 65;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StationRole {
    Middle,
    Endpoint,
    Connector,
}

impl fmt::Display for StationRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StationRole::Middle => write!(f, "middle"),
            StationRole::Endpoint => write!(f, "endpoint"),
            StationRole::Connector => write!(f, "connector"),
        }
    }
}

/// One row of the network CSV, read by position.
#[derive(Debug, Clone, Deserialize)]
pub struct StationRecord {
    pub line: String,
    pub station: String,
    pub role: StationRole,
}

#[cfg(test)]
impl StationRecord {
    pub fn new(line: &str, station: &str, role: StationRole) -> Self {
        StationRecord {
            line: line.to_string(),
            station: station.to_string(),
            role,
        }
    }
}

/// Where a station appears on a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurrence {
    pub line: LineId,
    pub position: usize,
    pub role: StationRole,
}

/// A track edge to a neighbouring station, labelled with the line it runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    pub station: StationId,
    pub line: LineId,
}

#[derive(Debug, Clone)]
pub struct Station {
    pub id: StationId,
    pub name: String,
    /// Line the station was first seen on, also used as its display color.
    pub line: String,
    pub role: StationRole,
    pub occurrences: Vec<Occurrence>,
    pub neighbours: Vec<Link>,
}

impl Station {
    /// True when more than one line stops here.
    pub fn is_interchange(&self) -> bool {
        match self.occurrences.first() {
            Some(first) => self.occurrences.iter().any(|o| o.line != first.line),
            None => false,
        }
    }

    /// Distinct lines serving this station, in the order they were loaded.
    pub fn line_ids(&self) -> Vec<LineId> {
        let mut ids: Vec<LineId> = Vec::new();
        for occurrence in &self.occurrences {
            if !ids.contains(&occurrence.line) {
                ids.push(occurrence.line);
            }
        }
        ids
    }

    #[cfg(test)]
    pub fn is_adjacent(&self, other: StationId) -> bool {
        self.neighbours.iter().any(|l| l.station == other)
    }

    /// Lines whose track joins this station directly to `other`.
    pub fn lines_to(&self, other: StationId) -> Vec<LineId> {
        self.neighbours
            .iter()
            .filter(|l| l.station == other)
            .map(|l| l.line)
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct Line {
    pub id: LineId,
    pub color: String,
    pub stations: Vec<StationId>,
}

/// The whole metro graph. Built once at startup and only read afterwards.
#[derive(Debug, Clone, Default)]
pub struct MetroNetwork {
    stations: Vec<Station>,
    lines: Vec<Line>,
    station_index: HashMap<String, StationId>,
    line_index: HashMap<String, LineId>,
}

// ============================================================================
// Construction & Loading
// ============================================================================

impl MetroNetwork {
    /// Build the graph from rows grouped by line in physical order.
    ///
    /// Each station name gets exactly one node. A name that appears on several
    /// lines keeps one occurrence per line, and its track edges from every
    /// line meet at that single node, so interchanges need no extra edges.
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = StationRecord>,
    {
        let mut network = MetroNetwork::default();

        for record in records {
            let line_id = network.intern_line(normalize_line_id(&record.line));
            let line_color = network.lines[line_id].color.clone();
            let station_id = network.intern_station(record.station.trim(), &line_color, record.role);

            let previous = network.lines[line_id].stations.last().copied();
            let position = network.lines[line_id].stations.len();
            network.lines[line_id].stations.push(station_id);
            network.stations[station_id].occurrences.push(Occurrence {
                line: line_id,
                position,
                role: record.role,
            });

            if let Some(previous) = previous {
                network.connect(previous, station_id, line_id);
            }
        }

        for line in &network.lines {
            debug!("Line '{}' loaded with {} stations", line.color, line.stations.len());
        }

        network
    }

    /// Load the network from a CSV file. Any failure rejects the whole file.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            NMTError::FileError(format!("Failed to open '{}': {}", path.display(), e))
        })?;

        let network = Self::from_reader(file)?;

        info!(
            "Loaded {} stations on {} lines ({} interchanges) from {}",
            network.station_count(),
            network.line_count(),
            network.interchanges().count(),
            path.display()
        );

        Ok(network)
    }

    /// Parse CSV content into a network, failing closed on the first bad row.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let records = Self::read_records(reader)?;

        if records.is_empty() {
            return Err(NMTError::EmptyNetwork);
        }

        Ok(Self::from_records(records))
    }

    /// Read every row before building anything, so a bad row leaves no partial graph.
    pub fn read_records<R: Read>(reader: R) -> Result<Vec<StationRecord>> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut records = Vec::new();

        for (index, result) in rdr.records().enumerate() {
            // header is line 1
            let row = index + 2;

            let raw = result
                .map_err(|e| NMTError::ParseError(format!("Row {}: {}", row, e)))?;

            let record: StationRecord = raw
                .deserialize(None)
                .map_err(|e| NMTError::ParseError(format!("Row {}: {}", row, e)))?;

            if record.station.is_empty() {
                return Err(NMTError::ParseError(format!("Row {}: empty station name", row)));
            }

            records.push(record);
        }

        Ok(records)
    }

    fn intern_line(&mut self, key: &str) -> LineId {
        if let Some(&id) = self.line_index.get(key) {
            return id;
        }

        let id = self.lines.len();
        self.lines.push(Line {
            id,
            color: key.to_string(),
            stations: Vec::new(),
        });
        self.line_index.insert(key.to_string(), id);
        id
    }

    fn intern_station(&mut self, name: &str, line: &str, role: StationRole) -> StationId {
        if let Some(&id) = self.station_index.get(name) {
            return id;
        }

        let id = self.stations.len();
        self.stations.push(Station {
            id,
            name: name.to_string(),
            line: line.to_string(),
            role,
            occurrences: Vec::new(),
            neighbours: Vec::new(),
        });
        self.station_index.insert(name.to_string(), id);
        id
    }

    fn connect(&mut self, a: StationId, b: StationId, line: LineId) {
        if a == b {
            return;
        }

        let forward = Link { station: b, line };
        if !self.stations[a].neighbours.contains(&forward) {
            self.stations[a].neighbours.push(forward);
        }

        let backward = Link { station: a, line };
        if !self.stations[b].neighbours.contains(&backward) {
            self.stations[b].neighbours.push(backward);
        }
    }
}

// ============================================================================
// Lookups
// ============================================================================

impl MetroNetwork {
    pub fn is_empty(&self) -> bool {
        self.stations.is_empty() || self.lines.is_empty()
    }

    pub fn station_count(&self) -> usize {
        self.stations.len()
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    #[cfg(test)]
    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn station(&self, id: StationId) -> Option<&Station> {
        self.stations.get(id)
    }

    /// Name of a station, or "?" for an id outside this network.
    pub fn station_name(&self, id: StationId) -> &str {
        self.stations.get(id).map(|s| s.name.as_str()).unwrap_or("?")
    }

    /// Color tag of a line, or an empty string for an unknown id.
    pub fn line_color(&self, id: LineId) -> &str {
        self.lines.get(id).map(|l| l.color.as_str()).unwrap_or("")
    }

    #[cfg(test)]
    pub fn line_by_color(&self, color: &str) -> Option<&Line> {
        self.line_index
            .get(normalize_line_id(color))
            .and_then(|&id| self.lines.get(id))
    }

    /// Resolve a station name: exact match first, then case-insensitive.
    pub fn station_id(&self, name: &str) -> Option<StationId> {
        let name = name.trim();

        if let Some(&id) = self.station_index.get(name) {
            return Some(id);
        }

        self.stations
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
            .map(|s| s.id)
    }

    #[cfg(test)]
    pub fn station_by_name(&self, name: &str) -> Option<&Station> {
        self.station_id(name).and_then(|id| self.stations.get(id))
    }

    pub fn interchanges(&self) -> impl Iterator<Item = &Station> {
        self.stations.iter().filter(|s| s.is_interchange())
    }

    /// Stations whose names look like `query`, best match first.
    pub fn suggest_stations(&self, query: &str, limit: usize) -> Vec<(StationId, u8)> {
        let mut scored: Vec<(StationId, u8)> = self
            .stations
            .iter()
            .map(|s| (s.id, similarity(query, &s.name)))
            .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
            .collect();

        scored.sort_by(|a, b| {
            b.1.cmp(&a.1)
                .then_with(|| self.station_name(a.0).cmp(self.station_name(b.0)))
        });
        scored.truncate(limit);
        scored
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Line ids keep only the part before the first dot (`purple.csv` -> `purple`).
pub fn normalize_line_id(raw: &str) -> &str {
    raw.split('.').next().unwrap_or("").trim()
}

fn squash(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

fn bigrams(text: &str) -> Vec<(char, char)> {
    let chars: Vec<char> = text.chars().collect();
    chars.windows(2).map(|w| (w[0], w[1])).collect()
}

/// Score from 0 to 100 of how closely `query` resembles `candidate`.
///
/// Uses the Dice coefficient over character bigrams of the lowercased
/// alphanumeric text. A query of three or more characters found inside the
/// candidate (or the other way round) scores 90.
pub fn similarity(query: &str, candidate: &str) -> u8 {
    let q = squash(query);
    let c = squash(candidate);

    if q.is_empty() || c.is_empty() {
        return 0;
    }
    if q == c {
        return 100;
    }
    if q.len().min(c.len()) >= 3 && (c.contains(&q) || q.contains(&c)) {
        return 90;
    }

    let q_pairs = bigrams(&q);
    let mut c_pairs = bigrams(&c);
    let total = q_pairs.len() + c_pairs.len();
    if total == 0 {
        return 0;
    }

    let mut shared = 0;
    for pair in &q_pairs {
        if let Some(pos) = c_pairs.iter().position(|p| p == pair) {
            c_pairs.swap_remove(pos);
            shared += 1;
        }
    }

    ((200 * shared) / total) as u8
}

pub fn parse_hex_color(hex_color: &str) -> Option<(u8, u8, u8)> {
    let hex = hex_color.trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some((r, g, b))
}

/// RGB for a line color tag: a known color name or a 6-digit hex code.
pub fn line_color_rgb(color: &str) -> (u8, u8, u8) {
    match color.to_ascii_lowercase().as_str() {
        "purple" => (128, 0, 160),
        "green" => (0, 150, 60),
        "yellow" => (250, 200, 0),
        "pink" => (240, 120, 170),
        "blue" => (20, 90, 200),
        "red" => (200, 20, 30),
        "orange" => (245, 130, 30),
        "cyan" => (0, 170, 200),
        "white" => (235, 235, 235),
        "brown" => (130, 80, 40),
        other => parse_hex_color(other).unwrap_or((128, 128, 128)),
    }
}
