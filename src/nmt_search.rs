// Shortest-route search over the metro graph
//
// Every track hop costs one stop, so the fewest-stops route is a plain
// breadth-first search. Neighbour lists keep input order, which makes the
// choice between equally short routes repeatable from run to run.

use crate::nmt_models::{LineId, MetroNetwork, StationId};
use log::debug;
use std::collections::VecDeque;

// ============================================================================
// Data Structures
// ============================================================================

/// A station path plus the line ridden on each hop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Route {
    stations: Vec<StationId>,
    hop_lines: Vec<LineId>,
}

/// A run of consecutive hops on the same line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leg {
    pub line: LineId,
    pub stations: Vec<StationId>,
}

impl Route {
    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    pub fn stations(&self) -> &[StationId] {
        &self.stations
    }

    /// Number of hops travelled.
    pub fn stops(&self) -> usize {
        self.stations.len().saturating_sub(1)
    }

    pub fn legs(&self) -> Vec<Leg> {
        let mut legs: Vec<Leg> = Vec::new();

        for (pair, &line) in self.stations.windows(2).zip(&self.hop_lines) {
            match legs.last_mut() {
                Some(leg) if leg.line == line => leg.stations.push(pair[1]),
                _ => legs.push(Leg {
                    line,
                    stations: vec![pair[0], pair[1]],
                }),
            }
        }

        legs
    }

    /// Number of line changes along the route.
    pub fn transfers(&self) -> usize {
        self.legs().len().saturating_sub(1)
    }

    /// Stations where the rider changes line, in travel order.
    pub fn transfer_stations(&self) -> Vec<StationId> {
        self.legs()
            .iter()
            .skip(1)
            .filter_map(|leg| leg.stations.first().copied())
            .collect()
    }
}

// ============================================================================
// Search
// ============================================================================

/// Fewest-stops path from `start` to `end`, both ends included.
///
/// Returns an empty path when `end` cannot be reached or either id is not in
/// the network, and `[start]` when both ends are the same station.
pub fn find_path(network: &MetroNetwork, start: StationId, end: StationId) -> Vec<StationId> {
    if network.station(start).is_none() || network.station(end).is_none() {
        return Vec::new();
    }

    let mut visited = vec![false; network.station_count()];
    let mut parents: Vec<Option<StationId>> = vec![None; network.station_count()];
    let mut queue = VecDeque::from([start]);
    visited[start] = true;

    while let Some(current) = queue.pop_front() {
        if current == end {
            break;
        }

        let Some(station) = network.station(current) else {
            continue;
        };

        for link in &station.neighbours {
            if !visited[link.station] {
                visited[link.station] = true;
                parents[link.station] = Some(current);
                queue.push_back(link.station);
            }
        }
    }

    if !visited[end] {
        debug!(
            "No path between '{}' and '{}'",
            network.station_name(start),
            network.station_name(end)
        );
        return Vec::new();
    }

    let mut path = vec![end];
    let mut current = end;
    while let Some(parent) = parents[current] {
        path.push(parent);
        current = parent;
    }
    path.reverse();
    path
}

/// Like [`find_path`], with the line to ride on each hop filled in.
pub fn find_route(network: &MetroNetwork, start: StationId, end: StationId) -> Route {
    let stations = find_path(network, start, end);
    let hop_lines = choose_hop_lines(network, &stations);

    debug!(
        "Route {} -> {}: {} stops",
        network.station_name(start),
        network.station_name(end),
        stations.len().saturating_sub(1)
    );

    Route {
        stations,
        hop_lines,
    }
}

/// Pick a line for each hop, staying on the current line while it still
/// serves the next hop, otherwise preferring a line that also serves the hop
/// after.
fn choose_hop_lines(network: &MetroNetwork, stations: &[StationId]) -> Vec<LineId> {
    let lines_between = |a: StationId, b: StationId| -> Vec<LineId> {
        network
            .station(a)
            .map(|s| s.lines_to(b))
            .unwrap_or_default()
    };

    let mut chosen: Vec<LineId> = Vec::with_capacity(stations.len().saturating_sub(1));
    let mut current: Option<LineId> = None;

    for (i, pair) in stations.windows(2).enumerate() {
        let candidates = lines_between(pair[0], pair[1]);
        let following = match stations.get(i + 2) {
            Some(&next) => lines_between(pair[1], next),
            None => Vec::new(),
        };

        let line = current
            .filter(|c| candidates.contains(c))
            .or_else(|| candidates.iter().copied().find(|c| following.contains(c)))
            .or_else(|| candidates.first().copied());

        if let Some(line) = line {
            chosen.push(line);
            current = Some(line);
        }
    }

    chosen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nmt_models::{StationRecord, StationRole};

    /// Lines given as `(line, "Station,Station,...")` in stop order.
    fn network(lines: &[(&str, &str)]) -> MetroNetwork {
        let mut records = Vec::new();
        for (line, stops) in lines {
            let stations: Vec<&str> = stops.split(',').collect();
            for (i, name) in stations.iter().enumerate() {
                let role = if i == 0 || i == stations.len() - 1 {
                    StationRole::Endpoint
                } else {
                    StationRole::Middle
                };
                records.push(StationRecord::new(line, name, role));
            }
        }
        MetroNetwork::from_records(records)
    }

    fn id(network: &MetroNetwork, name: &str) -> StationId {
        network.station_id(name).unwrap()
    }

    fn names(network: &MetroNetwork, path: &[StationId]) -> Vec<String> {
        path.iter().map(|&s| network.station_name(s).to_string()).collect()
    }

    /// Hops in a fewest-stops path, or `None` when `end` is unreachable.
    fn distance(network: &MetroNetwork, start: StationId, end: StationId) -> Option<usize> {
        let path = find_path(network, start, end);
        if path.is_empty() {
            None
        } else {
            Some(path.len() - 1)
        }
    }

    /// Three lines, ten stations, interchanges at Majestic and RV Road.
    fn sample() -> MetroNetwork {
        network(&[
            ("purple", "Whitefield,Indiranagar,Majestic,Mysore Road"),
            ("green", "Nagasandra,Majestic,Lalbagh,RV Road"),
            ("yellow", "RV Road,Jayadeva,Electronic City,Bommasandra"),
        ])
    }

    #[test]
    fn test_path_through_interchange() {
        let net = network(&[("red", "A,B,C"), ("blue", "C,D,E")]);
        let path = find_path(&net, id(&net, "A"), id(&net, "E"));

        assert_eq!(names(&net, &path), vec!["A", "B", "C", "D", "E"]);
        assert_eq!(path.len() - 1, 4);
    }

    #[test]
    fn test_route_legs_and_transfers() {
        let net = network(&[("red", "A,B,C"), ("blue", "C,D,E")]);
        let route = find_route(&net, id(&net, "A"), id(&net, "E"));

        assert_eq!(route.stops(), 4);
        assert_eq!(route.transfers(), 1);
        assert_eq!(route.transfer_stations(), vec![id(&net, "C")]);

        let legs = route.legs();
        assert_eq!(legs.len(), 2);
        assert_eq!(net.line_color(legs[0].line), "red");
        assert_eq!(names(&net, &legs[0].stations), vec!["A", "B", "C"]);
        assert_eq!(net.line_color(legs[1].line), "blue");
        assert_eq!(names(&net, &legs[1].stations), vec!["C", "D", "E"]);
    }

    #[test]
    fn test_same_start_and_end_is_single_station() {
        let net = sample();
        let majestic = id(&net, "Majestic");
        assert_eq!(find_path(&net, majestic, majestic), vec![majestic]);

        let route = find_route(&net, majestic, majestic);
        assert_eq!(route.stops(), 0);
        assert!(route.legs().is_empty());
    }

    #[test]
    fn test_disconnected_components_have_no_path() {
        let net = network(&[("red", "A,B"), ("green", "X,Y")]);
        assert!(find_path(&net, id(&net, "A"), id(&net, "Y")).is_empty());
        assert!(find_route(&net, id(&net, "A"), id(&net, "Y")).is_empty());
        assert_eq!(distance(&net, id(&net, "B"), id(&net, "X")), None);
    }

    #[test]
    fn test_unknown_ids_have_no_path() {
        let net = sample();
        assert!(find_path(&net, 0, 999).is_empty());
        assert!(find_path(&net, 999, 0).is_empty());
    }

    #[test]
    fn test_interchange_joins_lines_whatever_its_position() {
        // Central is third on red and first on blue
        let net = network(&[
            ("red", "R1,R2,Central,R3"),
            ("blue", "Central,B1,B2"),
        ]);
        let central = id(&net, "Central");

        assert_eq!(distance(&net, id(&net, "R2"), central), Some(1));
        assert_eq!(distance(&net, central, id(&net, "B1")), Some(1));
        assert_eq!(distance(&net, id(&net, "R3"), id(&net, "B1")), Some(2));
        assert_eq!(distance(&net, id(&net, "R1"), id(&net, "B2")), Some(4));
    }

    #[test]
    fn test_every_pair_matches_true_distance() {
        let net = sample();
        let n = net.station_count();
        assert_eq!(n, 10);

        // Floyd-Warshall as an independent reference
        let mut dist = vec![vec![usize::MAX / 2; n]; n];
        for station in net.stations() {
            dist[station.id][station.id] = 0;
            for link in &station.neighbours {
                dist[station.id][link.station] = 1;
            }
        }
        for k in 0..n {
            for i in 0..n {
                for j in 0..n {
                    if dist[i][k] + dist[k][j] < dist[i][j] {
                        dist[i][j] = dist[i][k] + dist[k][j];
                    }
                }
            }
        }

        for a in 0..n {
            for b in 0..n {
                let path = find_path(&net, a, b);
                assert_eq!(path.first(), Some(&a));
                assert_eq!(path.last(), Some(&b));
                assert_eq!(path.len() - 1, dist[a][b], "{} -> {}", a, b);
                for pair in path.windows(2) {
                    assert!(net.station(pair[0]).unwrap().is_adjacent(pair[1]));
                }
            }
        }
    }

    #[test]
    fn test_sample_route_is_stable() {
        let net = sample();
        let start = id(&net, "Whitefield");
        let end = id(&net, "Bommasandra");

        for _ in 0..5 {
            let route = find_route(&net, start, end);
            assert_eq!(route.stops(), 7);
            assert_eq!(route.transfers(), 2);
            assert_eq!(
                names(&net, &route.transfer_stations()),
                vec!["Majestic", "RV Road"]
            );
        }
    }

    #[test]
    fn test_ties_break_by_input_order() {
        let net = network(&[("north", "A,B,D"), ("south", "A,C,D")]);
        let (a, d) = (id(&net, "A"), id(&net, "D"));

        for _ in 0..5 {
            assert_eq!(names(&net, &find_path(&net, a, d)), vec!["A", "B", "D"]);
        }
    }

    #[test]
    fn test_shared_track_keeps_current_line() {
        let net = network(&[
            ("red", "A,B,C,D"),
            ("blue", "X,B,C,Y"),
        ]);

        let route = find_route(&net, id(&net, "A"), id(&net, "D"));
        assert_eq!(route.transfers(), 0);
        let legs = route.legs();
        assert_eq!(legs.len(), 1);
        assert_eq!(net.line_color(legs[0].line), "red");

        let route = find_route(&net, id(&net, "X"), id(&net, "D"));
        assert_eq!(route.stops(), 3);
        assert_eq!(route.transfers(), 1);
    }

    #[test]
    fn test_bundled_network_end_to_end() {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("data")
            .join("metro_stations.csv");
        let net = MetroNetwork::load(&path).unwrap();
        assert_eq!(net.line_count(), 3);
        assert_eq!(net.interchanges().count(), 2);

        let route = find_route(&net, id(&net, "Whitefield (Kadugodi)"), id(&net, "Bommasandra"));
        assert_eq!(route.stops(), 44);
        assert_eq!(
            names(&net, &route.transfer_stations()),
            vec!["Majestic", "Rashtreeya Vidyalaya Road"]
        );

        let route = find_route(&net, id(&net, "Indiranagar"), id(&net, "Cubbon Park"));
        assert_eq!(route.stops(), 4);
        assert_eq!(route.transfers(), 0);
    }
}
