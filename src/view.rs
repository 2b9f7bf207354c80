// Plain-text rendering of swing lists, the stats card and the club list

use itertools::Itertools;

use crate::preferences::{Club, SwingStatsSnapshot};
use crate::swings::{Dataset, SourceKind, SwingRecord};

pub const EMPTY_STATE: &str = "No swing data available. Start the analyzer or enable simulated data.";
const NO_STATS: &str = "No swing stats yet. Run `swingview latest` or `swingview stats mock`.";
const MISSING: &str = "-";

struct Column {
    title: &'static str,
    value: fn(&SwingRecord) -> Option<String>,
}

fn fixed(v: Option<f64>, decimals: usize) -> Option<String> {
    v.map(|v| format!("{v:.decimals$}"))
}

const METRIC_COLUMNS: &[Column] = &[
    Column {
        title: "Speed km/h",
        value: |r| fixed(r.club_speed_kph, 1),
    },
    Column {
        title: "Launch °",
        value: |r| fixed(r.launch_angle_deg, 1),
    },
    Column {
        title: "Attack °",
        value: |r| fixed(r.attack_angle_deg, 1),
    },
    Column {
        title: "Path °",
        value: |r| fixed(r.club_path_deg, 1),
    },
    Column {
        title: "Spin rpm",
        value: |r| fixed(r.spin_rate_rpm, 0),
    },
];

const TEMPO_COLUMNS: &[Column] = &[
    Column {
        title: "Backswing s",
        value: |r| fixed(r.backswing_s, 3),
    },
    Column {
        title: "Downswing s",
        value: |r| fixed(r.downswing_s, 3),
    },
    Column {
        title: "Ratio",
        value: |r| fixed(r.ratio, 2).map(|ratio| format!("{ratio}:1")),
    },
    Column {
        title: "Impact s",
        value: |r| fixed(r.timestamps.impact, 3),
    },
];

/// Table of `records`, or the empty-state message when there are none.
pub fn render_swing_table(records: &[SwingRecord], dataset: Dataset) -> String {
    if records.is_empty() {
        return EMPTY_STATE.to_string();
    }

    let columns = match dataset {
        Dataset::Metrics => METRIC_COLUMNS,
        Dataset::Tempo => TEMPO_COLUMNS,
    };

    let header: Vec<String> = std::iter::once("#".to_string())
        .chain(columns.iter().map(|c| c.title.to_string()))
        .collect();
    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|record| {
            std::iter::once(record.index.to_string())
                .chain(
                    columns
                        .iter()
                        .map(|c| (c.value)(record).unwrap_or_else(|| MISSING.to_string())),
                )
                .collect()
        })
        .collect();

    let widths: Vec<usize> = (0..header.len())
        .map(|i| {
            std::iter::once(&header)
                .chain(rows.iter())
                .map(|row| row[i].chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();

    std::iter::once(&header)
        .chain(rows.iter())
        .map(|row| format_row(row, &widths))
        .join("\n")
}

fn format_row(cells: &[String], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:>width$}"))
        .join("  ")
        .trim_end()
        .to_string()
}

/// One-line summary of where a list came from.
pub fn render_source_line(source: Option<SourceKind>, count: usize) -> String {
    match source {
        Some(source) => format!("{count} swings from {source}"),
        None => "No source responded".to_string(),
    }
}

pub fn render_stats_card(stats: Option<&SwingStatsSnapshot>, club: Option<Club>) -> String {
    let club_line = match club {
        Some(club) => format!("Club:          {club}"),
        None => "Club:          none selected".to_string(),
    };
    let Some(stats) = stats else {
        return format!("{club_line}\n{NO_STATS}");
    };

    [
        club_line,
        format!("Club speed:    {:.1} km/h", stats.club_speed_kph),
        format!("Launch angle:  {:.1}°", stats.launch_angle_deg),
        format!("Attack angle:  {:+.1}°", stats.attack_angle_deg),
        format!("Club path:     {:+.1}°", stats.club_path_deg),
        format!(
            "Updated:       {}",
            stats.updated_at.format("%Y-%m-%d %H:%M:%S UTC")
        ),
    ]
    .join("\n")
}

/// Every club with its code, the selected one marked.
pub fn render_club_list(selected: Option<Club>) -> String {
    Club::ALL
        .iter()
        .map(|club| {
            let marker = if Some(*club) == selected { "*" } else { " " };
            format!("{marker} {:<3} {}", club.code(), club.name())
        })
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_empty_list_shows_empty_state() {
        assert_eq!(render_swing_table(&[], Dataset::Metrics), EMPTY_STATE);
        assert_eq!(render_swing_table(&[], Dataset::Tempo), EMPTY_STATE);
    }

    #[test]
    fn test_metrics_table_marks_missing_fields() {
        let records = vec![
            SwingRecord {
                index: 0,
                club_speed_kph: Some(144.0),
                launch_angle_deg: Some(12.25),
                ..SwingRecord::default()
            },
            SwingRecord {
                index: 1,
                ..SwingRecord::default()
            },
        ];
        let table = render_swing_table(&records, Dataset::Metrics);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("Speed km/h"));
        assert!(lines[1].contains("144.0"));
        assert!(lines[1].contains("12.2") || lines[1].contains("12.3"));
        assert!(lines[2].trim_start().starts_with('1'));
        assert_eq!(lines[2].matches(MISSING).count(), 5);
    }

    #[test]
    fn test_tempo_table() {
        let records = vec![SwingRecord {
            index: 3,
            backswing_s: Some(0.9),
            downswing_s: Some(0.3),
            ratio: Some(3.0),
            ..SwingRecord::default()
        }];
        let table = render_swing_table(&records, Dataset::Tempo);
        assert!(table.contains("3.00:1"));
        assert!(table.contains("0.900"));
        assert!(!table.contains("Speed"));
    }

    #[test]
    fn test_stats_card() {
        let stats = SwingStatsSnapshot {
            club_speed_kph: 150.2,
            launch_angle_deg: 14.0,
            attack_angle_deg: -3.5,
            club_path_deg: 1.0,
            updated_at: Utc.with_ymd_and_hms(2024, 5, 1, 10, 30, 0).unwrap(),
        };
        let card = render_stats_card(Some(&stats), Some(Club::Iron7));
        assert!(card.contains("7 Iron"));
        assert!(card.contains("150.2 km/h"));
        assert!(card.contains("-3.5°"));
        assert!(card.contains("+1.0°"));
        assert!(card.contains("2024-05-01 10:30:00 UTC"));
    }

    #[test]
    fn test_stats_card_without_stats() {
        let card = render_stats_card(None, None);
        assert!(card.contains("none selected"));
        assert!(card.contains(NO_STATS));
    }

    #[test]
    fn test_club_list_marks_selection() {
        let list = render_club_list(Some(Club::Driver));
        assert_eq!(list.lines().count(), Club::ALL.len());
        assert!(list.lines().next().unwrap().starts_with("* D"));
        assert_eq!(list.matches('*').count(), 1);
    }
}
