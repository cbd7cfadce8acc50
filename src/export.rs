//! Metrics time-series export
//!
//! Plain delimited text: a header row naming each column, one row per
//! recorded tick, comma-separated. The simulation never reads this back.

use std::fmt::Write as _;
use std::io;
use std::path::Path;

use crate::sim::MetricsSample;

const HEADER: &str = "time,red_cells,pathogens,neutrophils,macrophages,t_cells,b_cells,antibodies";

/// Render the recorded samples as CSV, one row per tick in tick order.
pub fn metrics_csv(samples: &[MetricsSample]) -> String {
    let mut out = String::with_capacity(32 * (samples.len() + 1));
    out.push_str(HEADER);
    out.push('\n');
    for s in samples {
        let c = s.counts;
        // Writing to a String cannot fail.
        let _ = writeln!(
            out,
            "{:.3},{},{},{},{},{},{},{}",
            s.time,
            c.red_cells,
            c.pathogens,
            c.neutrophils,
            c.macrophages,
            c.t_cells,
            c.b_cells,
            c.antibodies
        );
    }
    out
}

/// Write the CSV to a file.
pub fn write_metrics_csv(path: &Path, samples: &[MetricsSample]) -> io::Result<()> {
    std::fs::write(path, metrics_csv(samples))?;
    log::info!("wrote {} metric rows to {}", samples.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::KindCounts;

    fn sample(time: f32, pathogens: usize) -> MetricsSample {
        MetricsSample {
            time,
            counts: KindCounts {
                red_cells: 40,
                pathogens,
                neutrophils: 2,
                macrophages: 1,
                t_cells: 1,
                b_cells: 1,
                antibodies: 0,
            },
        }
    }

    #[test]
    fn test_header_names_every_column() {
        let csv = metrics_csv(&[]);
        assert_eq!(csv, format!("{HEADER}\n"));
        assert_eq!(HEADER.split(',').count(), 8);
    }

    #[test]
    fn test_one_row_per_sample_in_order() {
        let csv = metrics_csv(&[sample(0.0, 1), sample(1.0 / 60.0, 3)]);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "0.000,40,1,2,1,1,1,0");
        assert_eq!(lines[2], "0.017,40,3,2,1,1,1,0");
    }
}
