//! Station distance CSV.
//!
//! ```csv
//! from,to,distance
//! 0,1,4.2
//! 1,2,3.1
//! 0,2,6.8
//! ```
//!
//! Station indices follow the station file. Each unordered pair needs one
//! entry in either direction; the missing direction is mirrored and the
//! diagonal is zero. If both directions are given and disagree, the entry
//! with `from < to` is used.

use std::io::Read;
use std::path::Path;

use ebus_core::{SchedError, SchedResult};
use tracing::{debug, warn};

use crate::{csv_error, in_file, open};

/// Read the `num_stations x num_stations` distance matrix (km) from `path`.
pub fn read_distances(path: &Path, num_stations: usize) -> SchedResult<Vec<Vec<f64>>> {
    let matrix = parse_distances(open(path)?, num_stations).map_err(|e| in_file(path, e))?;
    debug!(stations = num_stations, path = %path.display(), "loaded distance matrix");
    Ok(matrix)
}

/// Read a distance matrix from any CSV source.
pub fn parse_distances<R: Read>(reader: R, num_stations: usize) -> SchedResult<Vec<Vec<f64>>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut given: Vec<Vec<Option<f64>>> = vec![vec![None; num_stations]; num_stations];
    for (row, record) in rdr.records().enumerate() {
        let record = record.map_err(csv_error)?;
        let field = |i: usize, what: &str| {
            record.get(i).ok_or_else(|| {
                SchedError::Parse(format!("distance row {} has no {} column", row + 1, what))
            })
        };
        let from = parse_index(field(0, "from")?, row)?;
        let to = parse_index(field(1, "to")?, row)?;
        let distance: f64 = field(2, "distance")?.parse().map_err(|_| {
            SchedError::Parse(format!("distance row {} has a non-numeric distance", row + 1))
        })?;

        if from >= num_stations || to >= num_stations {
            return Err(SchedError::data(format!(
                "distance row {} references station {} but only {} stations exist",
                row + 1,
                from.max(to),
                num_stations
            )));
        }
        given[from][to] = Some(distance);
    }

    let mut matrix = vec![vec![0.0; num_stations]; num_stations];
    for i in 0..num_stations {
        for j in (i + 1)..num_stations {
            let distance = match (given[i][j], given[j][i]) {
                (Some(forward), Some(backward)) => {
                    if forward != backward {
                        warn!(
                            from = i,
                            to = j,
                            forward,
                            backward,
                            "asymmetric distance entries; using the forward value"
                        );
                    }
                    forward
                }
                (Some(d), None) | (None, Some(d)) => d,
                (None, None) => {
                    return Err(SchedError::data(format!(
                        "no distance between stations {} and {}",
                        i, j
                    )))
                }
            };
            matrix[i][j] = distance;
            matrix[j][i] = distance;
        }
    }
    Ok(matrix)
}

fn parse_index(value: &str, row: usize) -> SchedResult<usize> {
    value.parse().map_err(|_| {
        SchedError::Parse(format!(
            "distance row {} has invalid station index '{}'",
            row + 1,
            value
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_direction_is_mirrored() {
        let csv = "from,to,distance\n0,1,4.0\n2,1,3.0\n0,2,6.5\n";
        let m = parse_distances(csv.as_bytes(), 3).unwrap();
        assert_eq!(m[1][0], 4.0);
        assert_eq!(m[1][2], 3.0);
        assert_eq!(m[2][1], 3.0);
        assert_eq!(m[2][0], 6.5);
        assert!((0..3).all(|i| m[i][i] == 0.0));
    }

    #[test]
    fn test_forward_entry_wins() {
        let csv = "from,to,distance\n0,1,4.0\n1,0,5.0\n";
        let m = parse_distances(csv.as_bytes(), 2).unwrap();
        assert_eq!(m[0][1], 4.0);
        assert_eq!(m[1][0], 4.0);
    }

    #[test]
    fn test_diagonal_is_forced_to_zero() {
        let csv = "from,to,distance\n0,0,9.0\n0,1,1.0\n";
        let m = parse_distances(csv.as_bytes(), 2).unwrap();
        assert_eq!(m[0][0], 0.0);
    }

    #[test]
    fn test_missing_pair_is_a_data_error() {
        let csv = "from,to,distance\n0,1,4.0\n";
        let err = parse_distances(csv.as_bytes(), 3).unwrap_err();
        assert!(matches!(err, SchedError::DataConsistency(_)));
        assert!(err.to_string().contains("stations 0 and 2"));
    }

    #[test]
    fn test_station_out_of_range() {
        let csv = "from,to,distance\n0,5,4.0\n";
        let err = parse_distances(csv.as_bytes(), 2).unwrap_err();
        assert!(matches!(err, SchedError::DataConsistency(_)));
    }

    #[test]
    fn test_bad_number_is_a_parse_error() {
        let csv = "from,to,distance\n0,1,far\n";
        let err = parse_distances(csv.as_bytes(), 2).unwrap_err();
        assert!(matches!(err, SchedError::Parse(_)));
    }
}
