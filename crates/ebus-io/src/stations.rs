//! Station list CSV.
//!
//! ```csv
//! name,latitude,longitude
//! Central,53.34,-6.26
//! Airport,53.42,-6.24
//! ```
//!
//! The first row is a header. The first column of each following row is
//! the station name; row order defines the station index used by the
//! distance file, the charging plan and the route file. Other columns are
//! ignored.

use std::io::Read;
use std::path::Path;

use ebus_core::{SchedError, SchedResult};
use tracing::debug;

use crate::{csv_error, in_file, open};

/// Read station names from `path`.
pub fn read_stations(path: &Path) -> SchedResult<Vec<String>> {
    let names = parse_stations(open(path)?).map_err(|e| in_file(path, e))?;
    debug!(stations = names.len(), path = %path.display(), "loaded stations");
    Ok(names)
}

/// Read station names from any CSV source.
pub fn parse_stations<R: Read>(reader: R) -> SchedResult<Vec<String>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut names = Vec::new();
    for (row, record) in rdr.records().enumerate() {
        let record = record.map_err(csv_error)?;
        let name = record.get(0).unwrap_or_default();
        if name.is_empty() {
            return Err(SchedError::data(format!("station row {} has no name", row + 1)));
        }
        names.push(name.to_string());
    }

    if names.is_empty() {
        return Err(SchedError::data("station file lists no stations"));
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_column_is_the_name() {
        let csv = "name,lat,lon\nCentral,1,2\n Airport ,3,4\n";
        let names = parse_stations(csv.as_bytes()).unwrap();
        assert_eq!(names, vec!["Central", "Airport"]);
    }

    #[test]
    fn test_missing_name_is_a_data_error() {
        let csv = "name\nCentral\n\"\"\n";
        let err = parse_stations(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("row 2"));
        assert!(matches!(err, SchedError::DataConsistency(_)));
    }

    #[test]
    fn test_header_only_file_is_rejected() {
        assert!(parse_stations("name\n".as_bytes()).is_err());
    }
}
