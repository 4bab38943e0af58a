//! Schedule result persistence.
//!
//! A [`ScheduleResult`] is stored as pretty-printed JSON. Reading validates
//! the record so a hand-edited or truncated file is rejected before it can
//! seed a recalculation.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use ebus_core::{ScheduleResult, SchedResult};
use tracing::info;

use crate::{in_file, open};

/// Write `result` to `path`, replacing any existing file.
pub fn write_solution(path: &Path, result: &ScheduleResult) -> SchedResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, result)?;
    writer.flush()?;
    info!(path = %path.display(), buses = result.buses.len(), "wrote schedule");
    Ok(())
}

/// Read and validate a schedule written by [`write_solution`].
pub fn read_solution(path: &Path) -> SchedResult<ScheduleResult> {
    let result: ScheduleResult = serde_json::from_reader(BufReader::new(open(path)?))
        .map_err(|e| in_file(path, e.into()))?;
    result.validate().map_err(|e| in_file(path, e))?;
    Ok(result)
}
