use std::io::Write;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{ArmError, Result};

/// Extracts one named variable from downloaded netCDF bytes.
///
/// libnetcdf opens by path, so the bytes land in a scratch file that lives
/// exactly as long as the parse; the `NamedTempFile` guard removes it on
/// every exit path, including parse failure.
///
/// Values come back flattened in storage order, one element per recorded
/// sample, with no slicing, unit conversion, or QC filtering.
pub fn extract_variable(bytes: &[u8], file_name: &str, variable: &str) -> Result<Vec<f64>> {
    let mut scratch = NamedTempFile::new()?;
    scratch.write_all(bytes)?;
    scratch.flush()?;

    let file = netcdf::open(scratch.path())
        .map_err(|e| ArmError::Format(format!("{file_name}: {e}")))?;

    let Some(var) = file.variable(variable) else {
        let mut names: Vec<String> = file.variables().map(|v| v.name()).collect();
        names.sort();
        return Err(ArmError::NotFound(format!(
            "variable '{variable}' not found in {file_name}; available variables: {}",
            names.join(", ")
        )));
    };

    let values = var.get_values::<f64, _>(..).map_err(|e| {
        ArmError::Format(format!(
            "failed to read variable '{variable}' from {file_name}: {e}"
        ))
    })?;

    debug!(variable, samples = values.len(), "extracted variable");
    Ok(values)
}
