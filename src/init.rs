use crate::error::Result;
use csv::Writer;
use std::path::PathBuf;

/// Writes an empty personnel CSV with the headers `Directory::from_csv` expects.
pub fn init_csv(filename: &str) -> Result<PathBuf> {
    let csv_filename = if filename.ends_with(".csv") {
        filename.to_string()
    } else {
        format!("{}.csv", filename)
    };

    let mut wtr = Writer::from_path(&csv_filename)?;
    wtr.write_record(["id", "nome", "patente"])?;
    wtr.flush()?;
    tracing::info!(file = %csv_filename, "directory template written");
    Ok(PathBuf::from(csv_filename))
}
