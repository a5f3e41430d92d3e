//! Trade-log export — CSV artifacts for external analysis.

use std::io::Write;
use std::path::Path;

use thiserror::Error;

use lotlab_core::domain::ClosedTrade;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

/// Write the trade log as CSV to any writer.
pub fn write_trades_csv<W: Write>(writer: W, trades: &[ClosedTrade]) -> Result<(), ExportError> {
    let mut out = csv::Writer::from_writer(writer);
    for trade in trades {
        out.serialize(trade)?;
    }
    out.flush()?;
    Ok(())
}

/// Write the trade log as CSV to a file path.
pub fn export_trades_csv(path: &Path, trades: &[ClosedTrade]) -> Result<(), ExportError> {
    let file = std::fs::File::create(path)?;
    write_trades_csv(file, trades)
}
