//! JSON export for scripting.

use crate::core::pipeline::RunReport;
use std::io::{self, Write};

/// Write the run as a pretty-printed JSON document
pub fn write_json<W: Write>(report: &RunReport, mut writer: W) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut writer, report)?;
    writeln!(writer)
}
