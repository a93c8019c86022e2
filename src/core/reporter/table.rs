//! Fixed-width text tables, one layout per record variant.

use super::{ReportEntry, Section};
use crate::core::dispatch::Mode;
use crate::core::pipeline::RunReport;
use crate::core::records::Record;
use std::io::{self, Write};

fn write_header<W: Write>(writer: &mut W, record: &Record) -> io::Result<()> {
    let (names, rule) = match record {
        Record::Identity(_) => (
            "make                           model                                            serial number                                             count",
            "----                           -----                                            -------------                                             -----",
        ),
        Record::Model(_) => (
            "make                           model                                                   count",
            "----                           -----                                                   -----",
        ),
        Record::FocalLength(_) => ("focal length        count", "------------        -----"),
        Record::Rating(_) => ("rating              count", "------------        -----"),
        Record::EmbeddedAsset(_) => ("   length     count sha256", "   ------     ----- ------"),
    };
    writeln!(writer, "{}", names)?;
    writeln!(writer, "{}", rule)
}

fn write_row<W: Write>(writer: &mut W, entry: &ReportEntry) -> io::Result<()> {
    let count = entry.count;
    match &entry.record {
        Record::Identity(r) => writeln!(
            writer,
            "{:<29}  {:<47}  {:<50} {:>12}",
            r.make, r.model, r.serial_number, count
        ),
        Record::Model(r) => writeln!(writer, "{:<29}  {:<47}  {:>12}", r.make, r.model, count),
        Record::FocalLength(r) => writeln!(writer, "{:>12} {:>12}", r.millimetres, count),
        Record::Rating(r) => writeln!(writer, "{:>12} {:>12}", r.rating, count),
        Record::EmbeddedAsset(r) => writeln!(
            writer,
            "{:>9} {:>9} {} {}",
            r.length,
            count,
            r.hash,
            r.path.display()
        ),
    }
}

/// `found N unique <label> ...` followed by the table
fn write_section<W: Write>(writer: &mut W, section: &Section) -> io::Result<()> {
    writeln!(
        writer,
        "found {} unique {} in {} files with that data",
        section.entries.len(),
        section.label,
        section.files_with_data()
    )?;

    if let Some(first) = section.entries.first() {
        write_header(writer, &first.record)?;
    }
    for entry in &section.entries {
        write_row(writer, entry)?;
    }
    Ok(())
}

/// Write the plain-text report for a finished run
pub fn write_text<W: Write>(report: &RunReport, mut writer: W) -> io::Result<()> {
    writeln!(writer, "found {} files", report.total_files)?;
    writeln!(writer)?;

    for (i, section) in report.sections.iter().enumerate() {
        if i > 0 {
            writeln!(writer)?;
        }
        write_section(&mut writer, section)?;
    }

    let counters = &report.counters;
    match report.mode {
        Mode::EditorEdits => {
            writeln!(writer, "files with    editor edits: {}", counters.with_edits)?;
            writeln!(writer, "files without editor edits: {}", counters.without_edits)?;
        }
        Mode::HasImage => writeln!(writer, "files with an image: {}", counters.has_image)?,
        Mode::Gps => writeln!(writer, "files with GPS coordinates: {}", counters.has_gps)?,
        Mode::Embedded => {
            let unique = report.sections.first().map_or(0, |s| s.entries.len());
            writeln!(
                writer,
                "found {} unique embedded images in {} files",
                unique, counters.has_image
            )?;
            if let Some(materialized) = &report.materialized {
                writeln!(
                    writer,
                    "wrote {} embedded images to {}",
                    materialized.written.len(),
                    materialized.out_dir.display()
                )?;
            }
        }
        _ => {}
    }

    Ok(())
}
