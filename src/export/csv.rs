//! Export a message table to CSV.
//!
//! Output is UTF-8 with BOM for Excel compatibility. List columns are
//! joined with `;`.

use std::io::Write;
use std::path::Path;

use crate::model::record::MessageTable;

const HEADER: &str = "msg_id,timestamp,size_bytes,from_email,from_name,to_emails,to_names,n_recipients,week_id,hour,day_of_week,is_after_hours,is_weekend,from_is_distribution_list";

/// Export every record of `table` to `output_path`.
pub fn export_csv(table: &MessageTable, output_path: &Path) -> anyhow::Result<()> {
    let file = std::fs::File::create(output_path)?;
    let mut out = std::io::BufWriter::new(file);
    write_csv(table, &mut out)?;
    out.flush()?;
    Ok(())
}

/// Write the CSV form of `table` to any writer.
pub fn write_csv(table: &MessageTable, out: &mut impl Write) -> std::io::Result<()> {
    // UTF-8 BOM for Excel
    out.write_all(&[0xEF, 0xBB, 0xBF])?;
    writeln!(out, "{HEADER}")?;

    for r in table {
        writeln!(
            out,
            "{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
            r.msg_id,
            r.timestamp.format("%Y-%m-%d %H:%M:%S"),
            r.size_bytes,
            csv_escape(&r.from_email),
            csv_escape(&r.from_name),
            csv_escape(&r.to_emails.join(";")),
            csv_escape(&r.to_names.join(";")),
            r.n_recipients,
            r.week_id,
            r.hour,
            r.day_of_week,
            r.is_after_hours,
            r.is_weekend,
            r.from_is_distribution_list,
        )?;
    }
    Ok(())
}

/// Escape a value for CSV (RFC 4180).
///
/// Wraps in double quotes if the value contains commas, quotes, or newlines.
fn csv_escape(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_escape_simple() {
        assert_eq!(csv_escape("hello"), "hello");
    }

    #[test]
    fn test_csv_escape_comma() {
        assert_eq!(csv_escape("Hopp, Bryan"), "\"Hopp, Bryan\"");
    }

    #[test]
    fn test_csv_escape_quotes() {
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_empty_table_has_header_only() {
        let mut buf = Vec::new();
        write_csv(&MessageTable::default(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.trim_start_matches('\u{feff}'), format!("{HEADER}\n"));
    }
}
