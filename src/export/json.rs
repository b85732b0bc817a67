//! Export a message table to JSON.

use std::io::Write;
use std::path::Path;

use crate::model::record::MessageTable;

/// Write `table` as a pretty-printed JSON array of records.
pub fn export_json(table: &MessageTable, output_path: &Path) -> anyhow::Result<()> {
    let file = std::fs::File::create(output_path)?;
    let mut out = std::io::BufWriter::new(file);
    serde_json::to_writer_pretty(&mut out, table.records())?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatasetConfig;
    use crate::ingest::pipeline::ingest_reader;
    use std::io::Cursor;

    #[test]
    fn test_export_json_array() {
        let input = "Date,Size,From,To\n11/30/2010 13:27,1K,\"Hopp, Bryan\" <BHopp@x.org>,b@x.org, c@x.org\n";
        let outcome = ingest_reader(
            Cursor::new(input.as_bytes()),
            "<memory>",
            &DatasetConfig::default(),
            0,
        )
        .unwrap();
        let table = MessageTable::from_records(outcome.records);

        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("table.json");
        export_json(&table, &path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let rows = value.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["from_name"], "Bryan Hopp");
        assert_eq!(rows[0]["to_emails"], serde_json::json!(["b@x.org", "c@x.org"]));
        assert_eq!(rows[0]["n_recipients"], 2);
    }
}
