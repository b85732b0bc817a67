//! Quote-aware field extraction from one logical line.
//!
//! The export does not quote its recipient column, so recipients spill into
//! any number of extra CSV columns. Only the first three fields (date, size,
//! sender) can be trusted as CSV; everything after the third unquoted comma
//! is kept verbatim as the recipient blob.

/// The four raw fields of a record, before any interpretation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFields {
    pub date: String,
    pub size: String,
    pub from_raw: String,
    /// Unsplit recipient text, trailing empty columns removed.
    pub to_raw: String,
}

/// Split a logical line into date, size, sender and recipient blob.
///
/// A `"` toggles quoting; `""` inside quotes is a literal quote. A comma
/// outside quotes closes a field. After three fields the remainder of the
/// line becomes the recipient blob without further scanning. Lines with
/// fewer than three delimiters are padded with empty fields.
pub fn scan_fields(line: &str) -> RawFields {
    let mut fields: Vec<String> = Vec::with_capacity(4);
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.char_indices().peekable();

    while let Some((i, ch)) = chars.next() {
        match ch {
            '"' if in_quotes => {
                if matches!(chars.peek(), Some((_, '"'))) {
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
                if fields.len() == 3 {
                    let rest = &line[i + 1..];
                    let to_raw = rest.trim().trim_end_matches(',').trim();
                    return into_raw(fields, to_raw.to_string());
                }
            }
            _ => current.push(ch),
        }
    }

    fields.push(current.trim().to_string());
    into_raw(fields, String::new())
}

fn into_raw(fields: Vec<String>, to_raw: String) -> RawFields {
    let mut it = fields.into_iter();
    RawFields {
        date: it.next().unwrap_or_default(),
        size: it.next().unwrap_or_default(),
        from_raw: it.next().unwrap_or_default(),
        to_raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spilled_recipient_blob() {
        let fields = scan_fields(
            "11/30/2010 13:27,10.8K,\"Hopp, Bryan\" <BHopp@spokanecounty.org>,\"Smith, John\" <JSmith@spokanecounty.org>,,,,,",
        );
        assert_eq!(fields.date, "11/30/2010 13:27");
        assert_eq!(fields.size, "10.8K");
        assert_eq!(fields.from_raw, "Hopp, Bryan <BHopp@spokanecounty.org>");
        assert_eq!(fields.to_raw, "\"Smith, John\" <JSmith@spokanecounty.org>");
    }

    #[test]
    fn test_blob_is_verbatim_after_third_comma() {
        let fields = scan_fields("d,s,f,\"a, b\" <a@x.org>, \"c, d\" <c@x.org>");
        assert_eq!(fields.to_raw, "\"a, b\" <a@x.org>, \"c, d\" <c@x.org>");
    }

    #[test]
    fn test_doubled_quote_is_literal() {
        let fields = scan_fields("d,s,\"The \"\"Boss\"\" <b@x.org>\",t@x.org");
        assert_eq!(fields.from_raw, "The \"Boss\" <b@x.org>");
        assert_eq!(fields.to_raw, "t@x.org");
    }

    #[test]
    fn test_quoted_comma_does_not_split() {
        let fields = scan_fields("\"11/30/2010, 13:27\",1K,f@x.org,t@x.org");
        assert_eq!(fields.date, "11/30/2010, 13:27");
        assert_eq!(fields.size, "1K");
    }

    #[test]
    fn test_short_line_is_padded() {
        assert_eq!(
            scan_fields("11/30/2010 13:27,1K"),
            RawFields {
                date: "11/30/2010 13:27".into(),
                size: "1K".into(),
                ..Default::default()
            }
        );
        assert_eq!(
            scan_fields("11/30/2010 13:27,1K,f@x.org"),
            RawFields {
                date: "11/30/2010 13:27".into(),
                size: "1K".into(),
                from_raw: "f@x.org".into(),
                to_raw: String::new(),
            }
        );
    }

    #[test]
    fn test_empty_line() {
        assert_eq!(scan_fields(""), RawFields::default());
    }

    #[test]
    fn test_trailing_empty_columns_only() {
        let fields = scan_fields("d,s,f,,,,");
        assert_eq!(fields.from_raw, "f");
        assert_eq!(fields.to_raw, "");
    }
}
