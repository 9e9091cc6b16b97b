//! CSV plumbing for file-backed roster tables.
//!
//! - **Delimiter resolution**: `.tsv` files default to tab, everything else to
//!   comma, unless a delimiter is given explicitly.
//! - **Encoding**: cells are decoded with `encoding_rs` (UTF-8 unless a label
//!   is configured) and re-encoded the same way when the file is rewritten.
//! - **Ragged rows**: readers are flexible because spreadsheet exports drop
//!   trailing empty cells.

use std::{
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

use anyhow::{Result, anyhow};
use csv::QuoteStyle;
use encoding_rs::{Encoding, UTF_8};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

pub fn resolve_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    })
}

/// Parses a delimiter argument such as `,`, `tab`, `;` or `|`.
pub fn parse_delimiter(value: &str) -> std::result::Result<u8, String> {
    match value {
        "tab" | "\\t" | "\t" => Ok(b'\t'),
        "comma" => Ok(b','),
        "semicolon" => Ok(b';'),
        "pipe" => Ok(b'|'),
        other if other.len() == 1 && other.is_ascii() => Ok(other.as_bytes()[0]),
        other => Err(format!("Unsupported delimiter '{other}'")),
    }
}

pub fn open_csv_reader<R>(reader: R, delimiter: u8) -> csv::Reader<R>
where
    R: Read,
{
    csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true)
        .from_reader(reader)
}

pub fn open_csv_reader_from_path(
    path: &Path,
    delimiter: u8,
) -> std::io::Result<csv::Reader<BufReader<File>>> {
    let file = File::open(path)?;
    Ok(open_csv_reader(BufReader::new(file), delimiter))
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(anyhow!(
            "Failed to decode text with encoding {}",
            encoding.name()
        ))
    } else {
        Ok(text.into_owned())
    }
}

pub fn decode_record(record: &csv::ByteRecord, encoding: &'static Encoding) -> Result<Vec<String>> {
    record
        .iter()
        .map(|field| decode_bytes(field, encoding))
        .collect()
}

/// Serialises `rows` as delimited text encoded with `encoding`.
pub fn encode_rows(
    rows: &[Vec<String>],
    delimiter: u8,
    encoding: &'static Encoding,
) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .quote_style(QuoteStyle::Necessary)
        .double_quote(true)
        .flexible(true)
        .from_writer(Vec::new());
    for row in rows {
        writer.write_record(row)?;
    }
    let buffer = writer
        .into_inner()
        .map_err(|err| anyhow!("Flushing CSV buffer: {}", err.error()))?;
    if encoding == UTF_8 {
        return Ok(buffer);
    }
    let text = String::from_utf8(buffer)?;
    let (encoded, _, had_errors) = encoding.encode(&text);
    if had_errors {
        return Err(anyhow!("Failed to encode text using {}", encoding.name()));
    }
    Ok(encoded.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn delimiter_follows_extension_unless_given() {
        assert_eq!(resolve_delimiter(&PathBuf::from("roster.TSV"), None), b'\t');
        assert_eq!(resolve_delimiter(&PathBuf::from("roster.csv"), None), b',');
        assert_eq!(resolve_delimiter(&PathBuf::from("roster.tsv"), Some(b';')), b';');
    }

    #[test]
    fn parse_delimiter_accepts_names_and_single_bytes() {
        assert_eq!(parse_delimiter("tab").unwrap(), b'\t');
        assert_eq!(parse_delimiter("|").unwrap(), b'|');
        assert!(parse_delimiter("::").is_err());
    }

    #[test]
    fn reader_accepts_ragged_rows() {
        let data = "ID,Name,Discord ID\n1,Alice\n";
        let mut reader = open_csv_reader(data.as_bytes(), b',');
        let rows = reader
            .byte_records()
            .map(|r| decode_record(&r.expect("record"), UTF_8).expect("decode"))
            .collect::<Vec<_>>();
        assert_eq!(rows[1], vec!["1", "Alice"]);
    }

    #[test]
    fn encode_rows_quotes_only_when_needed_and_transcodes() {
        let rows = vec![
            vec!["KVK KILLS | T4 + T5".to_string(), "Name".to_string()],
            vec!["1,200".to_string(), "Zoë".to_string()],
        ];
        let utf8 = encode_rows(&rows, b',', UTF_8).expect("encode");
        assert_eq!(
            String::from_utf8(utf8).unwrap(),
            "KVK KILLS | T4 + T5,Name\n\"1,200\",Zoë\n"
        );
        let latin1 = resolve_encoding(Some("latin1")).expect("label");
        let encoded = encode_rows(&rows, b',', latin1).expect("encode");
        assert!(encoded.contains(&0xEB));
    }
}
