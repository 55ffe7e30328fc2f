//! CSV reader/writer construction, delimiter resolution, and input decoding.
//!
//! Well exports and every artifact this crate writes flow through here:
//!
//! - **Delimiter resolution**: `.tsv` → tab, anything else → comma, unless the
//!   caller passes `--delimiter`.
//! - **Encoding**: input cells are decoded with `encoding_rs` (UTF-8 default),
//!   so Windows-1252 exports with degree signs or accented lease names load.
//! - **Output**: artifacts are plain UTF-8, quoted only where necessary, with
//!   no synthetic index column.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
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

pub fn resolve_input_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    })
}

pub fn open_csv_reader<R>(reader: R, delimiter: u8) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true);
    builder.from_reader(reader)
}

pub fn open_csv_reader_from_path(
    path: &Path,
    delimiter: u8,
) -> Result<csv::Reader<BufReader<File>>> {
    let file = File::open(path).with_context(|| format!("Opening input file {path:?}"))?;
    Ok(open_csv_reader(BufReader::new(file), delimiter))
}

pub fn open_csv_writer(path: &Path, delimiter: u8) -> Result<csv::Writer<Box<dyn Write>>> {
    let base: Box<dyn Write> = Box::new(BufWriter::new(
        File::create(path).with_context(|| format!("Creating output file {path:?}"))?,
    ));
    let mut builder = csv::WriterBuilder::new();
    builder
        .delimiter(delimiter)
        .quote_style(QuoteStyle::Necessary)
        .double_quote(true);
    Ok(builder.from_writer(base))
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

pub fn reader_headers<R>(
    reader: &mut csv::Reader<R>,
    encoding: &'static Encoding,
) -> Result<Vec<String>>
where
    R: Read,
{
    let headers = reader.byte_headers()?.clone();
    let mut decoded = decode_record(&headers, encoding)?;
    // Excel-saved exports lead with a UTF-8 byte order mark.
    if let Some(first) = decoded.first_mut()
        && let Some(stripped) = first.strip_prefix('\u{feff}')
    {
        *first = stripped.to_string();
    }
    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn delimiter_follows_extension_unless_overridden() {
        assert_eq!(resolve_input_delimiter(&PathBuf::from("wells.tsv"), None), b'\t');
        assert_eq!(resolve_input_delimiter(&PathBuf::from("wells.csv"), None), b',');
        assert_eq!(resolve_input_delimiter(&PathBuf::from("wells.tsv"), Some(b';')), b';');
    }

    #[test]
    fn resolve_encoding_rejects_unknown_labels() {
        assert_eq!(resolve_encoding(None).unwrap(), UTF_8);
        assert_eq!(
            resolve_encoding(Some("windows-1252")).unwrap().name(),
            "windows-1252"
        );
        assert!(resolve_encoding(Some("klingon")).is_err());
    }

    #[test]
    fn reader_headers_strips_byte_order_mark() {
        let data = "\u{feff}Well Name,API 14\nA,42123456780001\n";
        let mut reader = open_csv_reader(data.as_bytes(), b',');
        let headers = reader_headers(&mut reader, UTF_8).unwrap();
        assert_eq!(headers, vec!["Well Name".to_string(), "API 14".to_string()]);
    }
}
