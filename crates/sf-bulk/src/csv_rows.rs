//! CSV encoding of upload payloads and decoding of result bodies.

use serde::de::DeserializeOwned;

use crate::error::{Error, ErrorKind, Result};

/// Parse a CSV body with a header row into rows.
///
/// An empty or whitespace-only body yields no rows.
pub fn parse_rows<R: DeserializeOwned>(body: &[u8]) -> Result<Vec<R>> {
    if body.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(Vec::new());
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(body);

    reader
        .deserialize()
        .collect::<std::result::Result<Vec<R>, csv::Error>>()
        .map_err(Into::into)
}

/// Encode a header row and data rows as an upload payload (comma delimited, LF line endings).
pub fn write_rows<I, R, F>(headers: &[&str], rows: I) -> Result<String>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator<Item = F>,
    F: AsRef<[u8]>,
{
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| Error::new(ErrorKind::Csv(e.to_string())))?;
    String::from_utf8(bytes).map_err(|e| Error::with_source(ErrorKind::Csv(e.to_string()), e))
}

/// Payload for `delete`/`hardDelete` jobs: a single `Id` column.
pub fn ids_payload<I, S>(ids: I) -> Result<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    write_rows(&["Id"], ids.into_iter().map(|id| [id.as_ref().to_owned()]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Record;

    #[test]
    fn test_parse_records() {
        let rows: Vec<Record> = parse_rows(b"Id,Name\n001A,Acme\n001B,\"Globex, Inc\"\n").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["Id"], "001A");
        assert_eq!(rows[1]["Name"], "Globex, Inc");
    }

    #[test]
    fn test_records_keep_column_order() {
        let body = b"Id,Name,Industry,City,Phone,Website\n001A,Acme,Retail,Paris,555-0100,acme.example\n";
        let rows: Vec<Record> = parse_rows(body).unwrap();

        let columns: Vec<_> = rows[0].keys().map(String::as_str).collect();
        assert_eq!(columns, vec!["Id", "Name", "Industry", "City", "Phone", "Website"]);
        assert_eq!(
            serde_json::to_string(&rows[0]).unwrap(),
            r#"{"Id":"001A","Name":"Acme","Industry":"Retail","City":"Paris","Phone":"555-0100","Website":"acme.example"}"#
        );

        let headers: Vec<&str> = rows[0].keys().map(String::as_str).collect();
        let rewritten = write_rows(&headers, rows.iter().map(|r| r.values())).unwrap();
        assert_eq!(rewritten.as_bytes(), body);
    }

    #[test]
    fn test_parse_empty_body() {
        let rows: Vec<Record> = parse_rows(b"").unwrap();
        assert!(rows.is_empty());
        let rows: Vec<Record> = parse_rows(b"\n  \n").unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_parse_header_only() {
        let rows: Vec<Record> = parse_rows(b"Id,Name\n").unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_parse_typed_rows() {
        #[derive(serde::Deserialize)]
        struct Account {
            #[serde(rename = "Id")]
            id: String,
            #[serde(rename = "NumberOfEmployees")]
            employees: u32,
        }

        let rows: Vec<Account> = parse_rows(b"Id,NumberOfEmployees\n001A,42\n").unwrap();
        assert_eq!(rows[0].id, "001A");
        assert_eq!(rows[0].employees, 42);
    }

    #[test]
    fn test_parse_ragged_rows_is_error() {
        let err = parse_rows::<Record>(b"Id,Name\n001A\n").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Csv(_)));
    }

    #[test]
    fn test_write_rows_uses_lf_and_quotes() {
        let payload = write_rows(&["Name", "City"], vec![vec!["Acme", "Paris"], vec!["Globex, Inc", "Oslo"]])
            .unwrap();
        assert_eq!(payload, "Name,City\nAcme,Paris\n\"Globex, Inc\",Oslo\n");
    }

    #[test]
    fn test_ids_payload() {
        let payload = ids_payload(["001A", "001B"]).unwrap();
        assert_eq!(payload, "Id\n001A\n001B\n");
    }
}
