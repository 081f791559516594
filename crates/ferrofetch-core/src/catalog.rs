//! Ticker catalog decoding.
//!
//! The catalog ships as a zip archive holding a single CSV table. Rows keep
//! the table's column order and row order end to end, including when they are
//! re-encoded as JSON.

use std::collections::BTreeSet;
use std::io::{Cursor, Read};

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::SourceError;

/// Archive member holding the catalog table.
pub const CATALOG_MEMBER: &str = "supported_tickers.csv";
/// Column used by [`CatalogFilter`].
pub const ASSET_TYPE_FIELD: &str = "assetType";

/// One catalog row as ordered field/value pairs.
///
/// A `None` value marks a cell missing from a short row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogRow {
    fields: Vec<(String, Option<String>)>,
}

impl CatalogRow {
    pub fn new(fields: Vec<(String, Option<String>)>) -> Self {
        Self { fields }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .and_then(|(_, value)| value.as_deref())
    }

    pub fn asset_type(&self) -> Option<&str> {
        self.get(ASSET_TYPE_FIELD)
    }

    pub fn fields(&self) -> &[(String, Option<String>)] {
        &self.fields
    }

    /// Single-line JSON object with keys in column order.
    pub fn to_json(&self) -> Result<String, SourceError> {
        serde_json::to_string(self)
            .map_err(|e| SourceError::invalid_response(format!("failed to encode row: {e}")))
    }
}

impl Serialize for CatalogRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Asset-type filter for catalog listings. The empty filter keeps every row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogFilter {
    asset_types: BTreeSet<String>,
}

impl CatalogFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn asset_types<I, S>(asset_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            asset_types: asset_types.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.asset_types.is_empty()
    }

    pub fn matches(&self, row: &CatalogRow) -> bool {
        self.is_empty()
            || row
                .asset_type()
                .is_some_and(|asset_type| self.asset_types.contains(asset_type))
    }
}

/// Extracts `member` from a zip archive and decodes it as a CSV table.
pub fn decode_catalog(archive: &[u8], member: &str) -> Result<Vec<CatalogRow>, SourceError> {
    let table = extract_member(archive, member)?;
    parse_table(&table)
}

/// Reads one member of a zip archive into memory.
pub fn extract_member(archive: &[u8], member: &str) -> Result<Vec<u8>, SourceError> {
    let mut zip = zip::ZipArchive::new(Cursor::new(archive))
        .map_err(|e| SourceError::invalid_response(format!("catalog is not a zip archive: {e}")))?;
    let mut file = zip.by_name(member).map_err(|e| {
        SourceError::invalid_response(format!("catalog archive has no '{member}': {e}"))
    })?;

    let mut buffer = Vec::new();
    file.read_to_end(&mut buffer).map_err(|e| {
        SourceError::invalid_response(format!("failed to read '{member}' from catalog: {e}"))
    })?;
    Ok(buffer)
}

/// Parses CSV bytes using the header row as field names.
///
/// Short rows yield `None` for the missing trailing cells; cells beyond the
/// header width are dropped.
pub fn parse_table(table: &[u8]) -> Result<Vec<CatalogRow>, SourceError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(table);

    let headers = reader
        .headers()
        .map_err(|e| SourceError::invalid_response(format!("failed to read catalog header: {e}")))?
        .clone();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| {
            SourceError::invalid_response(format!("failed to read catalog row: {e}"))
        })?;

        let fields = headers
            .iter()
            .enumerate()
            .map(|(index, name)| (name.to_owned(), record.get(index).map(str::to_owned)))
            .collect();
        rows.push(CatalogRow::new(fields));
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "ticker,exchange,assetType,priceCurrency,startDate,endDate\n\
        aapl,NASDAQ,Stock,USD,1980-12-12,2024-05-01\n\
        spy,NYSE ARCA,ETF,USD,1993-01-29,2024-05-01\n\
        vfiax,NMFQS,Mutual Fund,USD,2000-11-13\n";

    #[test]
    fn rows_keep_column_order_in_json() {
        let rows = parse_table(TABLE.as_bytes()).expect("table parses");
        assert_eq!(rows.len(), 3);
        assert_eq!(
            rows[0].to_json().expect("row encodes"),
            r#"{"ticker":"aapl","exchange":"NASDAQ","assetType":"Stock","priceCurrency":"USD","startDate":"1980-12-12","endDate":"2024-05-01"}"#
        );
    }

    #[test]
    fn short_rows_encode_missing_cells_as_null() {
        let rows = parse_table(TABLE.as_bytes()).expect("table parses");
        assert_eq!(rows[2].get("endDate"), None);
        assert!(rows[2]
            .to_json()
            .expect("row encodes")
            .ends_with(r#""startDate":"2000-11-13","endDate":null}"#));
    }

    #[test]
    fn cells_beyond_the_header_are_dropped() {
        let rows = parse_table(b"ticker,assetType\nbrk-a,Stock,extra,cells\n").expect("parses");

        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0].to_json().expect("row encodes"),
            r#"{"ticker":"brk-a","assetType":"Stock"}"#
        );
    }

    #[test]
    fn filter_matches_listed_asset_types_only() {
        let rows = parse_table(TABLE.as_bytes()).expect("table parses");
        let filter = CatalogFilter::asset_types(["ETF", "Mutual Fund"]);

        let kept: Vec<_> = rows
            .iter()
            .filter(|row| filter.matches(row))
            .filter_map(|row| row.get("ticker"))
            .collect();
        assert_eq!(kept, vec!["spy", "vfiax"]);
        assert!(rows.iter().all(|row| CatalogFilter::all().matches(row)));
    }

    #[test]
    fn garbage_archive_is_an_invalid_response() {
        let error = decode_catalog(b"not a zip", CATALOG_MEMBER).expect_err("must fail");
        assert_eq!(error.kind(), crate::SourceErrorKind::InvalidResponse);
    }
}
