//! Lazy decoding of the three feeds.
//!
//! Each `*_records` function consumes the header (when the feed has one) up
//! front and returns an iterator that decodes one row per `next()`. Rows are
//! never buffered, so a feed can only be walked once.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};

use super::{FeedError, FeedKind, InventoryRecord, PriceRecord, ProductRecord};

/// Raw marker some exports write in place of a blank line.
pub const EMPTY_LINE_SENTINEL: &str = "__empty_line__";

/// Reader options for one feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedOptions {
    pub delimiter: u8,
    pub has_headers: bool,
    pub quote: u8,
    /// Allow rows with a field count different from the header.
    pub flexible: bool,
}

impl FeedKind {
    pub fn options(self) -> FeedOptions {
        match self {
            FeedKind::Products => FeedOptions {
                delimiter: b';',
                has_headers: true,
                quote: b'"',
                flexible: true,
            },
            FeedKind::Inventory => FeedOptions {
                delimiter: b',',
                has_headers: true,
                quote: b'"',
                flexible: true,
            },
            FeedKind::Prices => FeedOptions {
                delimiter: b',',
                has_headers: false,
                quote: b'"',
                flexible: true,
            },
        }
    }
}

impl FeedOptions {
    pub fn reader<R: Read>(&self, src: R) -> csv::Reader<R> {
        ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(self.has_headers)
            .quote(self.quote)
            .flexible(self.flexible)
            .trim(Trim::None)
            .from_reader(src)
    }
}

/// Open a feed file for reading. Failure here is fatal to that feed's pass.
pub fn open_feed(feed: FeedKind, path: &Path) -> Result<BufReader<File>, FeedError> {
    let file = File::open(path).map_err(|source| FeedError::Open {
        feed,
        path: path.to_path_buf(),
        source,
    })?;
    Ok(BufReader::with_capacity(1 << 20, file))
}

fn line_of(record: &StringRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or(0)
}

fn row_error(feed: FeedKind, line: u64, source: csv::Error) -> FeedError {
    let line = match source.position() {
        Some(pos) if line == 0 => pos.line(),
        _ => line,
    };
    FeedError::Row { feed, line, source }
}

/// True for rows that carry no data: all fields blank, or any field equal to
/// [`EMPTY_LINE_SENTINEL`].
pub fn is_empty_line(record: &StringRecord) -> bool {
    record.iter().all(|f| f.trim().is_empty())
        || record.iter().any(|f| f == EMPTY_LINE_SENTINEL)
}

pub fn product_records<R: Read>(
    src: R,
) -> Result<impl Iterator<Item = Result<ProductRecord, FeedError>>, FeedError> {
    let feed = FeedKind::Products;
    let mut rdr = feed.options().reader(src);
    let headers = rdr
        .headers()
        .map_err(|source| FeedError::Header { feed, source })?
        .clone();

    Ok(rdr.into_records().filter_map(move |row| match row {
        Err(e) => Some(Err(row_error(feed, 0, e))),
        Ok(record) if is_empty_line(&record) => None,
        Ok(record) => Some(
            record
                .deserialize::<ProductRecord>(Some(&headers))
                .map_err(|e| row_error(feed, line_of(&record), e)),
        ),
    }))
}

pub fn inventory_records<R: Read>(
    src: R,
) -> Result<impl Iterator<Item = Result<InventoryRecord, FeedError>>, FeedError> {
    let feed = FeedKind::Inventory;
    let mut rdr = feed.options().reader(src);
    // The header must be read before the first record is requested.
    let headers = rdr
        .headers()
        .map_err(|source| FeedError::Header { feed, source })?
        .clone();

    Ok(rdr.into_records().map(move |row| -> Result<InventoryRecord, FeedError> {
        let record = row.map_err(|e| row_error(feed, 0, e))?;
        record
            .deserialize::<InventoryRecord>(Some(&headers))
            .map_err(|e| row_error(feed, line_of(&record), e))
    }))
}

/// Prices have no header and may contain short or non-UTF-8 rows; such rows
/// decode with the missing fields left empty instead of erroring.
pub fn price_records<R: Read>(src: R) -> impl Iterator<Item = Result<PriceRecord, FeedError>> {
    let feed = FeedKind::Prices;
    let rdr = feed.options().reader(src);

    rdr.into_byte_records().map(move |row| -> Result<PriceRecord, FeedError> {
        let record = row.map_err(|e| row_error(feed, 0, e))?;
        let fields: Vec<String> = record
            .iter()
            .map(|f| String::from_utf8_lossy(f).into_owned())
            .collect();
        Ok(PriceRecord::from_fields(fields.iter().map(String::as_str)))
    })
}
