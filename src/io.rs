// Module for loading housing records. It reads the csv file, checks each row against the
// 13-column layout and turns it into a typed `Record`.
//
// Fields are split on plain commas. Quoted fields are passed through by the csv reader,
// but the source files never quote, so a literal comma inside a value shifts every
// following column and surfaces as a field-count or field-value error.
use std::fs::File;
use std::io::Read;

use csv::{ReaderBuilder, StringRecord, Trim};
use log::{debug, info};
use serde::Deserialize;

use crate::error::{Error, ParseError, Result};

/// Column order of the input file.
pub const COLUMNS: [&str; 13] = [
    "price",
    "area",
    "bedrooms",
    "bathrooms",
    "stories",
    "mainroad",
    "guestroom",
    "basement",
    "hotwaterheating",
    "airconditioning",
    "parking",
    "prefarea",
    "furnishingstatus",
];

mod yes_no {
    use serde::{Deserialize, Deserializer};

    /// Only a case-insensitive "yes" is true; "no" and anything else is false.
    pub fn deserialize<'de, D>(d: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(d)?;
        Ok(s.trim().eq_ignore_ascii_case("yes"))
    }
}

mod furnishing {
    use super::FurnishingStatus;
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(d: D) -> Result<FurnishingStatus, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(d)?;
        Ok(FurnishingStatus::from_label(&s))
    }
}

/// Furnishing state of a house, in ordinal-code order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FurnishingStatus {
    Furnished,
    SemiFurnished,
    Unfurnished,
}

impl FurnishingStatus {
    /// Labels other than "furnished" and "semi-furnished" count as unfurnished.
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        if label.eq_ignore_ascii_case("furnished") {
            FurnishingStatus::Furnished
        } else if label.eq_ignore_ascii_case("semi-furnished") {
            FurnishingStatus::SemiFurnished
        } else {
            if !label.eq_ignore_ascii_case("unfurnished") {
                debug!("unknown furnishing status {:?}, treating as unfurnished", label);
            }
            FurnishingStatus::Unfurnished
        }
    }

    pub fn code(self) -> f64 {
        match self {
            FurnishingStatus::Furnished => 0.0,
            FurnishingStatus::SemiFurnished => 1.0,
            FurnishingStatus::Unfurnished => 2.0,
        }
    }
}

/// One housing observation, matching the 13 CSV columns by position.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Record {
    pub price: f64,
    pub area: f64,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub stories: i32,
    #[serde(deserialize_with = "yes_no::deserialize")]
    pub mainroad: bool,
    #[serde(deserialize_with = "yes_no::deserialize")]
    pub guestroom: bool,
    #[serde(deserialize_with = "yes_no::deserialize")]
    pub basement: bool,
    #[serde(deserialize_with = "yes_no::deserialize")]
    pub hot_water_heating: bool,
    #[serde(deserialize_with = "yes_no::deserialize")]
    pub air_conditioning: bool,
    pub parking: i32,
    #[serde(deserialize_with = "yes_no::deserialize")]
    pub preferred_area: bool,
    #[serde(deserialize_with = "furnishing::deserialize")]
    pub furnishing_status: FurnishingStatus,
}

/// Parses one already-split row. `line` is only used for error messages.
pub fn parse_row(raw: &StringRecord, line: u64) -> std::result::Result<Record, ParseError> {
    let mut fields = raw.clone();
    fields.trim();

    if fields.len() != COLUMNS.len() {
        return Err(ParseError::FieldCount {
            line,
            expected: COLUMNS.len(),
            found: fields.len(),
        });
    }
    if fields
        .get(0)
        .is_some_and(|f| f.eq_ignore_ascii_case(COLUMNS[0]))
    {
        return Err(ParseError::HeaderRow { line });
    }

    fields
        .deserialize::<Record>(None)
        .map_err(|e| field_error(&e, line))
}

/// Parses one raw text line such as `"7420000,7420,4,2,3,yes,no,no,no,yes,2,yes,furnished"`.
pub fn parse_line(text: &str, line: u64) -> std::result::Result<Record, ParseError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    match rdr.records().next() {
        Some(Ok(raw)) => parse_row(&raw, line),
        Some(Err(e)) => Err(field_error(&e, line)),
        None => Err(ParseError::FieldCount {
            line,
            expected: COLUMNS.len(),
            found: 0,
        }),
    }
}

fn field_error(e: &csv::Error, line: u64) -> ParseError {
    match e.kind() {
        csv::ErrorKind::Deserialize { err, .. } => {
            let column = err
                .field()
                .and_then(|i| COLUMNS.get(i as usize).copied())
                .unwrap_or("record");
            ParseError::InvalidField {
                line,
                column,
                reason: err.kind().to_string(),
            }
        }
        csv::ErrorKind::Utf8 { pos, err } => ParseError::InvalidField {
            line: pos.as_ref().map(|p| p.line()).unwrap_or(line),
            column: COLUMNS.get(err.field()).copied().unwrap_or("record"),
            reason: err.to_string(),
        },
        _ => ParseError::InvalidField {
            line,
            column: "record",
            reason: e.to_string(),
        },
    }
}

/// Reads every data row after the single header line. The first bad row aborts the read.
pub fn read_records<R: Read>(reader: R) -> Result<Vec<Record>> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(b',')
        .flexible(true)
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(reader);

    let mut out = Vec::new();
    for result in rdr.records() {
        let raw: StringRecord = result.map_err(|e| {
            if matches!(e.kind(), csv::ErrorKind::Utf8 { .. }) {
                Error::Load(field_error(&e, 0))
            } else {
                Error::Csv(e)
            }
        })?;
        let line = raw.position().map(|p| p.line()).unwrap_or(0);
        out.push(parse_row(&raw, line)?);
    }
    Ok(out)
}

pub fn load_csv(path: &str) -> Result<Vec<Record>> {
    let file = File::open(path).map_err(|source| Error::Io {
        path: path.to_string(),
        source,
    })?;
    let records = read_records(file)?;
    info!("Successfully loaded {} housing records from {}", records.len(), path);
    Ok(records)
}
