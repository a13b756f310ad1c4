//! Google Sheets source client
//!
//! Speaks the Sheets v4 REST surface: spreadsheet metadata for tab
//! discovery and the values endpoint for rectangular row fetches. Every
//! call obtains a fresh bearer token from the credential exchange and
//! holds no session state between calls.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sheets::token::{TokenError, TokenExchanger};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Source unavailable: {0}")]
    Unavailable(String),

    #[error("No sheet tabs found in source")]
    NoTabs,

    #[error("Sheet needs a header row and at least one data row")]
    InsufficientData,

    #[error("Credential exchange failed: {0}")]
    Credential(#[from] TokenError),
}

impl SourceError {
    /// Transient failures are worth retrying; structural ones are not.
    pub fn is_transient(&self) -> bool {
        matches!(self, SourceError::Request(_) | SourceError::Unavailable(_))
    }
}

/// One logical table within a source, as surfaced to discovery callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetTab {
    pub name: String,
    #[serde(rename = "ref")]
    pub tab_ref: String,
}

/// A fetched rectangle: ordered headers plus header-keyed data rows.
///
/// Headers keep document order so transform output is deterministic;
/// ragged rows simply miss keys and read back as empty cells.
#[derive(Debug, Clone, Default)]
pub struct RowSet {
    pub headers: Vec<String>,
    pub rows: Vec<HashMap<String, String>>,
}

/// Boundary trait for the external tabular source.
///
/// The orchestrator depends on this rather than on the concrete client
/// so tests can substitute a scripted source.
#[async_trait]
pub trait SheetSource: Send + Sync {
    /// Enumerate logical tables within a source.
    async fn list_tabs(&self, source_id: &str) -> Result<Vec<SheetTab>, SourceError>;

    /// Fetch a rectangular range; first row is treated as headers.
    async fn fetch_rows(
        &self,
        source_id: &str,
        tab_name: Option<&str>,
        range: &str,
    ) -> Result<RowSet, SourceError>;
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
    #[serde(rename = "sheetId")]
    sheet_id: i64,
}

#[derive(Debug, Deserialize)]
struct ValuesResponse {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

/// Sheets v4 client backed by the service-account credential exchange.
pub struct SheetsClient {
    http: reqwest::Client,
    api_base: String,
    token: TokenExchanger,
}

impl SheetsClient {
    pub fn new(api_base: String, token: TokenExchanger) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            token,
        }
    }
}

#[async_trait]
impl SheetSource for SheetsClient {
    async fn list_tabs(&self, source_id: &str) -> Result<Vec<SheetTab>, SourceError> {
        let bearer = self.token.fetch_token().await?;
        let url = format!(
            "{}/v4/spreadsheets/{}?fields=sheets.properties",
            self.api_base, source_id
        );

        let response = self.http.get(&url).bearer_auth(&bearer).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Unavailable(format!(
                "Sheets metadata request returned {}: {}",
                status, body
            )));
        }

        let meta: SpreadsheetMeta = response.json().await?;
        let tabs: Vec<SheetTab> = meta
            .sheets
            .into_iter()
            .map(|entry| SheetTab {
                name: entry.properties.title,
                tab_ref: entry.properties.sheet_id.to_string(),
            })
            .collect();

        if tabs.is_empty() {
            return Err(SourceError::NoTabs);
        }
        Ok(tabs)
    }

    async fn fetch_rows(
        &self,
        source_id: &str,
        tab_name: Option<&str>,
        range: &str,
    ) -> Result<RowSet, SourceError> {
        let bearer = self.token.fetch_token().await?;
        let range_ref = a1_range(tab_name, range);
        let url = format!(
            "{}/v4/spreadsheets/{}/values/{}",
            self.api_base, source_id, range_ref
        );

        let response = self.http.get(&url).bearer_auth(&bearer).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Unavailable(format!(
                "Sheets values request returned {}: {}",
                status, body
            )));
        }

        let values: ValuesResponse = response.json().await?;
        rows_from_values(values.values)
    }
}

/// Build the A1 range reference for a values request.
///
/// Tab titles containing spaces or punctuation are only valid in A1
/// notation when single-quoted, with embedded quotes doubled. Quoting is
/// accepted for plain titles too, so every named tab gets it.
fn a1_range(tab_name: Option<&str>, range: &str) -> String {
    match tab_name {
        Some(tab) => format!("'{}'!{}", tab.replace('\'', "''"), range),
        None => range.to_string(),
    }
}

/// Shape raw cell values into a header-keyed row set.
///
/// Requires a header row plus at least one data row. Blank headers are
/// dropped so unnamed spreadsheet columns never become metrics.
fn rows_from_values(values: Vec<Vec<serde_json::Value>>) -> Result<RowSet, SourceError> {
    if values.len() < 2 {
        return Err(SourceError::InsufficientData);
    }

    let mut iter = values.into_iter();
    let header_row = iter.next().unwrap_or_default();

    let mut headers = Vec::new();
    let mut header_slots = Vec::new();
    for (index, cell) in header_row.iter().enumerate() {
        let name = cell_text(cell);
        if !name.trim().is_empty() {
            headers.push(name.clone());
            header_slots.push((index, name));
        }
    }

    let rows = iter
        .map(|raw| {
            header_slots
                .iter()
                .map(|(index, name)| {
                    let text = raw.get(*index).map(cell_text).unwrap_or_default();
                    (name.clone(), text)
                })
                .collect::<HashMap<String, String>>()
        })
        .collect();

    Ok(RowSet { headers, rows })
}

fn cell_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}
