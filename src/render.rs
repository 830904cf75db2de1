use crate::models::Stage;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::*;

const BAR_WIDTH: usize = 20;

/// Where the poller sends what it learned each cycle.
pub trait RenderSink: Send {
    /// Insert or update the row for `key`. Calling twice with the same key leaves one row.
    fn upsert_row(
        &mut self,
        key: &str,
        display_name: &str,
        stage: Stage,
        percent: Option<u8>,
        detail: &str,
    );
    fn clear_all(&mut self);
    /// Replace every data row with a single message row.
    fn show_single_message(&mut self, text: &str);
    fn set_account(&mut self, account: &str);
    /// Latest micropayment for an in-contract row, ignored for unknown keys.
    fn set_payment(&mut self, key: &str, value: u64);
    fn end_cycle(&mut self) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRow {
    pub key: String,
    pub display_name: String,
    pub stage: Stage,
    pub percent: Option<u8>,
    pub detail: String,
    pub payment: Option<u64>,
}

impl StatusRow {
    pub fn status_text(&self) -> String {
        match (&self.stage, self.payment) {
            (Stage::InContract, Some(value)) => {
                format!("{} ({} tokens paid)", self.stage, value)
            }
            _ => self.stage.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RowView {
    pub name: String,
    pub status: String,
    pub percent: Option<u8>,
    pub detail: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TableView {
    pub account: Option<String>,
    pub message: Option<String>,
    pub rows: Vec<RowView>,
}

/// In-memory status table, rows kept in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct StatusTable {
    account: Option<String>,
    message: Option<String>,
    rows: Vec<StatusRow>,
    index: HashMap<String, usize>,
}

impl StatusTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[StatusRow] {
        &self.rows
    }

    pub fn row(&self, key: &str) -> Option<&StatusRow> {
        self.index.get(key).map(|&i| &self.rows[i])
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn account(&self) -> Option<&str> {
        self.account.as_deref()
    }

    pub fn snapshot(&self) -> TableView {
        TableView {
            account: self.account.clone(),
            message: self.message.clone(),
            rows: self
                .rows
                .iter()
                .map(|row| RowView {
                    name: row.display_name.clone(),
                    status: row.status_text(),
                    percent: row.percent,
                    detail: row.detail.clone(),
                })
                .collect(),
        }
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        if let Some(account) = &self.account {
            out.push_str(&format!("Account: {}\n", account));
        }
        if let Some(message) = &self.message {
            out.push_str(message);
            out.push('\n');
            return out;
        }
        let name_width = self
            .rows
            .iter()
            .map(|r| r.display_name.chars().count())
            .max()
            .unwrap_or(0)
            .max(4);
        for row in &self.rows {
            let status = match row.percent {
                Some(percent) => format!("{} {:>3}% {}", bar(percent), percent, row.status_text()),
                None => row.status_text(),
            };
            let line = format!("{:<width$}  {}", row.display_name, status, width = name_width);
            if row.detail.is_empty() {
                out.push_str(&line);
            } else {
                out.push_str(&format!("{}  {}", line, row.detail));
            }
            out.push('\n');
        }
        out
    }
}

fn bar(percent: u8) -> String {
    let filled = (percent as usize * BAR_WIDTH) / 100;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

impl RenderSink for StatusTable {
    fn upsert_row(
        &mut self,
        key: &str,
        display_name: &str,
        stage: Stage,
        percent: Option<u8>,
        detail: &str,
    ) {
        self.message = None;
        match self.index.get(key) {
            Some(&i) => {
                let row = &mut self.rows[i];
                row.display_name = display_name.to_string();
                row.stage = stage;
                row.percent = percent;
                row.detail = detail.to_string();
            }
            None => {
                self.index.insert(key.to_string(), self.rows.len());
                self.rows.push(StatusRow {
                    key: key.to_string(),
                    display_name: display_name.to_string(),
                    stage,
                    percent,
                    detail: detail.to_string(),
                    payment: None,
                });
            }
        }
    }

    fn clear_all(&mut self) {
        self.rows.clear();
        self.index.clear();
        self.message = None;
    }

    fn show_single_message(&mut self, text: &str) {
        self.clear_all();
        self.message = Some(text.to_string());
    }

    fn set_account(&mut self, account: &str) {
        self.account = Some(account.to_string());
    }

    fn set_payment(&mut self, key: &str, value: u64) {
        if let Some(&i) = self.index.get(key) {
            self.rows[i].payment = Some(value);
        }
    }
}

/// Status table shared between the poller and readers such as the web view.
#[derive(Debug, Clone, Default)]
pub struct SharedTable {
    inner: Arc<RwLock<StatusTable>>,
}

impl SharedTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read<R>(&self, f: impl FnOnce(&StatusTable) -> R) -> R {
        let table = self.inner.read().unwrap_or_else(|e| e.into_inner());
        f(&table)
    }

    fn write<R>(&self, f: impl FnOnce(&mut StatusTable) -> R) -> R {
        let mut table = self.inner.write().unwrap_or_else(|e| e.into_inner());
        f(&mut table)
    }
}

impl RenderSink for SharedTable {
    fn upsert_row(
        &mut self,
        key: &str,
        display_name: &str,
        stage: Stage,
        percent: Option<u8>,
        detail: &str,
    ) {
        self.write(|t| t.upsert_row(key, display_name, stage, percent, detail))
    }

    fn clear_all(&mut self) {
        self.write(|t| t.clear_all())
    }

    fn show_single_message(&mut self, text: &str) {
        self.write(|t| t.show_single_message(text))
    }

    fn set_account(&mut self, account: &str) {
        info!("Account: {}", account);
        self.write(|t| t.set_account(account))
    }

    fn set_payment(&mut self, key: &str, value: u64) {
        self.write(|t| t.set_payment(key, value))
    }

    fn end_cycle(&mut self) {
        let text = self.read(|t| t.render_text());
        info!("Registration status:\n{}", text.trim_end());
    }
}
