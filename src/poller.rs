//! Timer-driven status poller.
//!
//! Every tick fires the account lookup (until an account is known) and a
//! contract list fetch. Requests overlap freely; responses are applied one at
//! a time on the poller's own task, so the account cache, agreement map and
//! pending list are never touched concurrently. Contract responses carry a
//! generation number and anything older than the last applied one is dropped.

use crate::api_client::api_models::{Info, LatestMicropayment};
use crate::api_client::ApiClient;
use crate::error::ApiError;
use crate::models::{classify, ContractRecord, Stage};
use crate::pending::{reconcile, PendingSubmissions};
use crate::render::RenderSink;
use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt as _, StreamExt as _};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::*;

pub const NO_DATA_MESSAGE: &str = "No data available.";

/// Backend the poller reads from. Futures are boxed so they can be kept in flight across ticks.
pub trait StatusSource: Send + Sync {
    fn fetch_info(&self) -> BoxFuture<'static, Result<Info, ApiError>>;
    fn fetch_contracts(&self) -> BoxFuture<'static, Result<Vec<ContractRecord>, ApiError>>;
    fn fetch_micropayment(
        &self,
        agreement_id: &str,
    ) -> BoxFuture<'static, Result<LatestMicropayment, ApiError>>;
}

impl StatusSource for ApiClient {
    fn fetch_info(&self) -> BoxFuture<'static, Result<Info, ApiError>> {
        let api = self.clone();
        Box::pin(async move { api.get_info().await })
    }

    fn fetch_contracts(&self) -> BoxFuture<'static, Result<Vec<ContractRecord>, ApiError>> {
        let api = self.clone();
        Box::pin(async move { api.get_contracts().await })
    }

    fn fetch_micropayment(
        &self,
        agreement_id: &str,
    ) -> BoxFuture<'static, Result<LatestMicropayment, ApiError>> {
        let api = self.clone();
        let agreement_id = agreement_id.to_string();
        Box::pin(async move { api.get_latest_micropayment(&agreement_id).await })
    }
}

enum Response {
    Account(Result<Info, ApiError>),
    Contracts {
        generation: u64,
        result: Result<Vec<ContractRecord>, ApiError>,
    },
    Micropayment {
        agreement_id: String,
        result: Result<LatestMicropayment, ApiError>,
    },
}

pub struct Poller {
    source: Arc<dyn StatusSource>,
    pending: PendingSubmissions,
    sink: Box<dyn RenderSink>,
    last_known_account: Option<String>,
    account_in_flight: bool,
    // agreement id -> contract name
    agreement_names: HashMap<String, String>,
    next_generation: u64,
    applied_generation: u64,
    showing_message: bool,
    in_flight: FuturesUnordered<BoxFuture<'static, Response>>,
}

impl Poller {
    pub fn new(
        source: Arc<dyn StatusSource>,
        pending: PendingSubmissions,
        sink: Box<dyn RenderSink>,
    ) -> Self {
        Self {
            source,
            pending,
            sink,
            last_known_account: None,
            account_in_flight: false,
            agreement_names: HashMap::new(),
            next_generation: 1,
            applied_generation: 0,
            showing_message: false,
            in_flight: FuturesUnordered::new(),
        }
    }

    pub fn account(&self) -> Option<&str> {
        self.last_known_account.as_deref()
    }

    pub fn pending(&self) -> &PendingSubmissions {
        &self.pending
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Fire this cycle's requests. Nothing is applied until responses are processed.
    pub fn tick(&mut self) {
        if self.last_known_account.is_none() && !self.account_in_flight {
            self.account_in_flight = true;
            let fut = self.source.fetch_info();
            self.in_flight.push(fut.map(Response::Account).boxed());
        }

        let generation = self.next_generation;
        self.next_generation += 1;
        let fut = self.source.fetch_contracts();
        self.in_flight.push(
            fut.map(move |result| Response::Contracts { generation, result })
                .boxed(),
        );
    }

    /// Wait for the next response and apply it. Returns false when nothing is in flight.
    pub async fn process_next(&mut self) -> bool {
        match self.in_flight.next().await {
            Some(response) => {
                self.handle(response);
                true
            }
            None => false,
        }
    }

    /// Apply every response that is already complete, without waiting.
    pub fn process_ready(&mut self) -> usize {
        let mut handled = 0;
        while let Some(Some(response)) = self.in_flight.next().now_or_never() {
            self.handle(response);
            handled += 1;
        }
        handled
    }

    /// Apply responses until nothing is left in flight, including follow-up requests.
    pub async fn settle(&mut self) {
        while self.process_next().await {}
    }

    /// Poll forever. The first tick fires immediately.
    pub async fn run(mut self, period: Duration) {
        info!("Polling registration status every {}s", period.as_secs());
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick();
                }
                Some(response) = self.in_flight.next(), if !self.in_flight.is_empty() => {
                    self.handle(response);
                }
            }
        }
    }

    fn handle(&mut self, response: Response) {
        match response {
            Response::Account(result) => self.handle_account(result),
            Response::Contracts { generation, result } => {
                if generation < self.applied_generation {
                    debug!(
                        "Discarding contract response #{}, #{} already applied",
                        generation, self.applied_generation
                    );
                    return;
                }
                self.applied_generation = generation;
                match result {
                    Ok(records) => self.show_contracts(records),
                    Err(e) => {
                        warn!("Error getting contract info: {}", e);
                        self.show_message(&format!("Error getting contract info: {}", e));
                    }
                }
                self.sink.end_cycle();
            }
            Response::Micropayment {
                agreement_id,
                result,
            } => self.handle_micropayment(&agreement_id, result),
        }
    }

    fn handle_account(&mut self, result: Result<Info, ApiError>) {
        self.account_in_flight = false;
        match result {
            Ok(info) => match info.account() {
                Some(account) if self.last_known_account.is_none() => {
                    self.sink.set_account(&account);
                    self.last_known_account = Some(account);
                }
                Some(_) => {}
                None => debug!("No account reported yet"),
            },
            Err(e) => warn!("Error getting account: {}", e),
        }
    }

    fn handle_micropayment(
        &mut self,
        agreement_id: &str,
        result: Result<LatestMicropayment, ApiError>,
    ) {
        let payment = match result {
            Ok(payment) => payment,
            Err(e) => {
                warn!("Error getting micropayment info for {}: {}", agreement_id, e);
                return;
            }
        };
        if payment.payment_value == 0 {
            return;
        }
        match self.agreement_names.get(agreement_id) {
            Some(name) => self.sink.set_payment(name, payment.payment_value),
            None => debug!("Micropayment for unknown agreement {}", agreement_id),
        }
    }

    fn show_message(&mut self, text: &str) {
        self.sink.show_single_message(text);
        self.showing_message = true;
    }

    fn show_contracts(&mut self, records: Vec<ContractRecord>) {
        if self.showing_message {
            self.sink.clear_all();
            self.showing_message = false;
        }

        let server_names: HashSet<String> = records.iter().map(|r| r.name.clone()).collect();
        let still_pending = match self.pending.reconcile_with(&server_names) {
            Ok(remaining) => remaining,
            Err(e) => {
                warn!("Unable to update pending submissions: {}", e);
                reconcile(&server_names, &self.pending.load())
            }
        };

        // only agreements in the latest list can still be paid
        self.agreement_names.clear();
        for record in &records {
            let stage = classify(record);
            let percent = stage.progress_percent();
            self.sink
                .upsert_row(&record.name, &record.name, stage, percent, &record.detail());

            if record.has_agreement() {
                self.agreement_names
                    .insert(record.agreement_id.clone(), record.name.clone());
                let agreement_id = record.agreement_id.clone();
                let fut = self.source.fetch_micropayment(&agreement_id);
                self.in_flight.push(
                    fut.map(move |result| Response::Micropayment {
                        agreement_id,
                        result,
                    })
                    .boxed(),
                );
            }
        }

        for name in &still_pending {
            let record = ContractRecord::pending(name);
            let stage = Stage::WaitingToAdvertise;
            let percent = stage.progress_percent();
            self.sink
                .upsert_row(&record.name, &record.name, stage, percent, &record.detail());
        }

        if records.is_empty() && still_pending.is_empty() {
            self.show_message(NO_DATA_MESSAGE);
        }
        debug!(
            "Applied {} contract(s), {} pending",
            records.len(),
            still_pending.len()
        );
    }
}
