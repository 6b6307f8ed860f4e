//! Test doubles and common utilities for contract tests
//!
//! These doubles keep all state behind `Arc`s so a test can hand a clone to
//! the code under test and still inspect calls afterwards.

#![allow(dead_code)]

use async_trait::async_trait;
use cf2dns_core::error::{Error, Result};
use cf2dns_core::traits::{DnsProvider, DnsRecord, Measurement, MeasurementSource, RecordSpec};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Shorthand for a measurement without metadata
pub fn m(ip: &str, line: &str, delay: u32, bandwidth: u32) -> Measurement {
    Measurement::new(ip, line, delay, bandwidth)
}

/// Canned reply of a [`StaticSource`]
#[derive(Clone)]
pub enum SourceReply {
    Measurements(Vec<Measurement>),
    FetchError(String),
    UpstreamError(String),
}

/// A measurement source serving canned replies per URL
#[derive(Clone, Default)]
pub struct StaticSource {
    replies: Arc<Mutex<HashMap<String, SourceReply>>>,
    fetched: Arc<Mutex<Vec<String>>>,
    delay: Option<Duration>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `measurements` at `url`
    pub fn with(self, url: &str, measurements: Vec<Measurement>) -> Self {
        self.reply(url, SourceReply::Measurements(measurements))
    }

    /// Serve an arbitrary reply at `url`
    pub fn reply(self, url: &str, reply: SourceReply) -> Self {
        self.replies.lock().unwrap().insert(url.to_string(), reply);
        self
    }

    /// Sleep before every reply
    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// URLs fetched so far, in order
    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl MeasurementSource for StaticSource {
    async fn fetch(&self, url: &str) -> Result<Vec<Measurement>> {
        self.fetched.lock().unwrap().push(url.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let reply = self.replies.lock().unwrap().get(url).cloned();
        match reply {
            Some(SourceReply::Measurements(list)) => Ok(list),
            Some(SourceReply::FetchError(msg)) => Err(Error::fetch(msg)),
            Some(SourceReply::UpstreamError(msg)) => Err(Error::upstream(msg)),
            None => Err(Error::fetch(format!("no reply configured for {}", url))),
        }
    }

    fn source_name(&self) -> &'static str {
        "static"
    }
}

/// One call observed by [`InMemoryDnsProvider`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ZoneLookup(String),
    List(String),
    Create { name: String, content: String },
    Update { id: String, name: String, content: String },
}

impl Call {
    /// The record name this call touched, if any
    pub fn record_name(&self) -> Option<&str> {
        match self {
            Call::ZoneLookup(_) => None,
            Call::List(name) | Call::Create { name, .. } | Call::Update { name, .. } => Some(name),
        }
    }
}

#[derive(Default)]
struct ProviderState {
    zones: HashMap<String, String>,
    records: Vec<(String, DnsRecord)>,
    calls: Vec<Call>,
    fail_create: HashSet<String>,
    fail_update: HashSet<String>,
    fail_list: HashSet<String>,
    next_id: usize,
}

/// An in-memory DNS provider with call log and injectable failures
#[derive(Clone, Default)]
pub struct InMemoryDnsProvider {
    state: Arc<Mutex<ProviderState>>,
}

impl InMemoryDnsProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a zone for `domain`
    pub fn with_zone(self, domain: &str, zone_id: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .zones
            .insert(domain.to_string(), zone_id.to_string());
        self
    }

    /// Seed an existing A record
    pub fn with_record(self, zone_id: &str, name: &str, content: &str) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.next_id += 1;
            let id = format!("seed-{}", state.next_id);
            state.records.push((
                zone_id.to_string(),
                DnsRecord {
                    id,
                    name: name.to_string(),
                    record_type: "A".to_string(),
                    content: content.to_string(),
                    proxied: true,
                    ttl: 300,
                },
            ));
        }
        self
    }

    pub fn fail_create(self, name: &str) -> Self {
        self.state.lock().unwrap().fail_create.insert(name.to_string());
        self
    }

    pub fn fail_update(self, name: &str) -> Self {
        self.state.lock().unwrap().fail_update.insert(name.to_string());
        self
    }

    pub fn fail_list(self, name: &str) -> Self {
        self.state.lock().unwrap().fail_list.insert(name.to_string());
        self
    }

    /// All calls, in order
    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Create calls only
    pub fn creates(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Create { .. }))
            .collect()
    }

    /// Update calls only
    pub fn updates(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Update { .. }))
            .collect()
    }

    /// Distinct record names touched by any call
    pub fn touched_names(&self) -> HashSet<String> {
        self.calls()
            .iter()
            .filter_map(|c| c.record_name().map(str::to_string))
            .collect()
    }

    /// Current records named `name`
    pub fn records_named(&self, name: &str) -> Vec<DnsRecord> {
        self.state
            .lock()
            .unwrap()
            .records
            .iter()
            .filter(|(_, r)| r.name == name)
            .map(|(_, r)| r.clone())
            .collect()
    }
}

#[async_trait]
impl DnsProvider for InMemoryDnsProvider {
    async fn zone_id_by_name(&self, domain: &str) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::ZoneLookup(domain.to_string()));
        state
            .zones
            .get(domain)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("Zone not found: {}", domain)))
    }

    async fn list_records(&self, zone_id: &str, name: &str) -> Result<Vec<DnsRecord>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::List(name.to_string()));
        if state.fail_list.contains(name) {
            return Err(Error::http("list failed"));
        }
        Ok(state
            .records
            .iter()
            .filter(|(z, r)| z == zone_id && r.name == name)
            .map(|(_, r)| r.clone())
            .collect())
    }

    async fn create_record(&self, zone_id: &str, spec: &RecordSpec) -> Result<DnsRecord> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Create {
            name: spec.name.clone(),
            content: spec.content.clone(),
        });
        if state.fail_create.contains(&spec.name) {
            return Err(Error::http("create failed"));
        }

        state.next_id += 1;
        let record = DnsRecord {
            id: format!("rec-{}", state.next_id),
            name: spec.name.clone(),
            record_type: spec.record_type().to_string(),
            content: spec.content.clone(),
            proxied: spec.proxied,
            ttl: spec.ttl,
        };
        state.records.push((zone_id.to_string(), record.clone()));
        Ok(record)
    }

    async fn update_record(&self, _zone_id: &str, record_id: &str, spec: &RecordSpec) -> Result<DnsRecord> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Update {
            id: record_id.to_string(),
            name: spec.name.clone(),
            content: spec.content.clone(),
        });
        if state.fail_update.contains(&spec.name) {
            return Err(Error::http("update failed"));
        }

        let (_, record) = state
            .records
            .iter_mut()
            .find(|(_, r)| r.id == record_id)
            .ok_or_else(|| Error::not_found(format!("record {}", record_id)))?;
        record.content = spec.content.clone();
        record.proxied = spec.proxied;
        record.ttl = spec.ttl;
        Ok(record.clone())
    }

    fn provider_name(&self) -> &'static str {
        "memory"
    }
}
