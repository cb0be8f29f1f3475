//! # AlAdhan Timings Fetching and Caching
//!
//! This module handles all network operations for obtaining prayer times
//! from the AlAdhan API. It includes persistent caching to minimize
//! network requests and tolerant parsing for partially usable responses.
//!
//! ## Data Source
//!
//! ### AlAdhan Timings API
//! - **URL**: `https://api.aladhan.com/v1/timings/{DD-MM-YYYY}`
//! - **Parameters**: coordinates, calculation method id, `iso8601=true`,
//!   optional `timezonestring` and `methodSettings` overrides
//! - **Format**: JSON envelope with a `timings` map of RFC 3339 instants
//!
//! ### Data Processing Pipeline
//! 1. **Cache check**: look the (config, date) pair up in the cache file
//! 2. **Fetch**: HTTP GET through the owned async runtime
//! 3. **Parse**: each timing field independently; a bad field is dropped
//!    with a warning, never failing the whole day
//! 4. **Cache**: insert the day under the config fingerprint
//!
//! ## Caching Strategy
//!
//! Computed times for a (config, date) pair never change, so the cache has
//! no TTL. Instead the whole file is keyed by a fingerprint of the
//! calculation configuration: any change of coordinates, method, or angles
//! makes every cached day unreachable and the file is rebuilt as fresh
//! days arrive. The cache lives in `/tmp` so it clears on reboot and never
//! grows unbounded.
//!
//! ## Error Handling
//!
//! Network and envelope failures surface as [`SourceError`] for the buffer
//! to propagate; cache write failures are logged and swallowed, since a
//! fetched day is usable whether or not it could be persisted.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, FixedOffset, NaiveDate};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::runtime::Runtime;
use tracing::{debug, warn};

use crate::config::{CalculationConfig, CalculationMethod};
use crate::source::{EventTimeSource, RawDayTimes, SourceError};

/// Cache file location. `/tmp` clears on reboot.
const CACHE: &str = "/tmp/salat_cache.json";

const BASE_URL: &str = "https://api.aladhan.com/v1";

/// HTTP-backed [`EventTimeSource`] against the AlAdhan timings API.
///
/// The client is async but the trait is not, so the source owns a small
/// runtime and bridges with `block_on`. Construct it once and share; every
/// `compute_day` call reuses the same client and cache file.
pub struct AlAdhanSource {
    client: Client,
    runtime: Runtime,
    cache_path: PathBuf,
}

impl AlAdhanSource {
    pub fn new() -> Result<Self, SourceError> {
        Self::with_cache_path(PathBuf::from(CACHE))
    }

    /// Same source with the cache somewhere else (tests, multi-profile
    /// setups).
    pub fn with_cache_path(cache_path: PathBuf) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        let runtime = Runtime::new().map_err(SourceError::Runtime)?;
        Ok(AlAdhanSource {
            client,
            runtime,
            cache_path,
        })
    }

    fn fetch_day(
        &self,
        config: &CalculationConfig,
        date: NaiveDate,
    ) -> Result<RawDayTimes, SourceError> {
        let url = format!("{BASE_URL}/timings/{}", date.format("%d-%m-%Y"));
        let params = query_params(config);
        debug!(%date, "fetching timings");

        let response = self.runtime.block_on(async {
            self.client
                .get(&url)
                .query(&params)
                .send()
                .await?
                .error_for_status()?
                .json::<ApiResponse>()
                .await
        })?;

        if response.code != 200 {
            return Err(SourceError::Api(format!(
                "code {}: {}",
                response.code, response.status
            )));
        }
        let timings = response
            .data
            .ok_or_else(|| SourceError::Api("missing data envelope".into()))?
            .timings;
        Ok(parse_timings(&timings, date))
    }
}

impl EventTimeSource for AlAdhanSource {
    fn compute_day(
        &self,
        config: &CalculationConfig,
        date: NaiveDate,
    ) -> Result<RawDayTimes, SourceError> {
        let fingerprint = config.fingerprint();

        // Cache first: computed times for this (config, date) never change
        if let Some(hit) = load_cached(&self.cache_path, &fingerprint, date) {
            debug!(%date, "cache hit");
            return Ok(hit);
        }

        let times = self.fetch_day(config, date)?;

        // A fetched day is usable whether or not it persists
        if let Err(err) = store_cached(&self.cache_path, &fingerprint, date, times) {
            debug!(%err, "cache write failed");
        }
        Ok(times)
    }
}

// -- Wire format --

#[derive(Debug, Deserialize)]
struct ApiResponse {
    code: u16,
    #[serde(default)]
    status: String,
    data: Option<ApiData>,
}

#[derive(Debug, Deserialize)]
struct ApiData {
    timings: ApiTimings,
}

/// The timings map uses capitalized keys; only the six solar events are
/// read. The API's own midnight/third fields are ignored because the
/// engine derives night markers from Maghrib and the next day's Fajr.
#[derive(Debug, Deserialize)]
struct ApiTimings {
    #[serde(rename = "Fajr")]
    fajr: Option<String>,
    #[serde(rename = "Sunrise")]
    sunrise: Option<String>,
    #[serde(rename = "Dhuhr")]
    dhuhr: Option<String>,
    #[serde(rename = "Asr")]
    asr: Option<String>,
    #[serde(rename = "Maghrib")]
    maghrib: Option<String>,
    #[serde(rename = "Isha")]
    isha: Option<String>,
}

fn parse_timings(timings: &ApiTimings, date: NaiveDate) -> RawDayTimes {
    RawDayTimes {
        fajr: parse_instant(timings.fajr.as_deref(), "Fajr", date),
        sunrise: parse_instant(timings.sunrise.as_deref(), "Sunrise", date),
        dhuhr: parse_instant(timings.dhuhr.as_deref(), "Dhuhr", date),
        asr: parse_instant(timings.asr.as_deref(), "Asr", date),
        maghrib: parse_instant(timings.maghrib.as_deref(), "Maghrib", date),
        isha: parse_instant(timings.isha.as_deref(), "Isha", date),
    }
}

/// One timing field. With `iso8601=true` the API answers RFC 3339 strings
/// carrying the location's offset; anything else is treated as absent so a
/// single bad field cannot take the whole day down.
fn parse_instant(raw: Option<&str>, field: &str, date: NaiveDate) -> Option<DateTime<FixedOffset>> {
    let text = raw?.trim();
    match DateTime::parse_from_rfc3339(text) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(%date, field, value = text, %err, "unparseable timing treated as absent");
            None
        }
    }
}

fn query_params(config: &CalculationConfig) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("latitude", config.latitude.to_string()),
        ("longitude", config.longitude.to_string()),
        ("method", config.method.api_id().to_string()),
        ("iso8601", "true".to_string()),
    ];
    if !config.time_zone.is_empty() {
        params.push(("timezonestring", config.time_zone.clone()));
    }
    if config.method == CalculationMethod::Custom
        || config.fajr_angle.is_some()
        || config.isha_angle.is_some()
        || config.isha_interval.is_some()
    {
        params.push(("methodSettings", method_settings(config)));
    }
    params
}

/// AlAdhan's `methodSettings` triple: Fajr angle, Maghrib, Isha. Maghrib
/// is always sunset here, and an interval-based Isha is spelled
/// `"{minutes} min"`.
fn method_settings(config: &CalculationConfig) -> String {
    let fajr = config
        .fajr_angle
        .map(|angle| angle.to_string())
        .unwrap_or_else(|| "null".to_string());
    let isha = match (config.isha_angle, config.isha_interval) {
        (Some(angle), _) => angle.to_string(),
        (None, Some(minutes)) => format!("{minutes} min"),
        (None, None) => "null".to_string(),
    };
    format!("{fajr},null,{isha}")
}

// -- Cache file --

#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheFile {
    fingerprint: String,
    days: BTreeMap<NaiveDate, RawDayTimes>,
}

/// Load one cached day, if the file exists, parses, and was written under
/// the same config fingerprint. Any failure is a miss, never an error.
fn load_cached(path: &Path, fingerprint: &str, date: NaiveDate) -> Option<RawDayTimes> {
    let data = fs::read(path).ok()?;
    let cache: CacheFile = match serde_json::from_slice(&data) {
        Ok(cache) => cache,
        Err(err) => {
            debug!(%err, "unreadable cache file ignored");
            return None;
        }
    };
    if cache.fingerprint != fingerprint {
        return None;
    }
    cache.days.get(&date).copied()
}

/// Insert one day under `fingerprint`, dropping every previously cached
/// day when the fingerprint changed.
fn store_cached(
    path: &Path,
    fingerprint: &str,
    date: NaiveDate,
    times: RawDayTimes,
) -> Result<(), SourceError> {
    let mut cache = fs::read(path)
        .ok()
        .and_then(|data| serde_json::from_slice::<CacheFile>(&data).ok())
        .filter(|cache| cache.fingerprint == fingerprint)
        .unwrap_or_else(|| CacheFile {
            fingerprint: fingerprint.to_string(),
            days: BTreeMap::new(),
        });
    cache.days.insert(date, times);
    fs::write(path, serde_json::to_vec(&cache)?)?;
    Ok(())
}
