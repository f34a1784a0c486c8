use std::thread;
use std::time::Duration;

use clap::Parser;
use jiff::ToSpan;
use jiff::Zoned;
use jiff::civil::Date;
use tracing::{debug, info};

pub mod client;
pub mod error;
pub mod rates;

pub use client::{PRIVATBANK_URL, PrivatClient, RateSource};
pub use error::{RatesError, Result};
pub use rates::{CurrencySet, DayRates, Rate, RateEntry, RateTable, reshape};

/// Furthest back, in days, a run may start
pub const MAX_DAY_COUNT: u32 = 10;

/// Get PrivatBank's national bank rates for each of the last few days.
///
/// EUR and USD are always shown. Name other currencies (e.g. PLN GBP) to include them as well.
#[derive(Parser)]
#[command(version)]
pub struct Cli {
    /// Number of days back to start from (1 to 10)
    #[arg(value_name = "DAY_COUNT")]
    pub day_count: u32,
    /// Extra currency codes to keep besides EUR and USD
    #[arg(value_name = "CURRENCY")]
    pub currencies: Vec<String>,

    /// Base URL of the exchange rate archive
    #[arg(long, env = "PRIVAT_RATES_API_URL", default_value = PRIVATBANK_URL)]
    pub api_url: String,
    /// Give up on a request after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
    /// Request all days at once instead of one after another
    #[arg(long)]
    pub parallel: bool,
    /// Log every request to stderr
    #[clap(short, long)]
    pub verbose: bool,
}

/// Date `offset` days before `today`, formatted as `DD.MM.YYYY`.
///
/// Offsets past [`MAX_DAY_COUNT`] are rejected.
pub fn date_for_offset(today: Date, offset: u32) -> Result<String> {
    if offset > MAX_DAY_COUNT {
        return Err(RatesError::InvalidDayCount(offset));
    }
    let date = today - i64::from(offset).days();
    Ok(date.strftime("%d.%m.%Y").to_string())
}

/// Current civil date in the system time zone.
pub fn today() -> Date {
    Zoned::now().date()
}

/// [`date_for_offset`] against [`today`].
pub fn days_ago(offset: u32) -> Result<String> {
    date_for_offset(today(), offset)
}

/// Dates to query for a run, starting `day_count` days back and ending yesterday.
pub fn query_dates(today: Date, day_count: u32) -> Result<Vec<String>> {
    if day_count == 0 {
        return Err(RatesError::InvalidDayCount(day_count));
    }
    date_for_offset(today, day_count)?;
    (1..=day_count)
        .rev()
        .map(|offset| date_for_offset(today, offset))
        .collect()
}

/// Fetch one table per date. Aborts on the first failure, discarding what was already fetched.
pub fn fetch_tables<S: RateSource + Sync>(
    source: &S,
    dates: &[String],
    parallel: bool,
) -> Result<Vec<RateTable>> {
    if !parallel {
        return dates.iter().map(|date| source.fetch(date)).collect();
    }

    // Joined in spawn order, so results (and the reported error) follow `dates`
    thread::scope(|s| {
        let handles: Vec<_> = dates
            .iter()
            .map(|date| s.spawn(move || source.fetch(date)))
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
            .collect()
    })
}

/// Validate, fetch every date, then reshape to the requested currencies.
pub fn collect_rates<S: RateSource + Sync>(
    source: &S,
    today: Date,
    day_count: u32,
    currencies: &CurrencySet,
    parallel: bool,
) -> Result<Vec<DayRates>> {
    let dates = query_dates(today, day_count)?;
    debug!(?dates, parallel, "querying");
    let tables = fetch_tables(source, &dates, parallel)?;
    info!(days = tables.len(), "fetched rate tables");
    Ok(reshape(&tables, currencies))
}

pub fn retrieve_rates(args: &Cli) -> Result<Vec<DayRates>> {
    let client = PrivatClient::new(&args.api_url, args.timeout.map(Duration::from_secs));
    collect_rates(
        &client,
        today(),
        args.day_count,
        &CurrencySet::new(&args.currencies),
        args.parallel,
    )
}
