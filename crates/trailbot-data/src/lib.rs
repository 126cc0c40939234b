//! Market data sources.
//!
//! - [`AlpacaCryptoSource`]: live crypto bars, resampled to the trading interval
//! - [`CsvDataSource`]: historical bars from a file, used for replay
//! - [`resample`]: pure minute-to-interval bucketing

mod alpaca;
mod csv_source;
mod resample;

pub use alpaca::AlpacaCryptoSource;
pub use csv_source::CsvDataSource;
pub use resample::resample;
