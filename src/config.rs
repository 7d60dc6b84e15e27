//! fixed dashboard settings.
//!
//! nothing here is read from the environment or from disk; every tunable is a constant.

use std::time::Duration;

/// the period of one tick of the render loop.
pub const TICK_PERIOD: Duration = Duration::from_millis(100);

/// how long a weather report is served before a new one is fetched.
pub const WEATHER_TTL: Duration = Duration::from_secs(15 * 60);

/// how long crypto prices are served before new ones are fetched.
pub const CRYPTO_TTL: Duration = Duration::from_secs(60);

/// how long the source-control branch is served before it is resolved again.
pub const BRANCH_TTL: Duration = Duration::from_secs(5);

/// how long the process hotlist is served before the process table is read again.
pub const PROCESS_TTL: Duration = Duration::from_secs(2);

/// the number of processes shown in the hotlist.
pub const PROCESS_COUNT: usize = 3;

/// connect ceiling for every http request.
pub const HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// overall ceiling for every http request, body included.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

pub const USER_AGENT: &str = "TermDash/1.0";

/// how long the branch resolver waits for its child process.
pub const BRANCH_WAIT: Duration = Duration::from_secs(2);

pub const WEATHER_LOCATION: &str = "Jalandhar";
pub const WEATHER_LATITUDE: f64 = 31.326;
pub const WEATHER_LONGITUDE: f64 = 75.576;
pub const WEATHER_ENDPOINT: &str = "https://api.open-meteo.com/v1/forecast";

/// shown in place of the weather until the first report arrives.
pub const WEATHER_PLACEHOLDER: &str = "Scanning atmosphere...";

pub const CRYPTO_ENDPOINT: &str = "https://api.coingecko.com/api/v3/simple/price";

/// the tracked assets, as `(identifier, ticker symbol)` pairs, in display order.
pub const CRYPTO_ASSETS: [(&str, &str); 5] = [
    ("bitcoin", "BTC"),
    ("ethereum", "ETH"),
    ("solana", "SOL"),
    ("dogecoin", "DOGE"),
    ("monero", "XMR"),
];

/// shown in place of the branch until it is first resolved.
pub const BRANCH_PLACEHOLDER: &str = "resolving...";

/// shown in place of the branch when it cannot be resolved.
pub const BRANCH_SENTINEL: &str = "DETACHED / NO GIT";

/// error text longer than this many characters is cut short.
pub const ERROR_TEXT_LIMIT: usize = 20;

/// appended to error text that was cut short.
pub const ELLIPSIS: &str = "..";

pub const OWNER: &str = "Xyrix";

/// the name of the log file, created in the system's temporary directory.
pub const LOG_FILE: &str = "termdash.log";
