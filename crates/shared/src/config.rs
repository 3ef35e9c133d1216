//! Application configuration management.

use rust_decimal::Decimal;
use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Card encryption and integrity secrets.
    pub security: SecurityConfig,
    /// Card number generation parameters.
    #[serde(default)]
    pub cards: CardConfig,
    /// Interest rate provider configuration.
    #[serde(default)]
    pub rates: RatesConfig,
    /// Settlement scheduler configuration.
    #[serde(default)]
    pub settlement: SettlementConfig,
    /// Outbound email configuration.
    #[serde(default)]
    pub email: EmailConfig,
    /// Log output configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Secrets protecting card material at rest.
#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    /// Hex-encoded AES key (16, 24 or 32 bytes once decoded).
    pub encryption_key: String,
    /// Secret for keyed integrity tags. Must differ from the encryption key.
    pub integrity_secret: String,
}

/// Card number generation parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct CardConfig {
    /// Issuer prefix placed at the start of every card number.
    #[serde(default = "default_bin_prefix")]
    pub bin_prefix: String,
    /// Total number of digits, check digit included.
    #[serde(default = "default_number_length")]
    pub number_length: usize,
    /// Years added to the issuance year for the expiry date.
    #[serde(default = "default_validity_years")]
    pub validity_years: i32,
}

fn default_bin_prefix() -> String {
    "400000".to_string()
}

fn default_number_length() -> usize {
    16
}

fn default_validity_years() -> i32 {
    4
}

/// Card number lengths allowed by ISO/IEC 7812.
const CARD_NUMBER_LENGTHS: std::ops::RangeInclusive<usize> = 12..=19;

impl CardConfig {
    fn validate(&self) -> Result<(), config::ConfigError> {
        if self.bin_prefix.is_empty() || !self.bin_prefix.bytes().all(|b| b.is_ascii_digit()) {
            return Err(config::ConfigError::Message(
                "cards.bin_prefix must be a non-empty string of digits".to_string(),
            ));
        }
        if !CARD_NUMBER_LENGTHS.contains(&self.number_length) {
            return Err(config::ConfigError::Message(format!(
                "cards.number_length must be between 12 and 19, got {}",
                self.number_length
            )));
        }
        // the check digit needs the last position
        if self.bin_prefix.len() >= self.number_length {
            return Err(config::ConfigError::Message(
                "cards.bin_prefix is too long for cards.number_length".to_string(),
            ));
        }
        if !(1..=10).contains(&self.validity_years) {
            return Err(config::ConfigError::Message(format!(
                "cards.validity_years must be between 1 and 10, got {}",
                self.validity_years
            )));
        }
        Ok(())
    }
}

impl Default for CardConfig {
    fn default() -> Self {
        Self {
            bin_prefix: default_bin_prefix(),
            number_length: default_number_length(),
            validity_years: default_validity_years(),
        }
    }
}

/// Interest rate provider configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RatesConfig {
    /// SOAP endpoint of the central bank daily info service.
    #[serde(default = "default_provider_url")]
    pub provider_url: String,
    /// Request timeout in seconds.
    #[serde(default = "default_rate_timeout")]
    pub timeout_secs: u64,
    /// Percentage points added on top of the benchmark rate.
    #[serde(default = "default_bank_margin")]
    pub bank_margin: Decimal,
    /// When set, this benchmark rate is used instead of calling the provider.
    #[serde(default)]
    pub fixed_rate: Option<Decimal>,
}

fn default_provider_url() -> String {
    "https://www.cbr.ru/DailyInfoWebServ/DailyInfo.asmx".to_string()
}

fn default_rate_timeout() -> u64 {
    10
}

fn default_bank_margin() -> Decimal {
    Decimal::new(500, 2)
}

impl Default for RatesConfig {
    fn default() -> Self {
        Self {
            provider_url: default_provider_url(),
            timeout_secs: default_rate_timeout(),
            bank_margin: default_bank_margin(),
            fixed_rate: None,
        }
    }
}

/// Settlement scheduler configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SettlementConfig {
    /// Whether the periodic sweep runs at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Seconds between sweeps.
    #[serde(default = "default_interval")]
    pub interval_secs: u64,
    /// Fraction of the installment added as penalty on each missed sweep.
    #[serde(default = "default_penalty_rate")]
    pub penalty_rate: Decimal,
}

fn default_true() -> bool {
    true
}

fn default_interval() -> u64 {
    86_400 // once a day
}

fn default_penalty_rate() -> Decimal {
    Decimal::new(10, 2)
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: default_interval(),
            penalty_rate: default_penalty_rate(),
        }
    }
}

/// Email configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    /// Whether notifications are sent over SMTP.
    #[serde(default)]
    pub enabled: bool,
    /// SMTP relay host.
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,
    /// SMTP relay port.
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    /// SMTP username.
    #[serde(default)]
    pub smtp_username: String,
    /// SMTP password.
    #[serde(default)]
    pub smtp_password: String,
    /// Sender address.
    #[serde(default = "default_from_email")]
    pub from_email: String,
    /// Sender display name.
    #[serde(default = "default_from_name")]
    pub from_name: String,
}

fn default_smtp_host() -> String {
    "localhost".to_string()
}

fn default_smtp_port() -> u16 {
    1025
}

fn default_from_email() -> String {
    "noreply@ledgerline.local".to_string()
}

fn default_from_name() -> String {
    "Ledgerline Bank".to_string()
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            smtp_host: default_smtp_host(),
            smtp_port: default_smtp_port(),
            smtp_username: String::new(),
            smtp_password: String::new(),
            from_email: default_from_email(),
            from_name: default_from_name(),
        }
    }
}

/// Log output configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

fn default_log_filter() -> String {
    "ledgerline=info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded or fails validation.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("LEDGERLINE").separator("__"))
            .build()?;

        let app: Self = config.try_deserialize()?;
        app.validate()?;
        Ok(app)
    }

    /// Checks cross-field constraints that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Message` describing the first violated constraint.
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        let key = hex::decode(&self.security.encryption_key).map_err(|_| {
            config::ConfigError::Message("security.encryption_key must be hex".to_string())
        })?;
        if !matches!(key.len(), 16 | 24 | 32) {
            return Err(config::ConfigError::Message(format!(
                "security.encryption_key must decode to 16, 24 or 32 bytes, got {}",
                key.len()
            )));
        }
        if self.security.integrity_secret.is_empty() {
            return Err(config::ConfigError::Message(
                "security.integrity_secret is required".to_string(),
            ));
        }
        if self.security.integrity_secret == self.security.encryption_key {
            return Err(config::ConfigError::Message(
                "security.integrity_secret must differ from the encryption key".to_string(),
            ));
        }
        self.cards.validate()?;
        if self.settlement.penalty_rate.is_sign_negative() {
            return Err(config::ConfigError::Message(
                "settlement.penalty_rate cannot be negative".to_string(),
            ));
        }
        if self.settlement.interval_secs == 0 {
            return Err(config::ConfigError::Message(
                "settlement.interval_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
