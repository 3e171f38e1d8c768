use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub mongo: MongoSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub limits: LimitsSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }

#[derive(Debug, Clone, Deserialize)]
pub struct MongoSettings {
    /// Connection string; required
    #[serde(default)]
    pub uri: String,
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default = "default_vehicles_collection")]
    pub vehicles_collection: String,
    #[serde(default = "default_dealers_collection")]
    pub dealers_collection: String,
    #[serde(default = "default_app_name")]
    pub app_name: String,
    #[serde(default = "default_server_selection_timeout")]
    pub server_selection_timeout_secs: u64,
}

impl Default for MongoSettings {
    fn default() -> Self {
        Self {
            uri: String::new(),
            database: default_database(),
            vehicles_collection: default_vehicles_collection(),
            dealers_collection: default_dealers_collection(),
            app_name: default_app_name(),
            server_selection_timeout_secs: default_server_selection_timeout(),
        }
    }
}

fn default_database() -> String { "car_sales_db".to_string() }
fn default_vehicles_collection() -> String { "cars".to_string() }
fn default_dealers_collection() -> String { "dealers".to_string() }
fn default_app_name() -> String { "car-sales-analytics".to_string() }
fn default_server_selection_timeout() -> u64 { 10 }

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_results_ttl")]
    pub results_ttl_secs: u64,
    #[serde(default = "default_options_ttl")]
    pub options_ttl_secs: u64,
    #[serde(default = "default_max_entries")]
    pub max_entries: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            results_ttl_secs: default_results_ttl(),
            options_ttl_secs: default_options_ttl(),
            max_entries: default_max_entries(),
        }
    }
}

fn default_results_ttl() -> u64 { 300 }
fn default_options_ttl() -> u64 { 600 }
fn default_max_entries() -> u64 { 1000 }

#[derive(Debug, Clone, Deserialize)]
pub struct LimitsSettings {
    #[serde(default = "default_price_mileage_sample")]
    pub price_mileage_sample: usize,
    #[serde(default = "default_vehicle_list")]
    pub vehicle_list: usize,
}

impl Default for LimitsSettings {
    fn default() -> Self {
        Self {
            price_mileage_sample: default_price_mileage_sample(),
            vehicle_list: default_vehicle_list(),
        }
    }
}

fn default_price_mileage_sample() -> usize { 2000 }
fn default_vehicle_list() -> usize { 500 }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with CARSALES__)
    /// 5. `MONGO_URI`, if set
    ///
    /// A missing connection string is an error.
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., CARSALES__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("CARSALES")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Self::from_config(apply_mongo_uri(settings)?)
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("CARSALES")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Self::from_config(apply_mongo_uri(settings)?)
    }

    /// Deserialize and validate an assembled configuration
    pub fn from_config(config: Config) -> Result<Self, ConfigError> {
        let settings: Settings = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.mongo.uri.trim().is_empty() {
            return Err(ConfigError::NotFound(
                "mongo.uri (set MONGO_URI or CARSALES__MONGO__URI)".to_string(),
            ));
        }
        if self.mongo.database.trim().is_empty() {
            return Err(ConfigError::Message("mongo.database must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Let the plain `MONGO_URI` secret override the configured connection string
fn apply_mongo_uri(settings: Config) -> Result<Config, ConfigError> {
    match std::env::var("MONGO_URI") {
        Ok(uri) if !uri.trim().is_empty() => Config::builder()
            .add_source(settings)
            .set_override("mongo.uri", uri)?
            .build(),
        _ => Ok(settings),
    }
}
