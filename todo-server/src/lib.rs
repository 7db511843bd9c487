pub mod config {
    use serde::Deserialize;

    #[derive(Deserialize, Debug)]
    pub struct Config {
        #[serde(default = "default_db_url")]
        pub db_url: String,
        #[serde(default = "default_port")]
        pub port: u16,
        /// Prefix every todo route is mounted under, e.g. `/api`.
        #[serde(default)]
        pub base_path: String,
    }

    impl Config {
        /// Loads configuration from environment variables.
        pub fn from_env() -> anyhow::Result<Self> {
            let settings = config::Config::builder()
                .add_source(config::Environment::default())
                .build()?;

            let config: Config = settings.try_deserialize()?;
            Ok(config)
        }
    }

    fn default_db_url() -> String {
        "sqlite://todos.db?mode=rwc".to_string()
    }

    fn default_port() -> u16 {
        8080
    }
}
pub mod entities;
pub mod query;
pub mod tag;
pub mod todo;
pub mod web;
