use crate::pages::PageKind;
use std::env;
use url::Url;

pub const DEFAULT_BACKEND: &str = "http://localhost:8080/";
pub const DEFAULT_MIRROR_PORT: u16 = 8402;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub backend: Url,
    pub page: PageKind,
    pub mirror_port: u16,
}

impl Config {
    pub fn from_env() -> Result<Config, failure::Error> {
        Config::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Config, failure::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend = lookup("BACKEND_URL").unwrap_or_else(|| DEFAULT_BACKEND.to_string());
        let backend =
            Url::parse(&backend).map_err(|e| format_err!("Invalid BACKEND_URL {}: {}", backend, e))?;
        let page = lookup("DASHBOARD_PAGE")
            .unwrap_or_else(|| "dashboard".to_string())
            .parse()?;
        let mirror_port = match lookup("MIRROR_PORT") {
            Some(port) => port
                .parse::<u16>()
                .map_err(|e| format_err!("Invalid MIRROR_PORT {}: {}", port, e))?,
            None => DEFAULT_MIRROR_PORT,
        };
        Ok(Config {
            backend,
            page,
            mirror_port,
        })
    }
}
