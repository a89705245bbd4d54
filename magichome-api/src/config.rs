//! Represents how configuration information is given to a driver.
//! Each device section of the configuration file carries a `cfg`
//! table whose layout only the driver understands, so the type is a
//! thin wrapper around a `toml` table with `String` keys.

use crate::{types::Error, Result};
use serde::de::DeserializeOwned;
use std::ops::Deref;
use toml::value::{Table, Value};

#[derive(Clone, Debug, Default, serde_derive::Deserialize)]
#[serde(transparent)]
pub struct DriverConfig(Table);

impl DriverConfig {
    /// Return a reference to the underlying toml::Value for a key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Deserializes the whole table into a driver's parameter type.
    pub fn parse_into<T>(&self) -> Result<T>
    where
        T: DeserializeOwned,
    {
        Value::Table(self.0.clone()).try_into().map_err(|e| {
            Error::ConfigError(format!("config parse error: {}", e))
        })
    }
}

impl From<Table> for DriverConfig {
    fn from(t: Table) -> Self {
        DriverConfig(t)
    }
}

impl From<DriverConfig> for Table {
    fn from(dc: DriverConfig) -> Self {
        dc.0
    }
}

impl Deref for DriverConfig {
    type Target = Table;

    fn deref(&self) -> &Table {
        &self.0
    }
}
