use magichome_api::{profile::Family, DriverConfig, Error};
use std::net::SocketAddrV4;
use tokio::time::Duration;

const DEF_POLL_INTERVAL: u64 = 5;
const DEF_TIMEOUT: u64 = 1_000;

#[derive(serde_derive::Deserialize, Debug)]
pub struct Params {
    /// Address and port of the controller. MagicHome devices listen
    /// on port 5577.
    pub addr: SocketAddrV4,
    /// The light version reported by the device. It selects the
    /// channel layout used when encoding colors.
    pub version: u8,
    /// Seconds between state polls.
    pub poll_interval: Option<u64>,
    /// Milliseconds to wait for a state reply.
    pub timeout: Option<u64>,
}

impl Params {
    pub fn family(&self) -> Family {
        Family::from_version(self.version)
    }

    // A zero interval isn't allowed by the timer, so polls happen at
    // most once a second.

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(
            self.poll_interval.unwrap_or(DEF_POLL_INTERVAL).max(1),
        )
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout.unwrap_or(DEF_TIMEOUT))
    }
}

impl TryFrom<DriverConfig> for Params {
    type Error = Error;

    fn try_from(cfg: DriverConfig) -> std::result::Result<Self, Self::Error> {
        cfg.parse_into()
    }
}
