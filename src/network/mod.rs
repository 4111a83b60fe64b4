pub mod price_client;
pub mod wifi;

pub use self::price_client::TibberClient;
pub use self::wifi::WifiManager;
