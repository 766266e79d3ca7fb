pub mod config;
pub mod logger;
pub mod profile;
pub mod server;

pub use config::*;
pub use logger::*;
pub use profile::ProxyProfile;
pub use server::ApplicationServer;
