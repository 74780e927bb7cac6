// Data models for the relay surface and the Spotify payloads it consumes

pub mod relay;
pub mod spotify;
