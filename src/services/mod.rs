pub mod citations;
pub mod detection;
pub mod fingerprint;
pub mod oracles;
pub mod stylometry;
pub mod text_processor;
