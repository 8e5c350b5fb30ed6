pub mod generator;
pub mod google;
pub mod synthesized;
