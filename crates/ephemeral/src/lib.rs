pub mod docx;
pub mod errors;
pub mod export;
pub mod models;
pub mod normalizer;
pub mod providers;
pub mod session;
pub mod transcript;
