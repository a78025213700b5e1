pub mod cookies;
pub mod downloader;
pub mod identifier;
pub mod naming;
pub mod report;
pub mod resolver;
pub mod tagger;
