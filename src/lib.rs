pub mod batch;
pub mod charts;
pub mod config;
pub mod domain;
pub mod parsers;
pub mod providers;
