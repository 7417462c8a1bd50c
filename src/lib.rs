pub mod config;
pub mod db;
pub mod domain;
pub mod middleware;
pub mod pipeline;
pub mod state;
pub mod time_utils;
pub mod web;
