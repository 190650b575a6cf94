pub mod api;
pub mod auth;
pub mod config;
pub mod control;
pub mod db;
pub mod sensors;
