//! 保障与理赔服务库
//! 保单、物品保障、理赔审核与账务

pub mod auth;
pub mod authz;
pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod handlers;
pub mod lifecycle;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod routes;
pub mod services;
pub mod telemetry;
