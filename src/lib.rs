pub mod account;
pub mod answer;
pub mod db;
pub mod global;
pub mod middleware;
pub mod orm;
pub mod question;
pub mod schema;
pub mod session;
pub mod tag;
pub mod user;
pub mod vote;
pub mod web;
