pub mod auth;
pub mod cron;
pub mod email;
pub mod export;
pub mod menus;
pub mod metrics;
pub mod orders;
pub mod ordering;
