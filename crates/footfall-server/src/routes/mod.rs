pub mod analytics;
pub mod duration;
pub mod health;
pub mod track;
