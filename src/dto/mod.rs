pub mod amount;
pub mod auth;
pub mod availability;
pub mod booking;
pub mod business;
pub mod favorites;
pub mod notification;
pub mod search;
