pub mod auth_service;
pub mod availability_service;
pub mod booking_service;
pub mod business_service;
pub mod favorite_service;
pub mod notification_service;
pub mod search_service;
