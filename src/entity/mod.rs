pub mod booking_services;
pub mod bookings;
pub mod business_availability;
pub mod business_images;
pub mod business_profiles;
pub mod business_staff;
pub mod favorites;
pub mod service_categories;
pub mod services;
pub mod users;

pub use booking_services::Entity as BookingServices;
pub use bookings::Entity as Bookings;
pub use business_availability::Entity as BusinessAvailability;
pub use business_images::Entity as BusinessImages;
pub use business_profiles::Entity as BusinessProfiles;
pub use business_staff::Entity as BusinessStaff;
pub use favorites::Entity as Favorites;
pub use service_categories::Entity as ServiceCategories;
pub use services::Entity as Services;
pub use users::Entity as Users;
