use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{
            AppleLoginRequest, AppleLoginResponse, AuthResponse, CheckEmailRequest,
            CheckEmailResponse, LoginRequest, RegisterRequest, SetRoleRequest,
        },
        availability::{AvailabilityEntryRequest, AvailabilityView, DayHoursRequest},
        booking::{
            BookedService, BookingBusiness, BookingServiceRequest, BookingView, BusinessClient,
            CancelledBooking, ClientSummary, CreateBookingRequest, CreatedBooking,
            OwnerBookingView, StaffSummary,
        },
        business::{
            BusinessView, CategoryInput, CategoryView, CreateBusinessRequest, CreatedBusiness,
            ServiceInput, ServiceView, StaffInput, StaffView,
        },
        favorites::{AddFavoriteRequest, FavoriteBusiness},
        notification::PushTokenRequest,
        search::{Passengers, RecentSearch, SaveSearchRequest},
    },
    models::{BookingStatus, Coordinates, Role, User, Weekday},
    response::{ApiResponse, Meta},
    routes::{
        auth, availability, booking, business, favorites, health, notification, params, search,
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        auth::apple_login,
        auth::set_role,
        auth::check_email,
        auth::me,
        auth::delete_account,
        business::create_business,
        business::list_businesses,
        business::get_business,
        business::list_by_owner,
        availability::get_availability,
        availability::upsert_availability,
        availability::update_day,
        availability::delete_day,
        booking::create_booking,
        booking::get_booking,
        booking::list_bookings,
        booking::list_owner_bookings,
        booking::list_business_clients,
        booking::cancel_booking,
        favorites::list_favorites,
        favorites::add_favorite,
        favorites::remove_favorite,
        notification::save_push_token,
        search::save_search,
        search::recent_searches,
        search::delete_search
    ),
    components(
        schemas(
            User,
            Role,
            BookingStatus,
            Weekday,
            Coordinates,
            RegisterRequest,
            LoginRequest,
            AppleLoginRequest,
            SetRoleRequest,
            CheckEmailRequest,
            CheckEmailResponse,
            AuthResponse,
            AppleLoginResponse,
            CreateBusinessRequest,
            StaffInput,
            CategoryInput,
            ServiceInput,
            CreatedBusiness,
            BusinessView,
            CategoryView,
            ServiceView,
            StaffView,
            AvailabilityEntryRequest,
            DayHoursRequest,
            AvailabilityView,
            CreateBookingRequest,
            BookingServiceRequest,
            CreatedBooking,
            BookedService,
            StaffSummary,
            BookingBusiness,
            BookingView,
            ClientSummary,
            OwnerBookingView,
            CancelledBooking,
            BusinessClient,
            AddFavoriteRequest,
            FavoriteBusiness,
            PushTokenRequest,
            SaveSearchRequest,
            Passengers,
            RecentSearch,
            params::Pagination,
            Meta,
            ApiResponse<BusinessView>,
            ApiResponse<BookingView>,
            ApiResponse<AuthResponse>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Business", description = "Business profile endpoints"),
        (name = "Availability", description = "Weekly opening hours"),
        (name = "Booking", description = "Booking endpoints"),
        (name = "Favorites", description = "Favorite endpoints"),
        (name = "Notifications", description = "Push notification registration"),
        (name = "Search", description = "Recent searches"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
