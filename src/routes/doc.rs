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
            ChangePasswordRequest, ForgotPasswordRequest, LoginRequest, LoginResponse,
            RegisterRequest, ResetPasswordRequest, UpdateProfileRequest,
        },
        cart::{AddToCartRequest, CartItemDto, CartList, UpdateCartQuantityRequest},
        dashboard::{DashboardStats, DayBucket, StatCounter, StatusBucket},
        orders::{AdminOrderDetail, CheckoutRequest, CustomerInfo, OrderList, OrderWithItems},
        products::{CreateProductRequest, ProductList, UpdateProductRequest},
        users::{CreateUserRequest, UpdateUserRequest, UserList},
        wishlist::{AddWishlistRequest, WishlistProductList},
    },
    error::StockShortage,
    models::{CartItem, Order, OrderItem, Product, User, WishlistItem},
    response::{ApiResponse, Meta},
    routes::{
        admin, auth, cart, health, orders, params, products as product_routes, uploads, wishlist,
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
        auth::me,
        auth::update_me,
        auth::change_password,
        auth::forgot_password,
        auth::reset_password,
        product_routes::list_products,
        product_routes::get_product,
        cart::cart_list,
        cart::add_to_cart,
        cart::update_quantity,
        cart::remove_from_cart,
        orders::list_orders,
        orders::checkout,
        orders::get_order,
        wishlist::list_wishlist,
        wishlist::add_to_wishlist,
        wishlist::remove_from_wishlist,
        uploads::upload_image,
        uploads::delete_image,
        admin::list_all_orders,
        admin::get_order_admin,
        admin::update_order_status,
        admin::create_product,
        admin::update_product,
        admin::delete_product,
        admin::list_users,
        admin::create_user,
        admin::update_user,
        admin::delete_user,
        admin::dashboard
    ),
    components(
        schemas(
            User,
            Product,
            CartItem,
            Order,
            OrderItem,
            WishlistItem,
            StockShortage,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            UpdateProfileRequest,
            ChangePasswordRequest,
            ForgotPasswordRequest,
            ResetPasswordRequest,
            AddToCartRequest,
            UpdateCartQuantityRequest,
            CartItemDto,
            CartList,
            CheckoutRequest,
            OrderWithItems,
            OrderList,
            CustomerInfo,
            AdminOrderDetail,
            CreateProductRequest,
            UpdateProductRequest,
            ProductList,
            CreateUserRequest,
            UpdateUserRequest,
            UserList,
            AddWishlistRequest,
            WishlistProductList,
            StatCounter,
            StatusBucket,
            DayBucket,
            DashboardStats,
            admin::UpdateOrderStatusRequest,
            uploads::UploadResponse,
            params::Pagination,
            params::ProductQuery,
            params::OrderListQuery,
            params::UserQuery,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<CartList>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<UserList>,
            ApiResponse<WishlistProductList>,
            ApiResponse<DashboardStats>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication and profile endpoints"),
        (name = "Products", description = "Public catalog endpoints"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Orders", description = "Order endpoints"),
        (name = "Wishlist", description = "Wishlist endpoints"),
        (name = "Uploads", description = "Image upload endpoints"),
        (name = "Admin", description = "Admin endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
