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
        admin::{AdminUserDto, AdminUserList, SetAdminRequest, UpdateOrderStatusRequest},
        analytics::{
            AnalyticsResponse, OrderStats, OverviewResponse, ProductStats, RevenueStats,
            TopCategory, TopProduct, UserStats,
        },
        auth::{AccountInfo, AuthResponse, SignInRequest, SignUpRequest},
        cart::{AddToCartRequest, CartItemDto, CartList},
        categories::{CategoryList, CreateCategoryRequest, UpdateCategoryRequest},
        orders::{
            CreateOrderRequest, OrderCreated, OrderItemRequest, OrderList, OrderWithItems,
            PayOrderRequest,
        },
        products::{CreateProductRequest, ProductList, UpdateProductRequest},
        profile::{MeResponse, UpdateProfileRequest},
        viewed::{TrackViewRequest, ViewedItemDto, ViewedList},
        wishlist::{AddWishlistRequest, WishlistItemDto, WishlistList},
    },
    models::{
        CartItem, Category, Order, OrderItem, Product, ProductSummary, Profile, ShippingAddress,
        ViewedEntry, WishlistEntry,
    },
    response::{ApiResponse, Meta},
    routes::{admin, auth, cart, categories, health, me, orders, params, products, viewed, wishlist},
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
        auth::sign_up,
        auth::sign_in,
        me::get_me,
        me::update_profile,
        products::list_products,
        products::get_product,
        categories::list_categories,
        categories::get_category,
        cart::cart_list,
        cart::add_to_cart,
        cart::remove_from_cart,
        cart::clear_cart,
        orders::create_order,
        orders::list_orders,
        orders::get_order,
        orders::pay_order,
        wishlist::list_wishlist,
        wishlist::add_to_wishlist,
        wishlist::remove_from_wishlist,
        wishlist::clear_wishlist,
        viewed::list_viewed,
        viewed::track_view,
        viewed::remove_view,
        viewed::clear_viewed,
        admin::list_all_orders,
        admin::get_order_admin,
        admin::update_order_status,
        admin::list_users,
        admin::set_admin,
        admin::get_analytics,
        admin::get_overview,
        admin::list_products_admin,
        admin::create_product,
        admin::update_product,
        admin::delete_product,
        admin::list_categories_admin,
        admin::create_category,
        admin::update_category,
        admin::delete_category
    ),
    components(
        schemas(
            Profile,
            Category,
            Product,
            ProductSummary,
            CartItem,
            Order,
            OrderItem,
            WishlistEntry,
            ViewedEntry,
            ShippingAddress,
            SignUpRequest,
            SignInRequest,
            AccountInfo,
            AuthResponse,
            MeResponse,
            UpdateProfileRequest,
            CreateProductRequest,
            UpdateProductRequest,
            ProductList,
            CreateCategoryRequest,
            UpdateCategoryRequest,
            CategoryList,
            AddToCartRequest,
            CartItemDto,
            CartList,
            CreateOrderRequest,
            OrderItemRequest,
            OrderCreated,
            PayOrderRequest,
            OrderList,
            OrderWithItems,
            AddWishlistRequest,
            WishlistItemDto,
            WishlistList,
            TrackViewRequest,
            ViewedItemDto,
            ViewedList,
            UpdateOrderStatusRequest,
            SetAdminRequest,
            AdminUserDto,
            AdminUserList,
            AnalyticsResponse,
            OrderStats,
            RevenueStats,
            UserStats,
            ProductStats,
            TopCategory,
            TopProduct,
            OverviewResponse,
            params::Pagination,
            params::ProductQuery,
            params::OrderListQuery,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<CategoryList>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<CartList>,
            ApiResponse<WishlistList>,
            ApiResponse<ViewedList>,
            ApiResponse<AnalyticsResponse>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Me", description = "Profile endpoints"),
        (name = "Products", description = "Product catalog endpoints"),
        (name = "Categories", description = "Category endpoints"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Orders", description = "Order endpoints"),
        (name = "Wishlist", description = "Wishlist endpoints"),
        (name = "Viewed", description = "Viewed history endpoints"),
        (name = "Admin", description = "Admin endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
