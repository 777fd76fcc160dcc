//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! Handlers are generic over the engine's capability traits so that endpoint tests can run them against mocks.
//! Since actix cannot register generic handlers directly, each one gets a concrete registration struct via the
//! `route!` macro below.
use std::str::FromStr;

use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use market_engine::{
    db_types::{NewProduct, NewTrackingEvent, Order, OrderId, OrderStatus, ProductId, ProductUpdate, Role},
    order_objects::OrderQueryFilter,
    traits::{InventoryManagement, OrderManagement, PaymentGatewayDatabase, PaymentProvider, UserManagement},
    CatalogApi,
    OrderLifecycleApi,
    ReconciliationApi,
    UserApi,
};

use crate::{
    auth::{JwtClaims, TokenIssuer},
    config::RedirectUrls,
    data_objects::{
        AccountStatusUpdateRequest,
        AuthResponse,
        CheckoutRequest,
        CheckoutResponse,
        FeaturedParams,
        JsonResponse,
        LoginRequest,
        PaymentSuccessRequest,
        RoleUpdateRequest,
    },
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal requires $role:expr) => {
        paste::paste! { pub struct [<$name:camel Route>];}
        paste::paste! {
                impl [<$name:camel Route>] {
                #[allow(clippy::new_without_default)]
                pub fn new() -> Self { Self }
            }
        }
        paste::paste! {
            impl actix_web::dev::HttpServiceFactory for [<$name:camel Route>] {
                fn register(self, config: &mut actix_web::dev::AppService) {
                    let res = actix_web::Resource::new($path)
                        .name(stringify!($name))
                        .guard(actix_web::guard::$method())
                        .to($name)
                        .wrap($crate::middleware::AclMiddlewareFactory::new($role));
                    actix_web::dev::HttpServiceFactory::register(res, config);
                }
            }
        }
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+ where requires $role:expr)  => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>)
                    .wrap($crate::middleware::AclMiddlewareFactory::new($role));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Catalog (open)  ----------------------------------------------------

route!(all_products => Get "/products" impl InventoryManagement);
pub async fn all_products<B: InventoryManagement>(
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET all products");
    let products = api.all_products().await?;
    Ok(HttpResponse::Ok().json(products))
}

route!(featured_products => Get "/products/featured" impl InventoryManagement);
/// The storefront's default listing: visible, in-stock products, newest first. The `limit` query parameter is
/// clamped server-side, so clients cannot request unbounded pages.
pub async fn featured_products<B: InventoryManagement>(
    params: web::Query<FeaturedParams>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET featured products");
    let products = api.featured_products(params.limit).await?;
    Ok(HttpResponse::Ok().json(products))
}

route!(product_by_id => Get "/products/{id}" impl InventoryManagement);
pub async fn product_by_id<B: InventoryManagement>(
    path: web::Path<String>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = parse_product_id(&path.into_inner())?;
    debug!("💻️ GET product {id}");
    let product = api.product_by_id(&id).await?.ok_or_else(|| ServerError::NoRecordFound(format!("Product {id}")))?;
    Ok(HttpResponse::Ok().json(product))
}

//----------------------------------------------   Catalog (sellers)  -------------------------------------------------

route!(create_product => Post "/products" impl InventoryManagement where requires Role::Seller);
/// Sellers list products under their own identity. Only admins may list a product on another seller's behalf.
pub async fn create_product<B: InventoryManagement>(
    claims: JwtClaims,
    body: web::Json<NewProduct>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let product = body.into_inner();
    if !claims.role.covers(Role::Admin) && product.seller_email != claims.sub {
        info!("💻️ {} tried to list a product for {}. Refused.", claims.sub, product.seller_email);
        return Err(ServerError::InsufficientPermissions("You may only list products under your own email".into()));
    }
    let product = api.create_product(product).await?;
    debug!("💻️ Product {} created by {}", product.id, claims.sub);
    Ok(HttpResponse::Ok().json(product))
}

route!(update_product => Patch "/products/{id}" impl InventoryManagement where requires Role::Seller);
pub async fn update_product<B: InventoryManagement>(
    claims: JwtClaims,
    path: web::Path<String>,
    body: web::Json<ProductUpdate>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = parse_product_id(&path.into_inner())?;
    check_product_owner(&claims, &id, api.as_ref()).await?;
    debug!("💻️ PATCH product {id} by {}", claims.sub);
    let product = api.update_product(&id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(product))
}

route!(delete_product => Delete "/products/{id}" impl InventoryManagement where requires Role::Seller);
pub async fn delete_product<B: InventoryManagement>(
    claims: JwtClaims,
    path: web::Path<String>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = parse_product_id(&path.into_inner())?;
    check_product_owner(&claims, &id, api.as_ref()).await?;
    info!("💻️ DELETE product {id} by {}", claims.sub);
    api.delete_product(&id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Product {id} deleted"))))
}

async fn check_product_owner<B: InventoryManagement>(
    claims: &JwtClaims,
    id: &ProductId,
    api: &CatalogApi<B>,
) -> Result<(), ServerError> {
    let product = api.product_by_id(id).await?.ok_or_else(|| ServerError::NoRecordFound(format!("Product {id}")))?;
    if claims.role.covers(Role::Admin) || product.seller_email == claims.sub {
        Ok(())
    } else {
        info!("💻️ {} tried to modify product {id}, which belongs to {}. Refused.", claims.sub, product.seller_email);
        Err(ServerError::InsufficientPermissions("You may only modify your own products".into()))
    }
}

//----------------------------------------------   Checkout  ----------------------------------------------------

route!(checkout => Post "/checkout" impl PaymentGatewayDatabase, PaymentProvider where requires Role::Customer);
/// Opens a checkout session at the payment processor for one unit of the requested product and hands the redirect
/// URL back to the client. Nothing is written to the store here; orders only exist once the payment is reconciled.
pub async fn checkout<B: PaymentGatewayDatabase, P: PaymentProvider>(
    claims: JwtClaims,
    body: web::Json<CheckoutRequest>,
    urls: web::Data<RedirectUrls>,
    api: web::Data<ReconciliationApi<B, P>>,
) -> Result<HttpResponse, ServerError> {
    let product_id =
        ProductId::from_str(&body.product_id).map_err(|e| ServerError::InvalidRequestBody(e.to_string()))?;
    debug!("💻️ POST checkout for product {product_id} by {}", claims.sub);
    // The processor substitutes its session reference into the template when redirecting the buyer back to us.
    let success_url = format!("{}?session_id={{CHECKOUT_SESSION_ID}}", urls.success_url);
    let cancel_url = format!("{}/{product_id}", urls.cancel_url);
    let session = api.begin_checkout(&product_id, claims.sub.clone(), success_url, cancel_url).await?;
    Ok(HttpResponse::Ok().json(CheckoutResponse { session_id: session.id, url: session.url }))
}

route!(payment_success => Post "/payment-success" impl PaymentGatewayDatabase, PaymentProvider where requires Role::Customer);
/// The success page posts the session reference it was redirected back with. The session is resolved at the
/// processor and, if the payment completed, reconciled into an order. Safe to repeat; the receipt is stable.
pub async fn payment_success<B: PaymentGatewayDatabase, P: PaymentProvider>(
    claims: JwtClaims,
    body: web::Json<PaymentSuccessRequest>,
    api: web::Data<ReconciliationApi<B, P>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST payment-success for session {} by {}", body.session_id, claims.sub);
    let receipt = api.reconcile(&body.session_id).await?;
    Ok(HttpResponse::Ok().json(receipt))
}

//----------------------------------------------   Orders  ----------------------------------------------------

route!(my_orders => Get "/my-orders" impl OrderManagement where requires Role::Customer);
/// The caller's purchases. The email comes from the verified claims, never from the query.
pub async fn my_orders<B: OrderManagement>(
    claims: JwtClaims,
    api: web::Data<OrderLifecycleApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET my_orders for {}", claims.sub);
    let orders = api.orders_for_customer(claims.email()).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(manage_orders => Get "/manage-orders" impl OrderManagement where requires Role::Seller);
/// The caller's sales, for the seller dashboard.
pub async fn manage_orders<B: OrderManagement>(
    claims: JwtClaims,
    api: web::Data<OrderLifecycleApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET manage_orders for {}", claims.sub);
    let orders = api.orders_for_seller(claims.email()).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(all_orders => Get "/orders" impl OrderManagement where requires Role::Admin);
pub async fn all_orders<B: OrderManagement>(
    api: web::Data<OrderLifecycleApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET all orders");
    let orders = api.search_orders(OrderQueryFilter::default()).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(orders_by_status => Get "/orders/status/{status}" impl OrderManagement where requires Role::Admin);
pub async fn orders_by_status<B: OrderManagement>(
    path: web::Path<String>,
    api: web::Data<OrderLifecycleApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let status = path.into_inner();
    let status = OrderStatus::from_str(&status).map_err(|e| ServerError::InvalidRequestPath(e.to_string()))?;
    debug!("💻️ GET orders with status {status}");
    let orders = api.search_orders(OrderQueryFilter::default().with_status(status)).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(order_by_id => Get "/orders/{id}" impl OrderManagement where requires Role::Customer);
/// An order is visible to its buyer, its seller, and admins. Everyone else gets a 404 rather than a 403 so that
/// order ids leak nothing.
pub async fn order_by_id<B: OrderManagement>(
    claims: JwtClaims,
    path: web::Path<String>,
    api: web::Data<OrderLifecycleApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = parse_order_id(&path.into_inner())?;
    debug!("💻️ GET order {id} for {}", claims.sub);
    let order = fetch_visible_order(&claims, &id, api.as_ref()).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(approve_order => Post "/orders/{id}/approve" impl OrderManagement where requires Role::Seller);
pub async fn approve_order<B: OrderManagement>(
    claims: JwtClaims,
    path: web::Path<String>,
    api: web::Data<OrderLifecycleApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = parse_order_id(&path.into_inner())?;
    check_order_manager(&claims, &id, api.as_ref()).await?;
    info!("💻️ POST approve order {id} by {}", claims.sub);
    let order = api.approve_order(&id).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(reject_order => Post "/orders/{id}/reject" impl OrderManagement where requires Role::Seller);
pub async fn reject_order<B: OrderManagement>(
    claims: JwtClaims,
    path: web::Path<String>,
    api: web::Data<OrderLifecycleApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = parse_order_id(&path.into_inner())?;
    check_order_manager(&claims, &id, api.as_ref()).await?;
    info!("💻️ POST reject order {id} by {}", claims.sub);
    let order = api.reject_order(&id).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(add_tracking => Post "/orders/{id}/tracking" impl OrderManagement where requires Role::Seller);
pub async fn add_tracking<B: OrderManagement>(
    claims: JwtClaims,
    path: web::Path<String>,
    body: web::Json<NewTrackingEvent>,
    api: web::Data<OrderLifecycleApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = parse_order_id(&path.into_inner())?;
    check_order_manager(&claims, &id, api.as_ref()).await?;
    debug!("💻️ POST tracking event for order {id} by {}", claims.sub);
    let order = api.add_tracking_event(&id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(order_tracking => Get "/orders/{id}/tracking" impl OrderManagement where requires Role::Customer);
pub async fn order_tracking<B: OrderManagement>(
    claims: JwtClaims,
    path: web::Path<String>,
    api: web::Data<OrderLifecycleApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = parse_order_id(&path.into_inner())?;
    debug!("💻️ GET tracking for order {id} by {}", claims.sub);
    fetch_visible_order(&claims, &id, api.as_ref()).await?;
    let detail = api.tracking_for_order(&id).await?;
    Ok(HttpResponse::Ok().json(detail))
}

/// Fetches the order if the caller is a participant (buyer or seller) or an admin. Absent orders and orders the
/// caller may not see are indistinguishable.
async fn fetch_visible_order<B: OrderManagement>(
    claims: &JwtClaims,
    id: &OrderId,
    api: &OrderLifecycleApi<B>,
) -> Result<Order, ServerError> {
    let order = api.order_by_id(id).await?.ok_or_else(|| ServerError::NoRecordFound(format!("Order {id}")))?;
    if claims.role.covers(Role::Admin) || order.customer_email == claims.sub || order.seller_email == claims.sub {
        Ok(order)
    } else {
        debug!("💻️ {} asked for order {id}, which they are not a party to.", claims.sub);
        Err(ServerError::NoRecordFound(format!("Order {id}")))
    }
}

/// Only the order's seller (or an admin) may move its status or append tracking events.
async fn check_order_manager<B: OrderManagement>(
    claims: &JwtClaims,
    id: &OrderId,
    api: &OrderLifecycleApi<B>,
) -> Result<(), ServerError> {
    let order = api.order_by_id(id).await?.ok_or_else(|| ServerError::NoRecordFound(format!("Order {id}")))?;
    if claims.role.covers(Role::Admin) || order.seller_email == claims.sub {
        Ok(())
    } else {
        info!("💻️ {} tried to manage order {id}, which belongs to {}. Refused.", claims.sub, order.seller_email);
        Err(ServerError::InsufficientPermissions("You may only manage your own orders".into()))
    }
}

//----------------------------------------------   Users  ----------------------------------------------------

route!(login => Post "/users/login" impl UserManagement);
/// Records a login and issues an access token. First-time callers get an account with the `Customer` role; the
/// upsert never touches the role or status of an existing account. The identity itself is assumed to have been
/// verified by the access gate fronting this service.
pub async fn login<B: UserManagement>(
    body: web::Json<LoginRequest>,
    api: web::Data<UserApi<B>>,
    signer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, ServerError> {
    let email = body.into_inner().email;
    trace!("💻️ POST login for {email}");
    let user = api.on_login(&email).await?;
    let access_token = signer.issue_token(&user.email, user.role, None)?;
    debug!("💻️ Issued access token for {email}");
    Ok(HttpResponse::Ok().json(AuthResponse { access_token, role: user.role }))
}

route!(user_role => Get "/users/role/{email}" impl UserManagement where requires Role::Customer);
/// Callers may look up their own account; admins may look up anyone's.
pub async fn user_role<B: UserManagement>(
    claims: JwtClaims,
    path: web::Path<String>,
    api: web::Data<UserApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let email = path.into_inner();
    if !claims.role.covers(Role::Admin) && email != claims.sub {
        return Err(ServerError::InsufficientPermissions("You may only look up your own account".into()));
    }
    debug!("💻️ GET role for {email}");
    let user = api.user_by_email(&email).await?.ok_or_else(|| ServerError::NoRecordFound(format!("User {email}")))?;
    Ok(HttpResponse::Ok().json(user))
}

route!(all_users => Get "/users" impl UserManagement where requires Role::Admin);
/// Every account except the caller's own, so the admin view never offers self-demotion.
pub async fn all_users<B: UserManagement>(
    claims: JwtClaims,
    api: web::Data<UserApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET all users for {}", claims.sub);
    let users = api.all_users_except(claims.email()).await?;
    Ok(HttpResponse::Ok().json(users))
}

route!(update_user_role => Patch "/users/role" impl UserManagement where requires Role::Admin);
pub async fn update_user_role<B: UserManagement>(
    claims: JwtClaims,
    body: web::Json<RoleUpdateRequest>,
    api: web::Data<UserApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    info!("💻️ PATCH role for {} to {} by {}", req.email, req.role, claims.sub);
    let user = api.set_role(&req.email, req.role).await?;
    Ok(HttpResponse::Ok().json(user))
}

route!(update_account_status => Patch "/users/status" impl UserManagement where requires Role::Admin);
pub async fn update_account_status<B: UserManagement>(
    claims: JwtClaims,
    body: web::Json<AccountStatusUpdateRequest>,
    api: web::Data<UserApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    info!("💻️ PATCH account status for {} to {} by {}", req.email, req.status, claims.sub);
    let user = api.set_account_status(&req.email, req.status).await?;
    Ok(HttpResponse::Ok().json(user))
}

//----------------------------------------------   Helpers  ----------------------------------------------------

fn parse_product_id(s: &str) -> Result<ProductId, ServerError> {
    ProductId::from_str(s).map_err(|e| ServerError::InvalidRequestPath(e.to_string()))
}

fn parse_order_id(s: &str) -> Result<OrderId, ServerError> {
    OrderId::from_str(s).map_err(|e| ServerError::InvalidRequestPath(e.to_string()))
}
