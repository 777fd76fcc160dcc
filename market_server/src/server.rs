use std::time::Duration;

use actix_web::{http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use market_engine::{CatalogApi, OrderLifecycleApi, ReconciliationApi, SqliteDatabase, UserApi};

use crate::{
    auth::{TokenIssuer, TokenVerifier},
    config::{RedirectUrls, ServerConfig},
    errors::ServerError,
    processor::PaymentProcessorClient,
    routes::{
        health,
        AddTrackingRoute,
        AllOrdersRoute,
        AllProductsRoute,
        AllUsersRoute,
        ApproveOrderRoute,
        CheckoutRoute,
        CreateProductRoute,
        DeleteProductRoute,
        FeaturedProductsRoute,
        LoginRoute,
        ManageOrdersRoute,
        MyOrdersRoute,
        OrderByIdRoute,
        OrderTrackingRoute,
        OrdersByStatusRoute,
        PaymentSuccessRoute,
        ProductByIdRoute,
        RejectOrderRoute,
        UpdateAccountStatusRoute,
        UpdateProductRoute,
        UpdateUserRoleRoute,
        UserRoleRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    sqlx::migrate!("../market_engine/migrations")
        .run(db.pool())
        .await
        .map_err(|e| ServerError::InitializeError(format!("Could not run database migrations. {e}")))?;
    info!("🚀️ Database is ready at {}", config.database_url);
    let srv = create_server_instance(config, db)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(config: ServerConfig, db: SqliteDatabase) -> Result<actix_web::dev::Server, ServerError> {
    let processor = PaymentProcessorClient::new(&config.processor)?;
    let redirects = RedirectUrls::from(&config.processor);
    let log_format = if config.use_x_forwarded_for {
        "%t (%D ms) %s %{X-Forwarded-For}i %{Host}i %U"
    } else {
        "%t (%D ms) %s %a %{Host}i %U"
    };
    let srv = HttpServer::new(move || {
        let catalog_api = CatalogApi::new(db.clone());
        let lifecycle_api = OrderLifecycleApi::new(db.clone());
        let users_api = UserApi::new(db.clone());
        let reconciliation_api = ReconciliationApi::new(db.clone(), processor.clone());
        let jwt_signer = TokenIssuer::new(&config.auth);
        let jwt_verifier = TokenVerifier::new(&config.auth);
        let app = App::new()
            .wrap(Logger::new(log_format).log_target("mps::access_log"))
            .app_data(web::Data::new(catalog_api))
            .app_data(web::Data::new(lifecycle_api))
            .app_data(web::Data::new(users_api))
            .app_data(web::Data::new(reconciliation_api))
            .app_data(web::Data::new(jwt_signer))
            .app_data(web::Data::new(jwt_verifier))
            .app_data(web::Data::new(redirects.clone()));
        // Routes that require authentication. Login lives here without an ACL wrap; it is what issues the tokens.
        // Fixed segments are registered ahead of their parameterised siblings.
        let auth_scope = web::scope("/api")
            .service(LoginRoute::<SqliteDatabase>::new())
            .service(CreateProductRoute::<SqliteDatabase>::new())
            .service(UpdateProductRoute::<SqliteDatabase>::new())
            .service(DeleteProductRoute::<SqliteDatabase>::new())
            .service(CheckoutRoute::<SqliteDatabase, PaymentProcessorClient>::new())
            .service(PaymentSuccessRoute::<SqliteDatabase, PaymentProcessorClient>::new())
            .service(MyOrdersRoute::<SqliteDatabase>::new())
            .service(ManageOrdersRoute::<SqliteDatabase>::new())
            .service(AllOrdersRoute::<SqliteDatabase>::new())
            .service(OrdersByStatusRoute::<SqliteDatabase>::new())
            .service(ApproveOrderRoute::<SqliteDatabase>::new())
            .service(RejectOrderRoute::<SqliteDatabase>::new())
            .service(AddTrackingRoute::<SqliteDatabase>::new())
            .service(OrderTrackingRoute::<SqliteDatabase>::new())
            .service(OrderByIdRoute::<SqliteDatabase>::new())
            .service(UserRoleRoute::<SqliteDatabase>::new())
            .service(AllUsersRoute::<SqliteDatabase>::new())
            .service(UpdateUserRoleRoute::<SqliteDatabase>::new())
            .service(UpdateAccountStatusRoute::<SqliteDatabase>::new());
        app.service(health)
            .service(AllProductsRoute::<SqliteDatabase>::new())
            .service(FeaturedProductsRoute::<SqliteDatabase>::new())
            .service(ProductByIdRoute::<SqliteDatabase>::new())
            .service(auth_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
