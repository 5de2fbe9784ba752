use actix_cors::Cors;
use actix_web::dev::Server;
use actix_web::{middleware::Logger, web, App, HttpServer};
use sqlx::PgPool;
use std::net::TcpListener;

use crate::configuration::{ApplicationSettings, JwtSettings};
use crate::email_client::EmailClient;
use crate::logger::LoggerMiddleware;
use crate::middleware::JwtMiddleware;
use crate::routes::{
    create_book, delete_book, get_book, health_check, list_books, logout, recover_password,
    refresh, signin, signup, update_book, update_password,
};

pub fn run(
    listener: TcpListener,
    connection: PgPool,
    app_settings: ApplicationSettings,
    jwt_config: JwtSettings,
    email_client: EmailClient,
) -> Result<Server, std::io::Error> {
    let connection = web::Data::new(connection);
    let jwt_config_data = web::Data::new(jwt_config.clone());
    let email_client = web::Data::new(email_client);

    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&app_settings.cors_allowed_origin)
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .wrap(Logger::default())
            .wrap(LoggerMiddleware)
            .wrap(cors)
            // Shared state
            .app_data(connection.clone())
            .app_data(jwt_config_data.clone())
            .app_data(email_client.clone())
            // Public routes
            .route("/health_check", web::get().to(health_check))
            .route("/auth/signup", web::post().to(signup))
            .route("/auth/signin", web::post().to(signin))
            .route("/auth/refresh", web::post().to(refresh))
            .route("/auth/recover-password", web::post().to(recover_password))
            .route("/auth/update-password", web::put().to(update_password))
            // Logout requires a valid bearer token
            .service(
                web::scope("/auth")
                    .wrap(JwtMiddleware::new(jwt_config.clone()))
                    .route("/logout", web::post().to(logout)),
            )
            // Catalog requires sign-in; mutations additionally require admin
            .service(
                web::scope("/books")
                    .wrap(JwtMiddleware::new(jwt_config.clone()))
                    .route("", web::get().to(list_books))
                    .route("", web::post().to(create_book))
                    .route("/{id}", web::get().to(get_book))
                    .route("/{id}", web::put().to(update_book))
                    .route("/{id}", web::delete().to(delete_book)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
