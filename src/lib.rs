//! Storefront API Library
//!
//! Catalog, checkout, payment verification, and order administration for
//! a small storefront backed by an external card-payment gateway.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod gateway;
pub mod handlers;
pub mod migrator;
pub mod notifications;
pub mod services;

use std::sync::Arc;

use crate::auth::{AdminAuthService, LoginRateLimiter};
use crate::config::AppConfig;
use crate::db::DbPool;
use crate::events::EventSender;
use crate::gateway::PaymentGateway;
use crate::notifications::EmailSender;
use crate::services::checkout::CheckoutService;
use crate::services::orders::OrderService;
use crate::services::verification::VerificationService;

pub use handlers::app_router;

/// Services used by the HTTP handlers.
#[derive(Clone)]
pub struct AppServices {
    pub checkout: Arc<CheckoutService>,
    pub verification: Arc<VerificationService>,
    pub orders: Arc<OrderService>,
    pub auth: Arc<AdminAuthService>,
    pub login_limiter: Arc<LoginRateLimiter>,
}

/// Shared application state, constructed once at startup and cloned into
/// every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub config: AppConfig,
    pub event_sender: EventSender,
    pub services: AppServices,
}

impl AppState {
    /// Wires the service graph. The gateway and mailer come in as trait
    /// objects so tests substitute doubles without touching the wiring.
    pub fn new(
        db: Arc<DbPool>,
        config: AppConfig,
        gateway: Arc<dyn PaymentGateway>,
        mailer: Arc<dyn EmailSender>,
        event_sender: EventSender,
    ) -> Self {
        let orders = OrderService::new(db.clone());

        let checkout = CheckoutService::new(
            gateway.clone(),
            event_sender.clone(),
            config.currency.clone(),
            config.paystack_public_key.clone(),
        );

        let verification = VerificationService::new(
            gateway,
            orders.clone(),
            mailer,
            event_sender.clone(),
            config.email_from.clone(),
        );

        let services = AppServices {
            checkout: Arc::new(checkout),
            verification: Arc::new(verification),
            orders: Arc::new(orders),
            auth: Arc::new(AdminAuthService::from_config(&config)),
            login_limiter: Arc::new(LoginRateLimiter::default()),
        };

        Self {
            db,
            config,
            event_sender,
            services,
        }
    }
}
