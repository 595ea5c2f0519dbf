//! Example client for the grpcoin paper-trading service.
//!
//! The flow is: load a [`Config`], [`connect`] an authenticated channel, run
//! the three unary calls through a [`Session`], then [`consume`] a live quote
//! stream until the server closes it or the caller cancels.

pub mod amount;
pub mod auth;
pub mod client;
pub mod config;
pub mod session;
pub mod tick;
pub mod watch;

// generated messages and service stubs
pub mod proto {
    tonic::include_proto!("grpcoin");
}

pub use amount::AmountError;
pub use auth::BearerAuth;
pub use client::{connect, ClientError, GrpcoinClient};
pub use config::{Config, ConfigError, Target, Token};
pub use session::{Session, SessionError, TradeOrder};
pub use tick::Tick;
pub use watch::consume;
