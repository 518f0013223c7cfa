//! WebSocket relay server for Gambit.
//!
//! Ties the layers together: transport (WebSocket text frames) →
//! wire (event codec) → room (registry + actors). Each accepted
//! connection gets its own session task that translates inbound
//! protocol events into registry/room operations and forwards room
//! broadcasts back out.
//!
//! ```rust,no_run
//! # struct MyOracle;
//! # impl gambit_room::Oracle for MyOracle {
//! #     fn initial_position(&self) -> String { String::new() }
//! #     fn turn(&self, _: &str) -> gambit_wire::Side { gambit_wire::Side::First }
//! #     fn apply(&self, _: &str, _: &gambit_wire::Action)
//! #         -> Result<gambit_room::Accepted, String> { Err(String::new()) }
//! # }
//! # async fn run() -> Result<(), gambit_server::ServerError> {
//! use gambit_server::RelayServerBuilder;
//!
//! let server = RelayServerBuilder::new()
//!     .bind("0.0.0.0:8080")
//!     .build(MyOracle)
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod net;
mod server;

pub use error::ServerError;
pub use server::{RelayServer, RelayServerBuilder};
