//! # Tokengate Bot
//!
//! Discord bot that grants a role to members who prove they hold an NFT from a
//! configured ERC-721 collection.
//!
//! ## Flow
//!
//! ```text
//!  Discord ──POST /interactions──▶ server ──(deferred ack)──▶ Discord
//!                                    │
//!                                    ▼ VerificationJob
//!                                dispatch ──spawn per job──▶ VerificationHandler
//!                                                              │        │
//!                                                   OwnershipOracle   GuildPlatform
//!                                                     (eth_call)     (roles, grant)
//!                                                              │
//!                                    ResponseSink ◀────────────┘
//!                             (edit deferred reply)
//! ```
//!
//! The handler is the only place with decision logic; everything else moves
//! one request in and one response out.

pub mod discord;
pub mod dispatch;
pub mod handler;
pub mod platform;
pub mod server;
pub mod signature;
pub mod telemetry;

pub use discord::DiscordClient;
pub use dispatch::{spawn_dispatcher, Dispatcher, VerificationJob};
pub use handler::{GuildContext, VerificationHandler, VerificationRequest, VerificationResponse};
pub use platform::{GuildPlatform, GuildRole, InteractionToken, ResponseSink};
pub use server::{router, AppState};
pub use signature::SignatureVerifier;
