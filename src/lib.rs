// src/lib.rs
//! Receptionist: typed, in-process service registration and discovery.
//!
//! A small tokio actor runtime ([`Runtime`]) hosts actors addressed by
//! [`ActorRef`]s. Its [`Receptionist`] lets actors advertise themselves under
//! a typed [`ServiceKey`] and lets others discover, or subscribe to, the
//! current set of advertisers.
//!
//! ```no_run
//! use receptionist::{ActorContext, Listing, Runtime, ServiceKey};
//!
//! struct Ping;
//!
//! # async fn demo() -> receptionist::Result<()> {
//! let rt = Runtime::new();
//! let key = ServiceKey::<Ping>::new("pingService");
//! let service = rt.spawn_actor(|mut ctx: ActorContext<Ping>| async move {
//!     while ctx.recv_user().await.is_some() {}
//! });
//! rt.receptionist().register(&key, &service)?;
//!
//! let listing: Listing<Ping> = rt.receptionist().ask_find(&key).await?;
//! assert!(listing.contains(&service));
//! # Ok(())
//! # }
//! ```

pub mod address;
pub mod config;
pub mod error;
pub mod key;
pub mod mailbox;
pub mod pid;
pub mod receptionist;
pub mod runtime;

pub use address::ActorRef;
pub use config::ReceptionistConfig;
pub use error::{Error, Result};
pub use key::ServiceKey;
pub use pid::Pid;
pub use receptionist::{Deregistered, Listing, Receptionist, Registered};
pub use runtime::{ActorContext, Inbox, Runtime};
