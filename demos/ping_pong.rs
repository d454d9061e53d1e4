//! A guardian subscribes to the ping service key, then starts a ping
//! service. Every listing it receives spawns one pinger per live ping
//! service; each pinger pings once and reports the pong.
//!
//! Run with `cargo run --example ping_pong --features demo`.

use std::time::Duration;

use receptionist::mailbox::{Message, SystemMessage};
use receptionist::{ActorContext, ActorRef, Listing, ServiceKey};
use tracing_subscriber::EnvFilter;

struct Ping {
    reply_to: ActorRef<Pong>,
}

#[derive(Debug)]
struct Pong;

fn ping_service_key() -> ServiceKey<Ping> {
    ServiceKey::new("pingService")
}

async fn ping_service(mut ctx: ActorContext<Ping>) {
    if let Err(e) = ctx.runtime().receptionist().register(&ping_service_key(), &ctx.myself()) {
        tracing::error!(error = %e, "ping service could not register");
        return;
    }
    while let Some(Ping { reply_to }) = ctx.recv_user().await {
        reply_to.tell(Pong);
    }
}

async fn pinger(mut ctx: ActorContext<Pong>, ping_service: ActorRef<Ping>) {
    ping_service.tell(Ping { reply_to: ctx.myself() });
    while let Some(msg) = ctx.recv_user().await {
        println!("I was ponged! {msg:?}");
    }
}

async fn guardian(mut ctx: ActorContext<Listing<Ping>>) {
    let receptionist = ctx.runtime().receptionist();
    if let Err(e) = receptionist.subscribe(&ping_service_key(), &ctx.myself()) {
        tracing::error!(error = %e, "guardian could not subscribe");
        return;
    }
    let ps = ctx.spawn(ping_service);
    ctx.watch(&ps);

    while let Some(msg) = ctx.recv().await {
        match msg {
            Message::User(listing) => {
                tracing::info!(instances = listing.len(), "ping services changed");
                for service in listing.iter() {
                    let service = service.clone();
                    ctx.spawn(move |ctx| pinger(ctx, service));
                }
            }
            Message::System(SystemMessage::Exit(info)) => {
                tracing::info!(pid = info.from, reason = ?info.reason, "ping service stopped");
            }
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let rt = receptionist::Runtime::new();
    rt.spawn_actor(guardian);

    tokio::time::sleep(Duration::from_millis(200)).await;
}
