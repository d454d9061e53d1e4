mod common;

use std::time::Duration;

use receptionist::mailbox::Message;
use receptionist::{ActorContext, ActorRef, Listing, Pid, Runtime, ServiceKey};
use tokio::sync::mpsc;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(2);

struct Ping {
    reply_to: ActorRef<Pong>,
}

struct Pong;

fn ping_service_key() -> ServiceKey<Ping> {
    ServiceKey::new("pingService")
}

async fn ping_service(mut ctx: ActorContext<Ping>) {
    ctx.runtime()
        .receptionist()
        .register(&ping_service_key(), &ctx.myself())
        .expect("register ping service");
    while let Some(Ping { reply_to }) = ctx.recv_user().await {
        reply_to.tell(Pong);
    }
}

/// Pings once, then reports every pong it gets.
async fn pinger(mut ctx: ActorContext<Pong>, ping_service: ActorRef<Ping>, pongs: mpsc::UnboundedSender<Pid>) {
    ping_service.tell(Ping { reply_to: ctx.myself() });
    while let Some(Pong) = ctx.recv_user().await {
        let _ = pongs.send(ctx.pid());
    }
}

struct Observed {
    listings: mpsc::UnboundedReceiver<Vec<Pid>>,
    pongs: mpsc::UnboundedReceiver<Pid>,
    ping_service: ActorRef<Ping>,
}

/// Subscribes, starts the ping service, and spawns a pinger per instance in
/// every listing it receives.
async fn start_guardian(rt: &Runtime) -> Observed {
    let (listing_tx, listings) = mpsc::unbounded_channel();
    let (pong_tx, pongs) = mpsc::unbounded_channel();
    let (service_tx, mut service_rx) = mpsc::unbounded_channel();

    rt.spawn_actor(move |mut ctx: ActorContext<Listing<Ping>>| async move {
        ctx.runtime()
            .receptionist()
            .subscribe(&ping_service_key(), &ctx.myself())
            .expect("subscribe");
        let ps = ctx.spawn(ping_service);
        ctx.watch(&ps);
        let _ = service_tx.send(ps);

        while let Some(msg) = ctx.recv().await {
            if let Message::User(listing) = msg {
                for service in listing.iter() {
                    let service = service.clone();
                    let pong_tx = pong_tx.clone();
                    ctx.spawn(move |ctx| pinger(ctx, service, pong_tx));
                }
                let _ = listing_tx.send(listing.pids());
            }
        }
    });

    let ping_service = timeout(WAIT, service_rx.recv())
        .await
        .expect("guardian should start")
        .expect("guardian should spawn the ping service");
    Observed { listings, pongs, ping_service }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn guardian_discovers_ping_service_and_pinger_is_ponged_once() {
    common::init_tracing();
    let rt = Runtime::new();
    let mut observed = start_guardian(&rt).await;
    let ps = observed.ping_service.pid();

    // The subscription may be answered before the service registers.
    loop {
        let pids = timeout(WAIT, observed.listings.recv()).await.unwrap().unwrap();
        if !pids.is_empty() {
            assert_eq!(pids, vec![ps]);
            break;
        }
    }

    let ponged = timeout(WAIT, observed.pongs.recv()).await.unwrap().unwrap();
    assert!(timeout(Duration::from_millis(100), observed.pongs.recv()).await.is_err());
    assert_ne!(ponged, ps);

    rt.stop(ps);
    let pids = timeout(WAIT, observed.listings.recv()).await.unwrap().unwrap();
    assert!(pids.is_empty());
}
