use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use serde::Serialize;
use tokio::sync::mpsc;

use courier_core::app::{CourierConfig, HubBuilder, WorkerHub};
use courier_core::domain::{
    ActorId, Header, MailboxElement, MessageId, NodeId, WirePayload,
};
use courier_core::impls::{
    ChannelActor, CollectingErrorSink, ForwardingProxyFactory, InMemoryProxyRegistry,
    OutboundMessage, TokioScheduler,
};
use courier_core::observability::init_logging;
use courier_core::system::ActorSystem;

const PRODUCERS: usize = 3;
const MESSAGES_PER_PRODUCER: u64 = 20;
const PINGER: ActorId = ActorId::new(1);

#[derive(Debug, Serialize)]
struct Ping {
    producer: usize,
    seq: u64,
}

/// I/O スレッドの代わり: ランダムな peer / sender で direct message を投入
fn producer(hub: WorkerHub, producer: usize, peers: Vec<NodeId>) -> Result<Vec<MessageId>, String> {
    let mut rng = rand::thread_rng();
    let mut ids = Vec::new();
    for seq in 0..MESSAGES_PER_PRODUCER {
        let peer = peers[rng.gen_range(0..peers.len())];
        let sender = ActorId::new(rng.gen_range(1..=5));
        let content = serde_json::to_value(Ping { producer, seq }).map_err(|e| e.to_string())?;
        let payload = WirePayload::new(content)
            .to_bytes()
            .map_err(|e| e.to_string())?;
        let hdr = Header::direct(sender, PINGER, payload.len() as u32);
        let id = hub.submit(peer, &hdr, &payload).map_err(|e| e.to_string())?;
        ids.push(id);
    }
    Ok(ids)
}

/// Every tenth message is answered through the sender's proxy.
async fn pinger(mut mailbox: mpsc::UnboundedReceiver<MailboxElement>, expected: usize) -> Vec<MessageId> {
    let mut seen = Vec::with_capacity(expected);
    while seen.len() < expected {
        let Some(element) = mailbox.recv().await else {
            break;
        };
        if element.id.get() % 10 == 0
            && let Some(sender) = &element.sender
        {
            sender.enqueue(MailboxElement {
                id: element.id,
                request_id: element.request_id,
                sender: None,
                stages: Vec::new(),
                content: serde_json::json!("pong"),
            });
        }
        seen.push(element.id);
    }
    seen
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // (A) 設定: 引数のファイル → 環境変数
    let config = match std::env::args().nth(1) {
        Some(path) => CourierConfig::from_path(path)?,
        None => CourierConfig::default(),
    }
    .from_env()?;
    init_logging(&config.log_level);

    // (B) system / proxy registry / hub を用意
    let local = NodeId::generate();
    let errors = Arc::new(CollectingErrorSink::new());
    let scheduler =
        TokioScheduler::current().with_max_throughput(config.scheduler.max_throughput);
    let system = Arc::new(
        ActorSystem::new(local, Arc::new(scheduler)).with_error_sink(errors.clone()),
    );
    let (actor, mailbox) = ChannelActor::spawn(local, PINGER);
    system.register(actor)?;

    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<OutboundMessage>();
    let proxies = Arc::new(InMemoryProxyRegistry::new(ForwardingProxyFactory::new(
        outbound_tx,
    )));
    let hub = HubBuilder::new(Arc::clone(&system))
        .config(config.hub.clone())
        .proxy_registry(proxies.clone())
        .build()?;

    let good = PRODUCERS * MESSAGES_PER_PRODUCER as usize;
    let consumer = tokio::spawn(pinger(mailbox, good));

    // (C) producer スレッドから投入
    let peers: Vec<NodeId> = (0..3).map(|_| NodeId::generate()).collect();
    let threads: Vec<_> = (0..PRODUCERS)
        .map(|n| {
            let hub = hub.clone();
            let peers = peers.clone();
            std::thread::spawn(move || producer(hub, n, peers))
        })
        .collect();

    // (D) 壊れた payload と存在しない宛先も投入（報告されるだけ）
    let garbage = b"{not json".to_vec();
    let hdr = Header::direct(ActorId::new(2), PINGER, garbage.len() as u32);
    hub.submit_async(peers[0], hdr, garbage).await??;
    let payload = WirePayload::new(serde_json::json!("lost")).to_bytes()?;
    let hdr = Header::direct(ActorId::new(2), ActorId::new(404), payload.len() as u32);
    hub.submit_async(peers[0], hdr, payload).await??;

    // dest_actor 0 は launch 前に拒否される
    let zero = Header::direct(ActorId::new(2), ActorId::INVALID, 0);
    let rejected = hub.submit(peers[0], &zero, &[]);
    tracing::info!(?rejected, "zero destination");

    for t in threads {
        let ids = t.join().map_err(|_| "producer thread panicked")??;
        debug_assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    let delivered = tokio::time::timeout(Duration::from_secs(10), consumer).await??;
    let ordered = delivered.windows(2).all(|w| w[0] < w[1]);

    let waiter = hub.clone();
    tokio::task::spawn_blocking(move || waiter.await_workers()).await?;

    let mut pongs = 0;
    while let Ok(msg) = outbound_rx.try_recv() {
        tracing::debug!(to = %msg.to, id = %msg.element.id, "outbound");
        pongs += 1;
    }

    for report in errors.drain() {
        println!("failed: {} from {}: {}", report.message_id, report.origin, report.error);
    }
    println!(
        "delivered {} messages (in order: {ordered}), {pongs} replies, {} proxies",
        delivered.len(),
        proxies.len()
    );
    println!("{}", serde_json::to_string_pretty(&hub.status())?);
    Ok(())
}
