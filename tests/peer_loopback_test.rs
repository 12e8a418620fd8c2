use std::time::Duration;

use tokio::net::TcpStream;
use tokio::sync::oneshot;

use versus_tetris::core::pacing::PacingCurve;
use versus_tetris::core::playfield::Playfield;
use versus_tetris::core::setup::MatchSetup;
use versus_tetris::sync::peer::{accept_peer, connect_peer, PeerEvent, PeerLink};
use versus_tetris::sync::protocol::SyncMessage;
use versus_tetris::sync::session::{MatchOutcome, MatchSession};
use versus_tetris::types::{ActionSet, KeyAction, RotationSystem};

async fn linked_streams() -> (TcpStream, TcpStream) {
    let (ready_tx, ready_rx) = oneshot::channel();
    let host = tokio::spawn(async move {
        accept_peer("127.0.0.1:0".parse().unwrap(), Some(ready_tx)).await
    });

    let addr = tokio::time::timeout(Duration::from_secs(2), ready_rx)
        .await
        .expect("host did not signal ready")
        .expect("ready channel dropped");
    let joined = connect_peer(addr).await.expect("connect failed");
    let hosted = tokio::time::timeout(Duration::from_secs(2), host)
        .await
        .unwrap()
        .unwrap()
        .expect("accept failed");
    (hosted, joined)
}

fn local_field(system: RotationSystem, seed: u64) -> Playfield {
    MatchSetup::new()
        .rotation_system(system)
        .seed(seed)
        .build()
        .unwrap()
}

fn settled_mirror(session: &MatchSession) -> Playfield {
    let mut mirror = session
        .remote()
        .expect("handshake never completed")
        .clone();
    mirror.settle();
    mirror
}

#[tokio::test]
async fn peer_links_deliver_messages_in_order() {
    let (hosted, joined) = linked_streams().await;
    let host = PeerLink::spawn(hosted, None);
    let mut join = PeerLink::spawn(joined, None);

    let outbox = host.outbox();
    outbox.push(SyncMessage::Attack(1));
    outbox.push(SyncMessage::Garbage(vec![3, 3, 3]));
    outbox.push(SyncMessage::Bye);

    let mut received = Vec::new();
    while received.len() < 3 {
        let event = tokio::time::timeout(Duration::from_secs(2), join.recv())
            .await
            .expect("timed out waiting for peer")
            .expect("link closed");
        received.push(event);
    }
    assert_eq!(
        received,
        vec![
            PeerEvent::Message(SyncMessage::Attack(1)),
            PeerEvent::Message(SyncMessage::Garbage(vec![3, 3, 3])),
            PeerEvent::Message(SyncMessage::Bye),
        ]
    );

    host.shutdown();
    let closed = tokio::time::timeout(Duration::from_secs(2), join.recv())
        .await
        .expect("timed out waiting for close");
    assert_eq!(closed, Some(PeerEvent::Closed));
    join.shutdown();
}

#[tokio::test]
async fn sessions_play_over_loopback() {
    let (hosted, joined) = linked_streams().await;
    let mut host_link = PeerLink::spawn(hosted, None);
    let mut join_link = PeerLink::spawn(joined, None);

    let mut host = MatchSession::new(
        local_field(RotationSystem::Modern, 1),
        PacingCurve::default(),
        host_link.outbox(),
        true,
        0,
    );
    let mut join = MatchSession::new(
        local_field(RotationSystem::Classic, 2),
        PacingCurve::default(),
        join_link.outbox(),
        false,
        0,
    );
    host.begin();
    join.begin();

    let hard_drop = ActionSet::from_actions(&[KeyAction::HardDrop]);
    for tick in 0..400u32 {
        let input = if tick % 20 == 10 {
            hard_drop
        } else {
            ActionSet::empty()
        };
        host.step(host_link.drain(), input);
        join.step(join_link.drain(), ActionSet::empty());
        if host.local().pieces_locked() >= 3
            && join.remote().map_or(0, |r| r.pieces_locked()) >= 3
        {
            break;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }

    assert_eq!(host.remote_system(), Some(RotationSystem::Classic));
    assert_eq!(join.remote_system(), Some(RotationSystem::Modern));

    // Let the mirror catch up with everything the host has sent.
    let mut settled_host = host.local().clone();
    settled_host.settle();
    for _ in 0..200 {
        if settled_mirror(&join).pieces_locked() == settled_host.pieces_locked() {
            break;
        }
        join.step(join_link.drain(), ActionSet::empty());
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    let mirror = settled_mirror(&join);
    assert!(mirror.pieces_locked() >= 3);
    assert_eq!(mirror.pieces_locked(), settled_host.pieces_locked());
    assert_eq!(mirror.board(), settled_host.board());

    host.forfeit();
    let mut outcome = None;
    for _ in 0..200 {
        outcome = join.step(join_link.drain(), ActionSet::empty());
        if outcome.is_some() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(outcome, Some(MatchOutcome::OpponentForfeit));

    host_link.shutdown();
    join_link.shutdown();
}
