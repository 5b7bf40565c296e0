//! Exercises supervisor-owned child teardown ordering: stopping the
//! supervisor must stop every child it still tracks, and the router must
//! reflect that nothing is left registered.

use serde_json::json;
use tokio::time::{timeout, Duration};

use relay_rt::actor;
use relay_rt::message::Message;
use relay_rt::router::Router;
use relay_rt::supervisor::{SupervisorActor, KIND_SERVER_ACTOR};

#[tokio::test]
async fn stopping_supervisor_tears_down_every_live_child_and_itself() {
    let router = Router::new();
    let supervisor = SupervisorActor::new(None, 10);
    let handle = actor::spawn("supervisor", router.clone(), Box::new(supervisor));

    let mut children = Vec::new();
    for _ in 0..5 {
        let (msg, rx) = Message::new("supervisor", "test", Message::create_child_type(KIND_SERVER_ACTOR), json!(null)).with_reply();
        handle.send(msg);
        let reply = timeout(Duration::from_secs(1), rx).await.expect("no timeout").expect("reply sent");
        children.push(reply["name"].as_str().expect("name field").to_string());
    }

    assert_eq!(router.actor_count(), 6, "supervisor plus 5 children");

    handle.stop().await;

    assert!(!router.has_actor("supervisor"));
    for child in &children {
        assert!(!router.has_actor(child), "child '{child}' should be stopped alongside its supervisor");
    }
    assert_eq!(router.actor_count(), 0);
}

#[tokio::test]
async fn stop_child_removes_only_the_named_child_leaving_siblings_running() {
    let router = Router::new();
    let supervisor = SupervisorActor::new(None, 10);
    let handle = actor::spawn("supervisor", router.clone(), Box::new(supervisor));

    let (msg_a, rx_a) = Message::new("supervisor", "test", Message::create_child_type(KIND_SERVER_ACTOR), json!(null)).with_reply();
    handle.send(msg_a);
    let name_a = timeout(Duration::from_secs(1), rx_a).await.expect("no timeout").expect("reply")["name"].as_str().expect("name field").to_string();

    let (msg_b, rx_b) = Message::new("supervisor", "test", Message::create_child_type(KIND_SERVER_ACTOR), json!(null)).with_reply();
    handle.send(msg_b);
    let name_b = timeout(Duration::from_secs(1), rx_b).await.expect("no timeout").expect("reply")["name"].as_str().expect("name field").to_string();

    handle.send(Message::new("supervisor", "test", relay_rt::message::types::STOP_CHILD, json!(name_a.clone())));
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(!router.has_actor(&name_a));
    assert!(router.has_actor(&name_b));

    handle.stop().await;
}
