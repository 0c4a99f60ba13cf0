use lavanda_core::config::TrackingConfig;
use lavanda_core::order::Order;
use lavanda_core::state::OrderState;
use lavanda_core::tracking::TrackingRecord;
use lavanda_core::types::{Actor, ClientType, DeliveryType, IncidentCategory, Shift, Worker};
use lavanda_core::TrackError;
use lavanda_service::memory::{MemoryOrderStore, MemoryTrackingStore};
use lavanda_service::notify::MemoryNotifier;
use lavanda_service::store::{watch, TrackingFilter, TrackingStore};
use lavanda_service::{SyncHandle, Synchronizer, TrackingService};
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::StreamExt;

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

struct World {
    orders: Arc<MemoryOrderStore>,
    tracking: Arc<MemoryTrackingStore>,
    notifier: Arc<MemoryNotifier>,
    service: TrackingService,
    sync: SyncHandle,
}

fn world_with_config(config: TrackingConfig) -> World {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let orders = Arc::new(MemoryOrderStore::new());
    let tracking = Arc::new(MemoryTrackingStore::new());
    let notifier = Arc::new(MemoryNotifier::new());
    let service = TrackingService::new(
        orders.clone(),
        tracking.clone(),
        notifier.clone(),
        config,
    );
    let sync = Synchronizer::new(orders.clone(), tracking.clone()).spawn();
    World {
        orders,
        tracking,
        notifier,
        service,
        sync,
    }
}

fn world() -> World {
    world_with_config(TrackingConfig::new("El Cobre"))
}

fn order(id: &str, number: &str, delivery: DeliveryType, code: &str) -> Order {
    Order {
        id: id.to_string(),
        order_number: number.to_string(),
        dispatch_code: code.to_string(),
        voucher_number: "V-1".to_string(),
        customer_name: "Marta Rojas".to_string(),
        phone: "9 1234 5678".to_string(),
        client_type: ClientType::Individual,
        address: (delivery == DeliveryType::Dispatch).then(|| "Av. Balmaceda 120".to_string()),
        received_at: chrono::Utc::now(),
        items: Vec::new(),
        subtotal: 12_000,
        total: 12_000,
        delivery_type: delivery,
        express: false,
        notified: false,
    }
}

async fn wait_for_record(store: &MemoryTrackingStore, id: &str) -> TrackingRecord {
    for _ in 0..200 {
        if let Some(record) = store.get(id).await.unwrap() {
            return record;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("tracking record {id} never appeared");
}

async fn wait_for_gone(store: &MemoryTrackingStore, id: &str) {
    for _ in 0..200 {
        if store.get(id).await.unwrap().is_none() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("tracking record {id} never disappeared");
}

fn operator() -> Actor {
    Actor::new("op-1", "Paula")
}

fn driver() -> Actor {
    Actor::new("drv-1", "Pedro")
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn pickup_order_runs_the_full_pipeline() {
    let w = world();
    w.orders
        .insert(order("o1", "ORD-1001", DeliveryType::Pickup, "A3F9Z"))
        .await;
    let record = wait_for_record(&w.tracking, "o1").await;
    assert_eq!(record.state, OrderState::Pending);

    let op = operator();
    let crew = [Worker::new("w1", "Ana")];
    let expected = [
        OrderState::Washing,
        OrderState::Drying,
        OrderState::Pressing,
        OrderState::Packing,
        OrderState::ReadyForPickup,
        OrderState::Delivered,
    ];
    for want in expected {
        let record = w
            .service
            .advance("o1", &op, Some(Shift::A), &crew)
            .await
            .unwrap();
        assert_eq!(record.state, want);
    }

    let record = w.service.tracking("o1").await.unwrap().unwrap();
    assert!(!record.active);
    assert_eq!(record.history.len(), 7);
    assert!(record.dispatch.is_none());
    // Staffed stages carry the crew; the branch and terminal states do not.
    assert!(record.assignments.contains_key(&OrderState::Packing));
    assert!(!record.assignments.contains_key(&OrderState::ReadyForPickup));

    // Processing-started and ready-for-pickup messages, to the normalized phone.
    let sent = w.notifier.sent();
    assert_eq!(sent.len(), 2);
    assert!(sent.iter().all(|(phone, _)| phone == "+56912345678"));
    assert!(sent[0].1.contains("ORD-1001"));
    assert!(sent[1].1.contains("listo para retiro"));

    w.sync.stop().await;
}

#[tokio::test]
async fn dispatch_order_delivers_with_case_insensitive_code() {
    let w = world();
    w.orders
        .insert(order("o2", "ORD-2002", DeliveryType::Dispatch, "B7K2M"))
        .await;
    wait_for_record(&w.tracking, "o2").await;

    let op = operator();
    for _ in 0..5 {
        w.service.advance("o2", &op, None, &[]).await.unwrap();
    }
    let record = w.service.tracking("o2").await.unwrap().unwrap();
    assert_eq!(record.state, OrderState::ReadyForDispatch);

    let record = w
        .service
        .start_dispatch("o2", &driver(), "van", "XX-1234")
        .await
        .unwrap();
    assert_eq!(record.state, OrderState::Dispatching);

    let record = w
        .service
        .confirm_delivery("o2", "b7k2m", "Marta", &driver())
        .await
        .unwrap();
    assert_eq!(record.state, OrderState::Delivered);
    assert!(!record.active);
    let dispatch = record.dispatch.as_ref().unwrap();
    assert!(dispatch.code_verified);
    assert_eq!(dispatch.receiver.as_deref(), Some("Marta"));

    // Processing-started and dispatch-started; no pickup message on this branch.
    let sent = w.notifier.sent();
    assert_eq!(sent.len(), 2);
    assert!(sent[1].1.contains("Pedro"));
    assert!(sent[1].1.contains("XX-1234"));

    w.sync.stop().await;
}

#[tokio::test]
async fn wrong_code_changes_nothing() {
    let w = world();
    w.orders
        .insert(order("o3", "ORD-3003", DeliveryType::Dispatch, "B7K2M"))
        .await;
    wait_for_record(&w.tracking, "o3").await;

    let op = operator();
    for _ in 0..5 {
        w.service.advance("o3", &op, None, &[]).await.unwrap();
    }
    w.service
        .start_dispatch("o3", &driver(), "van", "XX-1234")
        .await
        .unwrap();

    let before = w.service.tracking("o3").await.unwrap().unwrap();
    let err = w
        .service
        .confirm_delivery("o3", "WRONG", "Marta", &driver())
        .await
        .unwrap_err();
    assert!(matches!(err, TrackError::CodeMismatch));
    let after = w.service.tracking("o3").await.unwrap().unwrap();
    assert_eq!(after, before);

    w.sync.stop().await;
}

#[tokio::test]
async fn reverse_round_trips_an_advance() {
    let w = world();
    w.orders
        .insert(order("o4", "ORD-4004", DeliveryType::Pickup, "A3F9Z"))
        .await;
    wait_for_record(&w.tracking, "o4").await;

    let op = operator();
    let advanced = w.service.advance("o4", &op, None, &[]).await.unwrap();
    assert_eq!(advanced.state, OrderState::Washing);

    let reversed = w.service.reverse("o4", &op).await.unwrap();
    assert_eq!(reversed.state, OrderState::Pending);
    assert_eq!(reversed.history.len(), 3);

    w.sync.stop().await;
}

#[tokio::test]
async fn rework_loops_back_through_washing() {
    let w = world();
    w.orders
        .insert(order("o5", "ORD-5005", DeliveryType::Pickup, "A3F9Z"))
        .await;
    wait_for_record(&w.tracking, "o5").await;

    let op = operator();
    for _ in 0..3 {
        w.service.advance("o5", &op, None, &[]).await.unwrap();
    }
    let record = w.service.activate_rework("o5", &op).await.unwrap();
    assert_eq!(record.state, OrderState::Rework);
    assert_eq!(record.rework.times, 1);

    let record = w.service.advance("o5", &op, None, &[]).await.unwrap();
    assert_eq!(record.state, OrderState::Washing);

    w.sync.stop().await;
}

#[tokio::test]
async fn incident_in_drying_leaves_state_alone() {
    let w = world();
    w.orders
        .insert(order("o6", "ORD-6006", DeliveryType::Pickup, "A3F9Z"))
        .await;
    wait_for_record(&w.tracking, "o6").await;

    let op = operator();
    w.service.advance("o6", &op, None, &[]).await.unwrap();
    w.service.advance("o6", &op, None, &[]).await.unwrap();

    let incident_id = w
        .service
        .report_incident("o6", &op, IncidentCategory::PersistentStain, "ink stain")
        .await
        .unwrap();
    let record = w.service.tracking("o6").await.unwrap().unwrap();
    assert_eq!(record.state, OrderState::Drying);
    assert_eq!(record.incidents.len(), 1);

    assert!(w.service.resolve_incident("o6", &incident_id).await.unwrap());
    assert!(!w.service.resolve_incident("o6", "bogus").await.unwrap());

    let record = w.service.tracking("o6").await.unwrap().unwrap();
    assert_eq!(record.state, OrderState::Drying);
    assert!(record.incidents[0].resolved);

    w.sync.stop().await;
}

#[tokio::test]
async fn order_removal_removes_tracking() {
    let w = world();
    w.orders
        .insert(order("o7", "ORD-7007", DeliveryType::Pickup, "A3F9Z"))
        .await;
    wait_for_record(&w.tracking, "o7").await;

    w.orders.remove("o7").await;
    wait_for_gone(&w.tracking, "o7").await;

    w.sync.stop().await;
}

#[tokio::test]
async fn order_update_refreshes_number_mirror() {
    let w = world();
    let mut source = order("o8", "ORD-8008", DeliveryType::Pickup, "A3F9Z");
    w.orders.insert(source.clone()).await;
    wait_for_record(&w.tracking, "o8").await;

    source.order_number = "ORD-8009".to_string();
    w.orders.update(source).await;
    for _ in 0..200 {
        let record = w.tracking.get("o8").await.unwrap().unwrap();
        if record.order_number == "ORD-8009" {
            assert_eq!(record.state, OrderState::Pending);
            assert_eq!(record.history.len(), 1);
            w.sync.stop().await;
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("order-number mirror never refreshed");
}

#[tokio::test]
async fn customer_lookup_joins_order_and_tracking() {
    let w = world();
    w.orders
        .insert(order("o9", "ORD-9009", DeliveryType::Pickup, "A3F9Z"))
        .await;
    wait_for_record(&w.tracking, "o9").await;

    let (found_order, record) = w
        .service
        .order_with_tracking("ORD-9009")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found_order.id, "o9");
    assert_eq!(record.id, "o9");

    assert!(w
        .service
        .order_with_tracking("ORD-0000")
        .await
        .unwrap()
        .is_none());

    w.sync.stop().await;
}

#[tokio::test]
async fn live_query_tracks_the_active_board() {
    let w = world();
    let mut stream = watch(
        w.tracking.clone() as Arc<dyn TrackingStore>,
        TrackingFilter::active_orders(),
    );

    // Initial snapshot arrives before any order exists.
    let snapshot = stream.next().await.unwrap();
    assert!(snapshot.is_empty());

    w.orders
        .insert(order("o10", "ORD-1010", DeliveryType::Pickup, "A3F9Z"))
        .await;
    let snapshot = tokio::time::timeout(Duration::from_secs(2), stream.next())
        .await
        .expect("no snapshot after insert")
        .unwrap();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].state, OrderState::Pending);

    // Drive to delivered; the record eventually drops off the active board.
    let op = operator();
    for _ in 0..6 {
        w.service.advance("o10", &op, None, &[]).await.unwrap();
    }
    let mut last = snapshot;
    while !last.is_empty() {
        last = tokio::time::timeout(Duration::from_secs(2), stream.next())
            .await
            .expect("board never emptied")
            .unwrap();
    }

    w.sync.stop().await;
}

#[tokio::test]
async fn notifications_can_be_switched_off() {
    let mut config = TrackingConfig::new("El Cobre");
    config.notifications.enabled = false;
    let w = world_with_config(config);

    w.orders
        .insert(order("o11", "ORD-1111", DeliveryType::Pickup, "A3F9Z"))
        .await;
    wait_for_record(&w.tracking, "o11").await;

    let op = operator();
    w.service.advance("o11", &op, None, &[]).await.unwrap();
    assert!(w.notifier.sent().is_empty());

    w.sync.stop().await;
}

#[tokio::test]
async fn stopped_synchronizer_processes_nothing() {
    let w = world();
    w.sync.stop().await;

    w.orders
        .insert(order("o12", "ORD-1212", DeliveryType::Pickup, "A3F9Z"))
        .await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(w.tracking.get("o12").await.unwrap().is_none());
}

#[tokio::test]
async fn operations_on_missing_records_fail_not_found() {
    let w = world();
    let err = w
        .service
        .advance("ghost", &operator(), None, &[])
        .await
        .unwrap_err();
    assert!(matches!(err, TrackError::TrackingNotFound(_)));

    w.sync.stop().await;
}
