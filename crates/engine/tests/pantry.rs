use engine::{Engine, EngineError, Ingredient, MemoryStore};
use rust_decimal::Decimal;

fn engine() -> Engine<MemoryStore> {
    Engine::new(MemoryStore::new())
}

async fn rice(engine: &Engine<MemoryStore>) -> Ingredient {
    engine
        .register_ingredient("alice", "Arroz", "Cereales", "g", false)
        .await
        .unwrap()
}

#[tokio::test]
async fn first_purchase_creates_entry_with_catalog_fields() {
    let engine = engine();
    let rice = rice(&engine).await;

    let entry = engine
        .add_to_pantry("alice", rice.id, Decimal::from(500))
        .await
        .unwrap();

    assert_eq!(entry.ingredient_id, rice.id);
    assert_eq!(entry.name, "Arroz");
    assert_eq!(entry.category, "Cereales");
    assert_eq!(entry.unit, "g");
    assert_eq!(entry.quantity, Decimal::from(500));

    let pantry = engine.pantry("alice").await.unwrap();
    assert_eq!(pantry.len(), 1);
}

#[tokio::test]
async fn aggregation_is_commutative() {
    let a = Decimal::from(120);
    let b = Decimal::from(380);

    let first = engine();
    let rice_first = rice(&first).await;
    first.add_to_pantry("alice", rice_first.id, a).await.unwrap();
    first.add_to_pantry("alice", rice_first.id, b).await.unwrap();

    let second = engine();
    let rice_second = rice(&second).await;
    second.add_to_pantry("alice", rice_second.id, b).await.unwrap();
    second.add_to_pantry("alice", rice_second.id, a).await.unwrap();

    let quantity = |pantry: Vec<engine::PantryEntry>| pantry[0].quantity;
    assert_eq!(
        quantity(first.pantry("alice").await.unwrap()),
        quantity(second.pantry("alice").await.unwrap())
    );
    // a single aggregated entry in both orders, not two rows
    assert_eq!(first.pantry("alice").await.unwrap().len(), 1);
}

#[tokio::test]
async fn non_positive_deltas_are_rejected() {
    let engine = engine();
    let rice = rice(&engine).await;

    for bad in [Decimal::ZERO, Decimal::from(-5)] {
        let err = engine.add_to_pantry("alice", rice.id, bad).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidQuantity(_)));
        let err = engine.deplete_pantry("alice", rice.id, bad).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidQuantity(_)));
    }
}

#[tokio::test]
async fn deplete_keeps_positive_remainder() {
    let engine = engine();
    let rice = rice(&engine).await;
    engine
        .add_to_pantry("alice", rice.id, Decimal::from(500))
        .await
        .unwrap();

    engine
        .deplete_pantry("alice", rice.id, Decimal::from(200))
        .await
        .unwrap();

    let pantry = engine.pantry("alice").await.unwrap();
    assert_eq!(pantry[0].quantity, Decimal::from(300));
}

#[tokio::test]
async fn deplete_to_zero_deletes_the_entry() {
    let engine = engine();
    let rice = rice(&engine).await;
    engine
        .add_to_pantry("alice", rice.id, Decimal::from(500))
        .await
        .unwrap();

    engine
        .deplete_pantry("alice", rice.id, Decimal::from(500))
        .await
        .unwrap();

    // no entry kept at zero
    assert!(engine.pantry("alice").await.unwrap().is_empty());
}

#[tokio::test]
async fn deplete_past_zero_floors_and_deletes() {
    let engine = engine();
    let rice = rice(&engine).await;
    engine
        .add_to_pantry("alice", rice.id, Decimal::from(100))
        .await
        .unwrap();

    engine
        .deplete_pantry("alice", rice.id, Decimal::from(2_000))
        .await
        .unwrap();
    assert!(engine.pantry("alice").await.unwrap().is_empty());

    // depleting a missing entry is a no-op, not an error
    engine
        .deplete_pantry("alice", rice.id, Decimal::from(50))
        .await
        .unwrap();
}

#[tokio::test]
async fn manual_update_overwrites_and_zero_deletes() {
    let engine = engine();
    let rice = rice(&engine).await;
    let mut entry = engine
        .add_to_pantry("alice", rice.id, Decimal::from(500))
        .await
        .unwrap();

    entry.quantity = Decimal::from(750);
    entry.unit = "kg".to_string();
    engine.update_pantry_entry("alice", entry.clone()).await.unwrap();

    let pantry = engine.pantry("alice").await.unwrap();
    assert_eq!(pantry[0].quantity, Decimal::from(750));
    assert_eq!(pantry[0].unit, "kg");

    entry.quantity = Decimal::ZERO;
    engine.update_pantry_entry("alice", entry.clone()).await.unwrap();
    assert!(engine.pantry("alice").await.unwrap().is_empty());

    entry.quantity = Decimal::from(-1);
    let err = engine.update_pantry_entry("alice", entry).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidQuantity(_)));
}

#[tokio::test]
async fn delete_entry_by_id() {
    let engine = engine();
    let rice = rice(&engine).await;
    let entry = engine
        .add_to_pantry("alice", rice.id, Decimal::from(500))
        .await
        .unwrap();

    engine.delete_pantry_entry("alice", entry.id).await.unwrap();
    assert!(engine.pantry("alice").await.unwrap().is_empty());

    let err = engine
        .delete_pantry_entry("alice", entry.id)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
}

#[tokio::test]
async fn pantry_is_sorted_by_name() {
    let engine = engine();
    let tomato = engine
        .register_ingredient("alice", "Tomate", "Verduras", "g", false)
        .await
        .unwrap();
    let rice = rice(&engine).await;

    engine
        .add_to_pantry("alice", tomato.id, Decimal::from(3))
        .await
        .unwrap();
    engine
        .add_to_pantry("alice", rice.id, Decimal::from(500))
        .await
        .unwrap();

    let names: Vec<String> = engine
        .pantry("alice")
        .await
        .unwrap()
        .into_iter()
        .map(|entry| entry.name)
        .collect();
    assert_eq!(names, vec!["Arroz", "Tomate"]);
}
