use bottle_orm::{AlterationStep, Database, Model};
use bottle_orm::sync_table;

#[derive(Debug, Clone, Model)]
struct Gadget {
    #[orm(primary_key)]
    id: i32,
    name: String,
}

#[tokio::test]
async fn sync_table_creates_table_then_converges() -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::builder().max_connections(1).connect("sqlite::memory:").await?;

    let plan = sync_table::<Gadget>(&db, false).await?;
    assert_eq!(plan.steps, vec![AlterationStep::CreateTable]);

    let plan_again = sync_table::<Gadget>(&db, false).await?;
    assert!(plan_again.is_empty(), "re-running sync on a converged schema must be a no-op: {plan_again:?}");

    Ok(())
}

#[derive(Debug, Clone, Model)]
struct Widget {
    #[orm(primary_key)]
    id: i32,
    #[orm(size = 50)]
    label: String,
    #[orm(unique)]
    serial: String,
}

#[tokio::test]
async fn sync_table_adds_missing_column_and_index() -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::builder().max_connections(1).connect("sqlite::memory:").await?;

    // Create the table by hand, deliberately missing the `serial` column
    // (and therefore its unique index) that the model declares.
    db.raw("CREATE TABLE widget (id INTEGER PRIMARY KEY, label TEXT NOT NULL)").execute().await?;

    let plan = sync_table::<Widget>(&db, false).await?;
    assert!(plan.steps.contains(&AlterationStep::AddColumn("serial".to_string())));
    assert!(plan.steps.iter().any(|s| matches!(s, AlterationStep::AddIndex(_))));

    // The added column is usable immediately.
    db.raw("INSERT INTO widget (id, label, serial) VALUES (1, 'bolt', 'SN-1')").execute().await?;
    let serial: String = db.raw("SELECT serial FROM widget WHERE id = 1").fetch_scalar().await?;
    assert_eq!(serial, "SN-1");

    let converged = sync_table::<Widget>(&db, false).await?;
    assert!(converged.is_empty(), "adding the column/index should bring the schema to a fixed point: {converged:?}");

    Ok(())
}

#[derive(Debug, Clone, Model)]
struct Archive {
    #[orm(primary_key)]
    id: i32,
    kept: String,
}

#[tokio::test]
async fn sync_table_skips_drop_unless_destructive() -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::builder().max_connections(1).connect("sqlite::memory:").await?;

    db.raw("CREATE TABLE archive (id INTEGER PRIMARY KEY, kept TEXT NOT NULL, legacy TEXT NOT NULL)")
        .execute()
        .await?;

    let plan = sync_table::<Archive>(&db, false).await?;
    assert!(plan.steps.is_empty(), "non-destructive sync must not emit DropColumn: {plan:?}");
    assert_eq!(plan.skipped_drops, vec!["legacy".to_string()]);

    let destructive_plan = sync_table::<Archive>(&db, true).await?;
    assert!(destructive_plan.steps.contains(&AlterationStep::DropColumn("legacy".to_string())));

    Ok(())
}
