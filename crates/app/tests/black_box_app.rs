use std::collections::HashMap;
use std::sync::Arc;

use chrono::{TimeZone, Utc};

use stockroom_app::app::dto::{AdjustInput, PartInput, XLSX_CONTENT_TYPE};
use stockroom_app::{ActionOutcome, Application};
use stockroom_auth::{Account, AccountDirectory, Anonymous, NewAccount, Role};
use stockroom_core::{FixedClock, SparePartId};
use stockroom_infra::services::{NewRequest, NewRequestLine};
use stockroom_infra::{InMemoryStore, Settings};
use stockroom_inventory::{PartDetails, PartSearch, TransactionType};
use stockroom_requisition::{RequestFilter, RequestStatus};
use stockroom_stocktake::CountStatus;

struct Fixture {
    app: Application,
    admin: Account,
    manager: Account,
    alice: Account,
    bob: Account,
}

fn fixture() -> Fixture {
    let now = Utc.with_ymd_and_hms(2025, 6, 4, 9, 0, 0).unwrap();
    let directory = Arc::new(AccountDirectory::new());
    let (admin, _) = directory.seed_admin("admin@company.com", now).unwrap();
    let register = |email: &str, name: &str, role: Role| {
        directory
            .register(
                NewAccount {
                    email: email.to_string(),
                    display_name: name.to_string(),
                    team: "Maintenance".to_string(),
                    roles: vec![role],
                },
                now,
            )
            .unwrap()
    };
    let manager = register("mia@company.com", "Mia", Role::Manager);
    let alice = register("alice@company.com", "Alice", Role::User);
    let bob = register("bob@company.com", "Bob", Role::User);

    let app = Application::with_store(
        Arc::new(InMemoryStore::new()),
        Arc::new(FixedClock::new(now)),
        Settings::default(),
        directory,
    );
    Fixture {
        app,
        admin,
        manager,
        alice,
        bob,
    }
}

fn part_input(description: &str, quantity: i64) -> PartInput {
    PartInput {
        details: PartDetails {
            plant: "P1".to_string(),
            position: "Line 1".to_string(),
            category: "Bearings".to_string(),
            description: description.to_string(),
            ..PartDetails::default()
        },
        quantity,
    }
}

fn request_for(part_id: SparePartId, quantity: i64) -> NewRequest {
    NewRequest {
        department: "Maintenance".to_string(),
        remarks: String::new(),
        lines: vec![NewRequestLine {
            part_id,
            quantity,
            remarks: String::new(),
        }],
    }
}

#[tokio::test]
async fn role_policy_guards_part_maintenance() {
    let f = fixture();

    let err = f
        .app
        .create_part(&f.alice, part_input("Bearing", 10))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "forbidden");

    let part = f
        .app
        .create_part(&f.manager, part_input("Bearing", 10))
        .await
        .unwrap();

    let err = f.app.delete_part(&f.manager, part.id_typed()).await.unwrap_err();
    assert_eq!(err.code(), "forbidden");

    // Plain users can still look parts up.
    let page = f.app.search_parts(&f.alice, PartSearch::default()).await.unwrap();
    assert_eq!(page.items.len(), 1);

    f.app.delete_part(&f.admin, part.id_typed()).await.unwrap();
    let err = f.app.part(&f.alice, part.id_typed()).await.unwrap_err();
    assert_eq!(err.code(), "not_found");
}

#[tokio::test]
async fn anonymous_callers_get_an_unauthenticated_outcome() {
    let f = fixture();
    let outcome: ActionOutcome<_> = f.app.dashboard(&Anonymous).await.into();
    assert!(!outcome.success);
    let error = outcome.error.unwrap();
    assert_eq!(error.code, "unauthenticated");
}

#[tokio::test]
async fn requests_are_private_to_their_requester() {
    let f = fixture();
    let part = f
        .app
        .create_part(&f.manager, part_input("Seal", 20))
        .await
        .unwrap();
    let request = f
        .app
        .create_request(&f.alice, request_for(part.id_typed(), 2))
        .await
        .unwrap();

    let err = f.app.request(&f.bob, request.id_typed()).await.unwrap_err();
    assert_eq!(err.code(), "forbidden");

    // An unfiltered listing is narrowed to the caller's own requests.
    let bobs = f
        .app
        .list_requests(&f.bob, RequestFilter::default())
        .await
        .unwrap();
    assert!(bobs.is_empty());
    let alices = f.app.my_requests(&f.alice).await.unwrap();
    assert_eq!(alices.len(), 1);

    let seen = f.app.request(&f.manager, request.id_typed()).await.unwrap();
    assert_eq!(seen.request_no(), "MR20250604001");
    let all = f
        .app
        .list_requests(&f.manager, RequestFilter::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn requisition_runs_from_request_to_issue() {
    let f = fixture();
    let part = f
        .app
        .create_part(&f.manager, part_input("Bearing 6204", 10))
        .await
        .unwrap();
    let request = f
        .app
        .create_request(&f.alice, request_for(part.id_typed(), 6))
        .await
        .unwrap();

    let err = f
        .app
        .approve_request(&f.alice, request.id_typed(), HashMap::new())
        .await
        .unwrap_err();
    assert_eq!(err.code(), "forbidden");

    let line = request.lines()[0].id;
    let approved = f
        .app
        .approve_request(&f.manager, request.id_typed(), HashMap::from([(line, 4)]))
        .await
        .unwrap();
    assert_eq!(approved.status(), RequestStatus::Approved);
    assert!(f.app.pending_requests(&f.manager).await.unwrap().is_empty());

    let issuance = f.app.issue_request(&f.manager, request.id_typed()).await.unwrap();
    assert_eq!(issuance.request.status(), RequestStatus::Issued);
    assert_eq!(issuance.transactions.len(), 1);

    let part = f.app.part(&f.alice, part.id_typed()).await.unwrap();
    assert_eq!(part.quantity(), 6);

    let history = f.app.part_history(&f.alice, part.id_typed()).await.unwrap();
    let issued = &history[0];
    assert_eq!(issued.kind, TransactionType::Adjust);
    assert_eq!(issued.quantity, -4);
    assert_eq!(issued.reference_no.as_deref(), Some("MR20250604001"));
}

#[tokio::test]
async fn short_issue_reports_shortages_and_changes_nothing() {
    let f = fixture();
    let part = f
        .app
        .create_part(&f.manager, part_input("Coupling", 10))
        .await
        .unwrap();
    let request = f
        .app
        .create_request(&f.alice, request_for(part.id_typed(), 10))
        .await
        .unwrap();
    f.app
        .approve_request(&f.manager, request.id_typed(), HashMap::new())
        .await
        .unwrap();
    f.app
        .adjust_part(
            &f.manager,
            part.id_typed(),
            AdjustInput {
                new_quantity: 5,
                reason: "damaged".to_string(),
            },
        )
        .await
        .unwrap();

    let err = f
        .app
        .issue_request(&f.manager, request.id_typed())
        .await
        .unwrap_err();
    assert_eq!(err.code(), "insufficient_stock");
    assert_eq!(err.shortages().len(), 1);
    assert_eq!(err.shortages()[0].available, Some(5));

    let outcome: ActionOutcome<()> = Err(err).into();
    assert_eq!(outcome.error.unwrap().code, "insufficient_stock");

    assert_eq!(f.app.part(&f.manager, part.id_typed()).await.unwrap().quantity(), 5);
    let request = f.app.request(&f.manager, request.id_typed()).await.unwrap();
    assert_eq!(request.status(), RequestStatus::Approved);
}

#[tokio::test]
async fn counts_are_recorded_by_anyone_and_completed_by_supervisors() {
    let f = fixture();
    let part = f
        .app
        .create_part(&f.manager, part_input("Filter", 50))
        .await
        .unwrap();
    let count = f
        .app
        .open_count(&f.manager, &[part.id_typed()], "monthly")
        .await
        .unwrap();
    assert_eq!(count.count_no(), "SC20250604001");

    let detail = count.details()[0].id_typed();
    f.app
        .record_count(&f.alice, detail, 45, Some("two damaged".to_string()))
        .await
        .unwrap();

    let err = f.app.complete_count(&f.alice, count.id_typed()).await.unwrap_err();
    assert_eq!(err.code(), "forbidden");

    let completion = f.app.complete_count(&f.manager, count.id_typed()).await.unwrap();
    assert_eq!(completion.count.status(), CountStatus::Completed);
    assert_eq!(completion.transactions.len(), 1);
    assert_eq!(completion.transactions[0].quantity, -5);
    assert_eq!(f.app.part(&f.alice, part.id_typed()).await.unwrap().quantity(), 45);

    let err = f.app.complete_count(&f.manager, count.id_typed()).await.unwrap_err();
    assert_eq!(err.code(), "invalid_state");
}

#[tokio::test]
async fn exports_render_named_workbooks() {
    let f = fixture();
    let part = f
        .app
        .create_part(&f.manager, part_input("Bearing", 3))
        .await
        .unwrap();
    f.app
        .create_request(&f.alice, request_for(part.id_typed(), 1))
        .await
        .unwrap();

    let file = f.app.export_transactions(&f.alice, None).await.unwrap();
    assert_eq!(file.file_name, "InventoryReport_20250506_20250604.xlsx");
    assert_eq!(file.content_type, XLSX_CONTENT_TYPE);
    assert!(file.bytes.starts_with(b"PK"));

    let file = f.app.export_requests(&f.manager, None).await.unwrap();
    assert_eq!(file.file_name, "MaterialRequestReport_20250506_20250604.xlsx");

    let file = f.app.export_stock_count_report(&f.manager, None).await.unwrap();
    assert!(file.file_name.starts_with("StockCountAnalysis_"));
    assert!(file.bytes.starts_with(b"PK"));

    let dashboard = f.app.dashboard(&f.alice).await.unwrap();
    assert_eq!(dashboard.total_parts, 1);
    assert_eq!(dashboard.low_stock_parts, 1);
    assert_eq!(dashboard.pending_requests, 1);
}

#[tokio::test]
async fn account_management_is_admin_only() {
    let f = fixture();
    assert_eq!(f.app.whoami(&f.alice).unwrap().display_name, "Alice");
    assert_eq!(f.app.whoami(&Anonymous).unwrap_err().code(), "unauthenticated");

    let err = f.app.list_accounts(&f.manager).unwrap_err();
    assert_eq!(err.code(), "forbidden");

    let promoted = f
        .app
        .set_account_roles(&f.admin, f.bob.id, vec![Role::Manager])
        .unwrap();
    assert_eq!(promoted.roles, vec![Role::Manager]);

    // Deactivated accounts lose every permission.
    let alice = f.app.set_account_active(&f.admin, f.alice.id, false).unwrap();
    let err = f
        .app
        .search_parts(&alice, PartSearch::default())
        .await
        .unwrap_err();
    assert_eq!(err.code(), "unauthenticated");

    let err = f
        .app
        .register_account(
            &f.admin,
            NewAccount {
                email: "ALICE@company.com".to_string(),
                display_name: "Alice Again".to_string(),
                team: String::new(),
                roles: vec![Role::User],
            },
        )
        .unwrap_err();
    assert_eq!(err.code(), "conflict");
}
