// src/services/list_controller_tests.rs
//
// LIST CONTROLLER TESTS
//
// PURPOSE:
// - Prove the composed pipeline: fetch -> normalize -> filter/sort -> page
// - Prove out-of-order responses never overwrite a newer snapshot
// - Prove mutations refresh (or patch) the list exactly once and that a
//   failed mutation leaves the snapshot untouched
// - Prove nothing is applied after detach
//
// Timing-sensitive tests run on a paused tokio clock.

#[cfg(test)]
mod controller_tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::{json, Value};
    use tokio::sync::oneshot;

    use crate::config::PaginationMode;
    use crate::domain::{MutationIntent, ResourceKind, ResourceProfile, SortDirection};
    use crate::error::{AppError, AppResult};
    use crate::events::EventBus;
    use crate::integrations::LogNotifier;
    use crate::repositories::{
        EnvelopeStyle, InMemoryGateway, ListParams, MockResourceGateway, ResourceGateway,
    };
    use crate::services::list_controller::{
        ControllerOptions, RefreshOutcome, ResourceListController,
    };

    const SETTLE: Duration = Duration::from_millis(400);

    // ========================================================================
    // FIXTURES
    // ========================================================================

    fn options(mode: PaginationMode) -> ControllerOptions {
        ControllerOptions {
            page_size: 10,
            settle_interval: SETTLE,
            pagination_mode: mode,
        }
    }

    fn controller_with(
        kind: ResourceKind,
        gateway: Arc<dyn ResourceGateway>,
        mode: PaginationMode,
    ) -> (ResourceListController, Arc<EventBus>) {
        let bus = Arc::new(EventBus::new());
        let controller = ResourceListController::new(
            ResourceProfile::for_kind(kind),
            gateway,
            Arc::new(LogNotifier),
            Arc::clone(&bus),
            options(mode),
        )
        .unwrap();
        (controller, bus)
    }

    fn seeded(kind: ResourceKind, records: Vec<Value>) -> Arc<InMemoryGateway> {
        let gateway = Arc::new(InMemoryGateway::new(EnvelopeStyle::Keyed));
        gateway.seed(kind, records);
        gateway
    }

    fn tests_catalog(n: usize) -> Vec<Value> {
        (1..=n)
            .map(|i| {
                let subject = if i % 2 == 0 { "Physics" } else { "Math" };
                json!({ "_id": format!("t{i}"), "title": format!("{subject} mock {i}"), "subject": subject })
            })
            .collect()
    }

    fn ids(controller: &ResourceListController) -> Vec<String> {
        controller
            .page_view()
            .items
            .iter()
            .filter_map(|r| r.id().map(str::to_string))
            .collect()
    }

    /// Gateway whose list calls stay pending until the test answers them
    #[derive(Default)]
    struct ScriptedGateway {
        pending: Mutex<Vec<Option<oneshot::Sender<AppResult<Value>>>>>,
        deletes: AtomicUsize,
    }

    impl ScriptedGateway {
        fn issued(&self) -> usize {
            self.pending.lock().unwrap().len()
        }

        fn respond(&self, index: usize, result: AppResult<Value>) {
            let sender = self.pending.lock().unwrap()[index].take().unwrap();
            sender.send(result).ok();
        }

        async fn wait_for(&self, count: usize) {
            while self.issued() < count {
                tokio::task::yield_now().await;
            }
        }
    }

    #[async_trait]
    impl ResourceGateway for ScriptedGateway {
        async fn list(&self, _: &ResourceProfile, _: &ListParams) -> AppResult<Value> {
            let (tx, rx) = oneshot::channel();
            self.pending.lock().unwrap().push(Some(tx));
            rx.await
                .unwrap_or_else(|_| Err(AppError::Transport("dropped".to_string())))
        }

        async fn get_by_id(&self, _: &ResourceProfile, _: &str) -> AppResult<Value> {
            Err(AppError::NotFound)
        }

        async fn create(&self, _: &ResourceProfile, _: &Value) -> AppResult<Value> {
            Err(AppError::Other("not scripted".to_string()))
        }

        async fn update(&self, _: &ResourceProfile, _: &str, _: &Value) -> AppResult<Value> {
            Err(AppError::Other("not scripted".to_string()))
        }

        async fn delete(&self, _: &ResourceProfile, _: &str) -> AppResult<()> {
            self.deletes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn bulk_assign(&self, _: &ResourceProfile, _: &[String], _: &str) -> AppResult<Value> {
            Err(AppError::Other("not scripted".to_string()))
        }
    }

    fn spawn_refresh(
        controller: &ResourceListController,
    ) -> tokio::task::JoinHandle<AppResult<RefreshOutcome>> {
        let controller = controller.clone();
        tokio::spawn(async move { controller.refresh().await })
    }

    // ========================================================================
    // FETCH + NORMALIZE + PAGE
    // ========================================================================

    #[tokio::test]
    async fn test_refresh_pages_the_normalized_list() {
        let gateway = seeded(ResourceKind::Course, {
            (1..=25)
                .map(|i| json!({ "_id": format!("c{i}"), "title": format!("Course {i}") }))
                .collect()
        });
        let (controller, bus) = controller_with(ResourceKind::Course, gateway, PaginationMode::Client);

        let outcome = controller.refresh().await.unwrap();
        assert!(matches!(outcome, RefreshOutcome::Applied { item_count: 25, .. }));

        let view = controller.page_view();
        assert_eq!(view.items.len(), 10);
        assert_eq!(view.total_items, 25);
        assert_eq!(view.total_pages, 3);
        assert_eq!(view.display_range, (1, 10));
        assert!(!view.loading);
        assert_eq!(bus.emitted("CollectionRefreshed"), 1);
    }

    #[tokio::test]
    async fn test_every_envelope_style_renders_the_same_page() {
        let mut pages = Vec::new();
        for style in [EnvelopeStyle::Bare, EnvelopeStyle::Keyed, EnvelopeStyle::Nested] {
            let gateway = Arc::new(InMemoryGateway::new(style));
            gateway.seed(ResourceKind::Course, vec![
                json!({ "_id": "c1", "title": "Algebra" }),
                json!({ "_id": "c2", "title": "Optics" }),
            ]);
            let (controller, _) =
                controller_with(ResourceKind::Course, gateway, PaginationMode::Client);
            controller.refresh().await.unwrap();
            pages.push(ids(&controller));
        }

        assert_eq!(pages[0], vec!["c1", "c2"]);
        assert!(pages.iter().all(|p| p == &pages[0]));
    }

    #[tokio::test]
    async fn test_malformed_and_duplicate_rows_are_dropped() {
        let gateway = seeded(ResourceKind::Course, vec![
            json!({ "_id": "c1", "title": "First" }),
            json!({ "title": "no id" }),
            json!("junk"),
            json!({ "_id": "c1", "title": "Duplicate" }),
        ]);
        let (controller, _) = controller_with(ResourceKind::Course, gateway, PaginationMode::Client);
        controller.refresh().await.unwrap();

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(
            snapshot.get("c1").and_then(|r| r.field_text("title")),
            Some("First".to_string())
        );
    }

    #[tokio::test]
    async fn test_page_is_clamped_when_the_list_shrinks() {
        let gateway = seeded(ResourceKind::Course, {
            (1..=25).map(|i| json!({ "_id": format!("c{i}") })).collect()
        });
        let (controller, bus) = controller_with(
            ResourceKind::Course,
            Arc::clone(&gateway) as Arc<dyn ResourceGateway>,
            PaginationMode::Client,
        );
        controller.refresh().await.unwrap();
        controller.set_page(3).await.unwrap();
        assert_eq!(controller.page_view().items.len(), 5);

        gateway.seed(
            ResourceKind::Course,
            (1..=12).map(|i| json!({ "_id": format!("c{i}") })).collect(),
        );
        controller.refresh().await.unwrap();

        let view = controller.page_view();
        assert_eq!(view.current_page, 2);
        assert_eq!(view.total_pages, 2);
        assert_eq!(view.items.len(), 2);
        assert_eq!(view.display_range, (11, 12));
        assert_eq!(bus.emitted("PageClamped"), 1);
    }

    #[tokio::test]
    async fn test_set_page_beyond_the_end_lands_on_the_last_page() {
        let gateway = seeded(ResourceKind::Test, tests_catalog(25));
        let (controller, _) = controller_with(ResourceKind::Test, gateway, PaginationMode::Client);
        controller.refresh().await.unwrap();

        controller.set_page(9).await.unwrap();
        assert_eq!(controller.page_view().current_page, 3);

        controller.set_page(0).await.unwrap();
        assert_eq!(controller.page_view().current_page, 1);
    }

    // ========================================================================
    // QUERY
    // ========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_search_applies_only_after_settling() {
        let gateway = seeded(ResourceKind::Test, tests_catalog(20));
        let (controller, _) = controller_with(ResourceKind::Test, gateway, PaginationMode::Client);
        controller.refresh().await.unwrap();
        controller.set_page(2).await.unwrap();

        for text in ["p", "ph", "phy", "physics"] {
            controller.set_search_text(text);
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        let typing = controller.page_view();
        assert_eq!(typing.query.raw_text, "physics");
        assert_eq!(typing.query.debounced_text, "");
        assert_eq!(typing.total_items, 20);

        tokio::time::sleep(SETTLE + Duration::from_millis(10)).await;

        let settled = controller.page_view();
        assert_eq!(settled.query.debounced_text, "physics");
        assert_eq!(settled.total_items, 10);
        assert_eq!(settled.current_page, 1);
        assert!(settled
            .items
            .iter()
            .all(|r| r.field_text("subject").as_deref() == Some("Physics")));
    }

    #[tokio::test]
    async fn test_facet_and_text_combine() {
        let gateway = seeded(ResourceKind::Test, vec![
            json!({ "_id": "1", "title": "Physics Ch1", "subject": "Physics" }),
            json!({ "_id": "2", "title": "Math Ch1", "subject": "Math" }),
            json!({ "_id": "3", "title": "Physics Ch2", "subject": "Physics" }),
        ]);
        let (controller, _) = controller_with(ResourceKind::Test, gateway, PaginationMode::Client);
        controller.refresh().await.unwrap();

        controller.search_now("ch1").await.unwrap();
        assert_eq!(controller.filtered().len(), 2);

        controller.set_facet("subject", "Physics").await.unwrap();
        let visible: Vec<_> = controller
            .filtered()
            .iter()
            .filter_map(|r| r.id().map(str::to_string))
            .collect();
        assert_eq!(visible, vec!["1"]);

        controller.set_facet("subject", "all").await.unwrap();
        assert_eq!(controller.filtered().len(), 2);

        controller.clear_filters().await.unwrap();
        assert_eq!(controller.filtered().len(), 3);
    }

    #[tokio::test]
    async fn test_toggle_sort_flips_direction() {
        let gateway = seeded(ResourceKind::Course, vec![
            json!({ "_id": "a", "price": 300 }),
            json!({ "_id": "b", "price": 100 }),
            json!({ "_id": "c", "price": 200 }),
        ]);
        let (controller, _) = controller_with(ResourceKind::Course, gateway, PaginationMode::Client);
        controller.refresh().await.unwrap();

        controller.toggle_sort("price").await.unwrap();
        assert_eq!(ids(&controller), vec!["b", "c", "a"]);
        assert_eq!(controller.page_view().query.sort_direction, SortDirection::Asc);

        controller.toggle_sort("price").await.unwrap();
        assert_eq!(ids(&controller), vec!["a", "c", "b"]);
    }

    // ========================================================================
    // STALE RESPONSES
    // ========================================================================

    #[tokio::test]
    async fn test_older_response_arriving_last_is_discarded() {
        let gateway = Arc::new(ScriptedGateway::default());
        let (controller, bus) = controller_with(
            ResourceKind::Course,
            Arc::clone(&gateway) as Arc<dyn ResourceGateway>,
            PaginationMode::Client,
        );

        let first = spawn_refresh(&controller);
        gateway.wait_for(1).await;
        let second = spawn_refresh(&controller);
        gateway.wait_for(2).await;

        gateway.respond(1, Ok(json!({ "courses": [{ "_id": "new" }] })));
        let applied = second.await.unwrap().unwrap();
        assert!(matches!(applied, RefreshOutcome::Applied { item_count: 1, .. }));

        gateway.respond(0, Ok(json!({ "courses": [{ "_id": "old1" }, { "_id": "old2" }] })));
        let discarded = first.await.unwrap().unwrap();
        assert!(matches!(discarded, RefreshOutcome::Discarded { .. }));

        assert_eq!(controller.snapshot().ids(), vec!["new".to_string()]);
        assert_eq!(bus.emitted("StaleResponseDiscarded"), 1);
    }

    #[tokio::test]
    async fn test_stale_failure_does_not_raise_the_banner() {
        let gateway = Arc::new(ScriptedGateway::default());
        let (controller, _) = controller_with(
            ResourceKind::Course,
            Arc::clone(&gateway) as Arc<dyn ResourceGateway>,
            PaginationMode::Client,
        );

        let first = spawn_refresh(&controller);
        gateway.wait_for(1).await;
        let second = spawn_refresh(&controller);
        gateway.wait_for(2).await;

        gateway.respond(1, Ok(json!([{ "_id": "c1" }])));
        second.await.unwrap().unwrap();
        gateway.respond(0, Err(AppError::Transport("timeout".to_string())));
        assert!(matches!(
            first.await.unwrap(),
            Ok(RefreshOutcome::Discarded { .. })
        ));

        assert!(controller.page_view().error.is_none());
    }

    #[tokio::test]
    async fn test_local_delete_outranks_an_in_flight_fetch() {
        let gateway = Arc::new(ScriptedGateway::default());
        let (controller, _) = controller_with(
            ResourceKind::Course,
            Arc::clone(&gateway) as Arc<dyn ResourceGateway>,
            PaginationMode::Client,
        );

        let initial = spawn_refresh(&controller);
        gateway.wait_for(1).await;
        gateway.respond(0, Ok(json!([{ "_id": "a" }, { "_id": "b" }])));
        initial.await.unwrap().unwrap();

        let in_flight = spawn_refresh(&controller);
        gateway.wait_for(2).await;

        let mut intent = MutationIntent::delete("a");
        controller.delete(&mut intent).await.unwrap();

        gateway.respond(1, Ok(json!([{ "_id": "a" }, { "_id": "b" }])));
        assert!(matches!(
            in_flight.await.unwrap(),
            Ok(RefreshOutcome::Discarded { .. })
        ));
        assert_eq!(controller.snapshot().ids(), vec!["b".to_string()]);
        assert_eq!(gateway.deletes.load(Ordering::SeqCst), 1);
    }

    // ========================================================================
    // LOAD ERRORS
    // ========================================================================

    #[tokio::test]
    async fn test_failed_fetch_keeps_snapshot_and_retry_clears_banner() {
        let gateway = seeded(ResourceKind::Course, vec![json!({ "_id": "c1" })]);
        let (controller, bus) = controller_with(
            ResourceKind::Course,
            Arc::clone(&gateway) as Arc<dyn ResourceGateway>,
            PaginationMode::Client,
        );
        controller.refresh().await.unwrap();

        gateway.fail_next(AppError::from_response_body(
            Some(500),
            &json!({ "message": "Database unavailable" }),
        ));
        assert!(controller.refresh().await.is_err());

        let view = controller.page_view();
        assert_eq!(view.error.as_deref(), Some("Database unavailable"));
        assert_eq!(view.items.len(), 1);
        assert!(!view.loading);
        assert_eq!(bus.emitted("ListFetchFailed"), 1);

        controller.retry().await.unwrap();
        assert!(controller.page_view().error.is_none());
    }

    // ========================================================================
    // MUTATIONS
    // ========================================================================

    #[tokio::test]
    async fn test_created_record_appears_exactly_once() {
        let gateway = seeded(ResourceKind::Test, tests_catalog(3));
        let (controller, _) = controller_with(
            ResourceKind::Test,
            Arc::clone(&gateway) as Arc<dyn ResourceGateway>,
            PaginationMode::Client,
        );
        controller.refresh().await.unwrap();
        let lists_before = gateway.list_calls();

        let mut intent = MutationIntent::create();
        let created = controller
            .create(&mut intent, json!({ "title": "Optics drill", "subject": "Physics" }))
            .await
            .unwrap();
        let new_id = created["_id"].as_str().unwrap().to_string();

        assert_eq!(gateway.list_calls(), lists_before + 1);
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.len(), 4);
        assert_eq!(snapshot.ids().iter().filter(|id| **id == new_id).count(), 1);
        assert!(intent.error.is_none());
        assert!(!intent.is_pending());
    }

    #[tokio::test]
    async fn test_update_is_reflected_after_refetch() {
        let gateway = seeded(ResourceKind::Test, tests_catalog(2));
        let (controller, _) = controller_with(ResourceKind::Test, gateway, PaginationMode::Client);
        controller.refresh().await.unwrap();

        let mut intent = MutationIntent::update("t1");
        controller
            .update(&mut intent, json!({ "title": "Renamed" }))
            .await
            .unwrap();

        let title = controller
            .snapshot()
            .get("t1")
            .and_then(|r| r.field_text("title"));
        assert_eq!(title.as_deref(), Some("Renamed"));
    }

    #[tokio::test]
    async fn test_delete_removes_locally_without_refetch() {
        let gateway = seeded(ResourceKind::Test, tests_catalog(11));
        let (controller, _) = controller_with(
            ResourceKind::Test,
            Arc::clone(&gateway) as Arc<dyn ResourceGateway>,
            PaginationMode::Client,
        );
        controller.refresh().await.unwrap();
        controller.set_page(2).await.unwrap();
        let lists_before = gateway.list_calls();

        let mut intent = MutationIntent::delete("t11");
        controller.delete(&mut intent).await.unwrap();

        assert_eq!(gateway.list_calls(), lists_before);
        assert!(!controller.snapshot().contains("t11"));
        // The only row on page 2 is gone
        assert_eq!(controller.page_view().current_page, 1);
    }

    #[tokio::test]
    async fn test_failed_mutation_leaves_snapshot_unchanged() {
        let gateway = seeded(ResourceKind::Test, tests_catalog(3));
        let (controller, _) = controller_with(
            ResourceKind::Test,
            Arc::clone(&gateway) as Arc<dyn ResourceGateway>,
            PaginationMode::Client,
        );
        controller.refresh().await.unwrap();
        let before = controller.snapshot();

        gateway.fail_next(AppError::from_response_body(
            Some(422),
            &json!({ "message": "Invalid", "errors": [{ "msg": "Title already exists" }] }),
        ));
        let mut intent = MutationIntent::update("t2");
        let result = controller
            .update(&mut intent, json!({ "title": "Math mock 1" }))
            .await;

        assert!(result.is_err());
        assert_eq!(intent.error.as_deref(), Some("Title already exists"));
        assert_eq!(controller.snapshot(), before);

        gateway.fail_next(AppError::Transport("offline".to_string()));
        let mut delete = MutationIntent::delete("t1");
        assert!(controller.delete(&mut delete).await.is_err());
        assert_eq!(controller.snapshot(), before);
    }

    #[tokio::test]
    async fn test_invalid_draft_never_reaches_the_gateway() {
        let mut gateway = MockResourceGateway::new();
        gateway.expect_create().times(0);
        gateway.expect_list().times(0);
        let (controller, _) =
            controller_with(ResourceKind::Student, Arc::new(gateway), PaginationMode::Client);

        let mut missing = MutationIntent::create();
        let err = controller
            .create(&mut missing, json!({ "email": "asha@example.com" }))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(missing.error.as_deref(), Some("name is required"));

        let mut bad_email = MutationIntent::create();
        assert!(controller
            .create(&mut bad_email, json!({ "name": "Asha", "email": "nope" }))
            .await
            .is_err());
        assert!(bad_email.error.is_some());
    }

    #[tokio::test]
    async fn test_intent_of_the_wrong_kind_is_refused() {
        let gateway = seeded(ResourceKind::Test, tests_catalog(1));
        let (controller, _) = controller_with(ResourceKind::Test, gateway, PaginationMode::Client);

        let mut intent = MutationIntent::delete("t1");
        assert!(controller.create(&mut intent, json!({})).await.is_err());
    }

    // ========================================================================
    // SELECTION
    // ========================================================================

    #[tokio::test]
    async fn test_selection_is_pruned_to_the_filtered_view() {
        let gateway = seeded(ResourceKind::Test, tests_catalog(4));
        let (controller, bus) = controller_with(ResourceKind::Test, gateway, PaginationMode::Client);
        controller.refresh().await.unwrap();

        assert!(controller.toggle_selection("t1"));
        assert!(controller.toggle_selection("t2"));
        assert!(!controller.toggle_selection("missing"));

        controller.set_facet("subject", "Physics").await.unwrap();

        assert_eq!(controller.selected_ids(), vec!["t2".to_string()]);
        assert_eq!(bus.emitted("SelectionPruned"), 1);
    }

    #[tokio::test]
    async fn test_bulk_assign_clears_selection_and_refetches() {
        let gateway = seeded(ResourceKind::Student, vec![
            json!({ "_id": "s1", "name": "Asha", "email": "asha@example.com" }),
            json!({ "_id": "s2", "name": "Ravi", "email": "ravi@example.com" }),
            json!({ "_id": "s3", "name": "Meera", "email": "meera@example.com" }),
        ]);
        let (controller, _) = controller_with(
            ResourceKind::Student,
            Arc::clone(&gateway) as Arc<dyn ResourceGateway>,
            PaginationMode::Client,
        );
        controller.refresh().await.unwrap();

        assert!(controller.bulk_assign_intent("c9").is_err());
        controller.toggle_selection("s1");
        controller.toggle_selection("s3");
        let mut intent = controller.bulk_assign_intent("c9").unwrap();
        controller.bulk_assign(&mut intent).await.unwrap();

        assert!(controller.selected_ids().is_empty());
        let assigned: HashMap<String, bool> = controller
            .snapshot()
            .iter()
            .filter_map(|r| {
                let id = r.id()?.to_string();
                let has = r
                    .field("courses")
                    .and_then(Value::as_array)
                    .is_some_and(|c| c.iter().any(|v| v == "c9"));
                Some((id, has))
            })
            .collect();
        assert!(assigned["s1"]);
        assert!(!assigned["s2"]);
        assert!(assigned["s3"]);
    }

    // ========================================================================
    // SERVER PAGINATION
    // ========================================================================

    #[tokio::test]
    async fn test_server_pages_are_not_resliced() {
        let gateway = seeded(ResourceKind::Course, {
            (1..=42).map(|i| json!({ "_id": format!("c{i}") })).collect()
        });
        let (controller, _) = controller_with(
            ResourceKind::Course,
            Arc::clone(&gateway) as Arc<dyn ResourceGateway>,
            PaginationMode::Server,
        );

        controller.refresh().await.unwrap();
        let first = controller.page_view();
        assert_eq!(first.items.len(), 10);
        assert_eq!(first.total_items, 42);
        assert_eq!(first.total_pages, 5);

        controller.set_page(3).await.unwrap();
        assert_eq!(gateway.list_calls(), 2);
        let third = controller.page_view();
        assert_eq!(third.items.len(), 10);
        assert_eq!(third.items[0].id(), Some("c21"));
        assert_eq!(third.display_range, (21, 30));
    }

    #[tokio::test]
    async fn test_server_clamp_fetches_the_clamped_page() {
        let gateway = seeded(ResourceKind::Course, {
            (1..=25).map(|i| json!({ "_id": format!("c{i}") })).collect()
        });
        let (controller, bus) = controller_with(
            ResourceKind::Course,
            Arc::clone(&gateway) as Arc<dyn ResourceGateway>,
            PaginationMode::Server,
        );
        controller.refresh().await.unwrap();
        controller.set_page(3).await.unwrap();
        assert_eq!(controller.page_view().items.len(), 5);

        gateway.seed(
            ResourceKind::Course,
            (1..=12).map(|i| json!({ "_id": format!("c{i}") })).collect(),
        );
        let lists_before = gateway.list_calls();
        controller.refresh().await.unwrap();

        // Page 3 came back empty, so page 2 was requested next
        assert_eq!(gateway.list_calls(), lists_before + 2);
        let view = controller.page_view();
        assert_eq!(view.current_page, 2);
        assert_eq!(view.total_pages, 2);
        assert_eq!(ids(&controller), vec!["c11", "c12"]);
        assert_eq!(view.display_range, (11, 12));
        assert_eq!(bus.emitted("PageClamped"), 1);
    }

    #[tokio::test]
    async fn test_server_delete_of_the_last_row_loads_the_previous_page() {
        let gateway = seeded(ResourceKind::Course, {
            (1..=21).map(|i| json!({ "_id": format!("c{i}") })).collect()
        });
        let (controller, _) = controller_with(
            ResourceKind::Course,
            Arc::clone(&gateway) as Arc<dyn ResourceGateway>,
            PaginationMode::Server,
        );
        controller.refresh().await.unwrap();
        controller.set_page(3).await.unwrap();
        assert_eq!(ids(&controller), vec!["c21"]);

        let mut intent = MutationIntent::delete("c21");
        controller.delete(&mut intent).await.unwrap();

        let view = controller.page_view();
        assert_eq!(view.current_page, 2);
        assert_eq!(view.total_pages, 2);
        assert_eq!(view.total_items, 20);
        assert_eq!(view.items.len(), 10);
        assert_eq!(view.items[0].id(), Some("c11"));
        assert_eq!(view.display_range, (11, 20));
    }

    #[tokio::test]
    async fn test_server_delete_mid_list_refills_the_page() {
        let gateway = seeded(ResourceKind::Course, {
            (1..=42).map(|i| json!({ "_id": format!("c{i}") })).collect()
        });
        let (controller, _) = controller_with(
            ResourceKind::Course,
            Arc::clone(&gateway) as Arc<dyn ResourceGateway>,
            PaginationMode::Server,
        );
        controller.refresh().await.unwrap();
        let lists_before = gateway.list_calls();

        let mut intent = MutationIntent::delete("c4");
        controller.delete(&mut intent).await.unwrap();

        assert_eq!(gateway.list_calls(), lists_before + 1);
        let view = controller.page_view();
        assert_eq!(view.current_page, 1);
        assert_eq!(view.total_items, 41);
        assert_eq!(view.items.len(), 10);
        assert!(!ids(&controller).contains(&"c4".to_string()));
        assert_eq!(view.items[9].id(), Some("c11"));
        assert_eq!(view.display_range, (1, 10));
    }

    // ========================================================================
    // SINGLE RECORD
    // ========================================================================

    #[tokio::test]
    async fn test_fetch_one_unwraps_the_record_or_reports_not_found() {
        let mut gateway = MockResourceGateway::new();
        gateway
            .expect_get_by_id()
            .withf(|_, id| id == "t1")
            .returning(|_, _| {
                Ok(json!({ "success": true, "data": { "test": { "_id": "t1", "title": "Mock" } } }))
            });
        gateway
            .expect_get_by_id()
            .withf(|_, id| id == "t9")
            .returning(|_, _| Ok(json!({ "message": "gone" })));
        let (controller, _) =
            controller_with(ResourceKind::Test, Arc::new(gateway), PaginationMode::Client);

        let record = controller.fetch_one("t1").await.unwrap();
        assert_eq!(record.id(), Some("t1"));
        assert_eq!(record.into_value()["title"], "Mock");

        let missing = controller.fetch_one("t9").await;
        assert!(matches!(missing, Err(AppError::NotFound)));
    }

    // ========================================================================
    // DETACH
    // ========================================================================

    #[tokio::test]
    async fn test_detach_ignores_in_flight_fetch() {
        let gateway = Arc::new(ScriptedGateway::default());
        let (controller, bus) = controller_with(
            ResourceKind::Course,
            Arc::clone(&gateway) as Arc<dyn ResourceGateway>,
            PaginationMode::Client,
        );

        let pending = spawn_refresh(&controller);
        gateway.wait_for(1).await;
        controller.detach();
        controller.detach();

        gateway.respond(0, Ok(json!([{ "_id": "late" }])));
        assert!(matches!(
            pending.await.unwrap(),
            Ok(RefreshOutcome::Discarded { .. })
        ));
        assert!(controller.snapshot().is_empty());
        assert_eq!(bus.emitted("CollectionRefreshed"), 0);
        assert!(matches!(controller.refresh().await, Err(AppError::Detached)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_detach_cancels_pending_search() {
        let gateway = seeded(ResourceKind::Test, tests_catalog(4));
        let (controller, _) = controller_with(ResourceKind::Test, gateway, PaginationMode::Client);
        controller.refresh().await.unwrap();

        controller.set_search_text("physics");
        controller.detach();
        tokio::time::sleep(SETTLE * 2).await;

        assert_eq!(controller.page_view().query.debounced_text, "");
        assert_eq!(controller.filtered().len(), 4);
        assert!(!controller.toggle_selection("t1"));
    }

    #[tokio::test]
    async fn test_clearing_after_detach_changes_nothing() {
        let gateway = seeded(ResourceKind::Test, tests_catalog(4));
        let (controller, _) = controller_with(ResourceKind::Test, gateway, PaginationMode::Client);
        controller.refresh().await.unwrap();
        controller.search_now("physics").await.unwrap();
        assert!(controller.toggle_selection("t2"));

        controller.detach();

        assert!(matches!(controller.clear_filters().await, Err(AppError::Detached)));
        controller.clear_selection();

        let view = controller.page_view();
        assert_eq!(view.query.raw_text, "physics");
        assert_eq!(view.query.debounced_text, "physics");
        assert_eq!(controller.selected_ids(), vec!["t2".to_string()]);
    }
}
