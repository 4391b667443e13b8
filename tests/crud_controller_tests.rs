//! Tests of the CRUD controller actions against the in-memory backend
//!
//! These tests drive every action through its pipeline: configuration
//! resolution, hooks, validation, persistence, hydration and exception
//! handling.

use std::sync::atomic::{AtomicUsize, Ordering};
use this_admin::prelude::*;

// =============================================================================
// Test Entity and Fixtures
// =============================================================================

impl_admin_entity!(Article, "article", {
    #[validate(length(min = 1, message = "must not be empty"))]
    title: String,
    body: String,
    status: String,
    views: u32,
});

fn hydration() -> HydrationConfig<Article> {
    HydrationConfig::new()
        .group(
            "main",
            HydrationGroup::properties([("id", "id"), ("label", "title")]),
        )
        .group("meta", HydrationGroup::paths(["status", "views"]))
        .profile("default", HydrationProfile::flat(["main", "meta"]))
        .profile("form", HydrationProfile::grouped(["main", "meta"]))
}

fn overrides() -> ConfigOverrides<Article> {
    ConfigOverrides::for_entity().hydration(hydration())
}

fn setup_with(
    overrides: ConfigOverrides<Article>,
) -> (CrudController<Article>, InMemoryPersistenceHandler<Article>) {
    let store = InMemoryPersistenceHandler::<Article>::new();
    let controller =
        CrudController::with_overrides(CrudServices::new(Arc::new(store.clone())), overrides);
    (controller, store)
}

fn setup() -> (CrudController<Article>, InMemoryPersistenceHandler<Article>) {
    setup_with(overrides())
}

fn seed(store: &InMemoryPersistenceHandler<Article>, title: &str, status: &str) -> Uuid {
    let mut article = Article {
        title: title.to_string(),
        status: status.to_string(),
        ..Article::default()
    };
    store.save(&mut article).unwrap();
    article.id.unwrap()
}

fn bad_request(err: AdminError) -> BadRequestError {
    match err {
        AdminError::BadRequest(e) => e,
        other => panic!("expected a bad request, got {other}"),
    }
}

/// Persistence backend that is always down
struct UnavailableStore;

impl PersistenceHandler<Article> for UnavailableStore {
    fn query(&self, _entity_type: &str, _params: &Value) -> AdminResult<Vec<Article>> {
        Err(self.down())
    }

    fn get_count(&self, _entity_type: &str, _params: &Value) -> AdminResult<usize> {
        Err(self.down())
    }

    fn save(&self, _entity: &mut Article) -> AdminResult<OperationResult> {
        Err(self.down())
    }

    fn update(&self, _entity: &mut Article) -> AdminResult<OperationResult> {
        Err(self.down())
    }

    fn remove(&self, _entity_type: &str, _params: &Value) -> AdminResult<OperationResult> {
        Err(self.down())
    }
}

impl UnavailableStore {
    fn down(&self) -> AdminError {
        PersistenceError::Unavailable {
            backend: "test".to_string(),
        }
        .into()
    }
}

// =============================================================================
// Create
// =============================================================================

mod create_tests {
    use super::*;

    #[test]
    fn test_create_without_record_is_bad_request() {
        let (controller, store) = setup();

        let err = controller.create_action(&json!({})).unwrap_err();

        let err = bad_request(err);
        assert_eq!(err.path(), "/record");
        assert_eq!(err.params(), &json!({}));
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_create_with_hydration() {
        let (controller, store) = setup();

        let response = controller
            .create_action(&json!({
                "record": { "title": "A", "status": "draft" },
                "hydration": { "profile": "default" }
            }))
            .unwrap();

        assert_eq!(response["success"], json!(true));
        let id: Uuid = serde_json::from_value(response["id"].clone()).unwrap();
        assert_eq!(response["created_models"], json!({ "article": [id] }));
        assert_eq!(
            response["result"],
            json!({ "id": id, "label": "A", "status": "draft", "views": 0 })
        );
        assert_eq!(store.find(&id).unwrap().unwrap().title, "A");
    }

    #[test]
    fn test_create_without_hydration_has_no_result() {
        let (controller, _) = setup();

        let response = controller
            .create_action(&json!({ "record": { "title": "A" } }))
            .unwrap();

        assert_eq!(response["success"], json!(true));
        assert!(response.get("result").is_none());
    }

    #[test]
    fn test_create_validation_failure_short_circuits() {
        let (controller, store) = setup();

        let response = controller
            .create_action(&json!({ "record": { "title": "" } }))
            .unwrap();

        assert_eq!(response["success"], json!(false));
        assert_eq!(
            response["field_errors"]["title"],
            json!(["must not be empty"])
        );
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_create_with_disabled_validator() {
        let (controller, store) = setup_with(overrides().without_new_record_validator());

        let response = controller
            .create_action(&json!({ "record": { "title": "" } }))
            .unwrap();

        assert_eq!(response["success"], json!(true));
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_create_with_ignored_standard_validator() {
        let (controller, _) = setup_with(overrides().ignore_standard_validator(true));

        let response = controller
            .create_action(&json!({ "record": { "title": "" } }))
            .unwrap();

        assert_eq!(response["success"], json!(true));
    }

    #[test]
    fn test_create_with_custom_validator() {
        let (controller, store) = setup_with(overrides().new_record_validator(
            |article, default, config| {
                let mut result = default.validate(article, config)?;
                if article.status == "archived" {
                    result.add_general_error("Cannot create archived articles");
                }
                Ok(result)
            },
        ));

        let response = controller
            .create_action(&json!({ "record": { "title": "A", "status": "archived" } }))
            .unwrap();

        assert_eq!(response["success"], json!(false));
        assert_eq!(
            response["general_errors"],
            json!(["Cannot create archived articles"])
        );
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_create_hooks_wrap_defaults() {
        let (controller, store) = setup_with(
            overrides()
                .create_entity(|params, factory, config| {
                    let mut article = factory.create(params, config)?;
                    article.status = "draft".to_string();
                    Ok(article)
                })
                .save_entity_handler(|article, persistence| {
                    article.views = 1;
                    persistence.save(article)
                }),
        );

        let response = controller
            .create_action(&json!({ "record": { "title": "A" } }))
            .unwrap();

        let id: Uuid = serde_json::from_value(response["id"].clone()).unwrap();
        let stored = store.find(&id).unwrap().unwrap();
        assert_eq!(stored.status, "draft");
        assert_eq!(stored.views, 1);
    }

    #[test]
    fn test_create_record_cannot_set_id() {
        let (controller, store) = setup();
        let forged = Uuid::new_v4();

        let response = controller
            .create_action(&json!({ "record": { "id": forged, "title": "A" } }))
            .unwrap();

        let id: Uuid = serde_json::from_value(response["id"].clone()).unwrap();
        assert_ne!(id, forged);
        assert!(store.find(&forged).unwrap().is_none());
    }

    #[test]
    fn test_create_record_of_wrong_shape() {
        let (controller, _) = setup();

        let params = json!({ "record": { "views": "many" }, "note": "kept" });
        let err = controller.create_action(&params).unwrap_err();

        let err = bad_request(err);
        assert_eq!(err.path(), "/record");
        assert_eq!(err.params(), &params);
    }

    #[test]
    fn test_create_with_bad_hydration_stores_nothing() {
        let (controller, store) = setup();

        for hydration in [
            json!({}),
            json!({ "profile": 3 }),
            json!({ "profile": "nope" }),
            json!({ "profile": "default", "group": ["main", "nope"] }),
        ] {
            let err = controller
                .create_action(&json!({ "record": { "title": "A" }, "hydration": hydration }))
                .unwrap_err();
            assert!(bad_request(err).path().starts_with("/hydration/"));
        }

        assert!(store.is_empty().unwrap());
    }
}

// =============================================================================
// Get and List
// =============================================================================

mod read_tests {
    use super::*;

    #[test]
    fn test_get_single_match() {
        let (controller, store) = setup();
        let id = seed(&store, "A", "published");
        seed(&store, "B", "draft");

        let response = controller
            .get_action(&json!({
                "filter": { "status": "published" },
                "hydration": { "profile": "form" }
            }))
            .unwrap();

        assert_eq!(
            response,
            json!({
                "success": true,
                "result": {
                    "main": { "id": id, "label": "A" },
                    "meta": { "status": "published", "views": 0 }
                }
            })
        );
    }

    #[test]
    fn test_get_single_group_is_unwrapped() {
        let (controller, store) = setup();
        seed(&store, "A", "published");

        let response = controller
            .get_action(&json!({
                "filter": { "title": "A" },
                "hydration": { "profile": "form", "group": "meta" }
            }))
            .unwrap();

        assert_eq!(response["result"], json!({ "status": "published", "views": 0 }));
    }

    #[test]
    fn test_get_several_matches_is_bad_request() {
        let (controller, store) = setup();
        seed(&store, "A", "draft");
        seed(&store, "B", "draft");

        let err = controller
            .get_action(&json!({
                "filter": { "status": "draft" },
                "hydration": { "profile": "default" }
            }))
            .unwrap_err();

        let err = bad_request(err);
        assert_eq!(err.path(), "/filter");
        assert!(err.message().contains("but 2 were returned"), "{}", err.message());
    }

    #[test]
    fn test_get_ignores_paging() {
        let (controller, store) = setup();
        seed(&store, "A", "draft");
        seed(&store, "B", "draft");
        seed(&store, "C", "published");

        let err = controller
            .get_action(&json!({
                "filter": { "status": "draft" },
                "limit": 1,
                "hydration": { "profile": "default" }
            }))
            .unwrap_err();
        assert!(bad_request(err).message().contains("but 2 were returned"));

        let response = controller
            .get_action(&json!({
                "filter": { "status": "published" },
                "start": 1,
                "hydration": { "profile": "default" }
            }))
            .unwrap();
        assert_eq!(response["result"]["label"], json!("C"));
    }

    #[test]
    fn test_get_no_match_is_bad_request() {
        let (controller, _) = setup();

        let err = controller
            .get_action(&json!({
                "filter": { "status": "draft" },
                "hydration": { "profile": "default" }
            }))
            .unwrap_err();

        let err = bad_request(err);
        assert_eq!(err.path(), "/filter");
        assert!(err.message().contains("but 0 were returned"));
    }

    #[test]
    fn test_get_without_profile() {
        let (controller, store) = setup();
        seed(&store, "A", "draft");

        let err = controller
            .get_action(&json!({ "filter": { "title": "A" } }))
            .unwrap_err();

        assert_eq!(bad_request(err).path(), "/hydration/profile");
    }

    #[test]
    fn test_get_unknown_profile() {
        let (controller, store) = setup();
        seed(&store, "A", "draft");

        let err = controller
            .get_action(&json!({
                "filter": { "title": "A" },
                "hydration": { "profile": "nope" }
            }))
            .unwrap_err();

        assert_eq!(bad_request(err).path(), "/hydration/profile");
    }

    #[test]
    fn test_get_unknown_group() {
        let (controller, store) = setup();
        seed(&store, "A", "draft");

        let err = controller
            .get_action(&json!({
                "filter": { "title": "A" },
                "hydration": { "profile": "default", "group": ["main", "nope"] }
            }))
            .unwrap_err();

        assert_eq!(bad_request(err).path(), "/hydration/group");
    }

    #[test]
    fn test_list_with_total_and_paging() {
        let (controller, store) = setup();
        seed(&store, "C", "draft");
        seed(&store, "A", "draft");
        seed(&store, "B", "draft");
        seed(&store, "D", "published");

        let response = controller
            .list_action(&json!({
                "filter": { "status": "draft" },
                "sort": "title",
                "limit": 2,
                "hydration": { "profile": "default", "group": "main" }
            }))
            .unwrap();

        assert_eq!(response["success"], json!(true));
        assert_eq!(response["total"], json!(3));
        let labels: Vec<&str> = response["items"]
            .as_array()
            .unwrap()
            .iter()
            .map(|item| item["label"].as_str().unwrap())
            .collect();
        assert_eq!(labels, ["A", "B"]);
    }

    #[test]
    fn test_list_empty() {
        let (controller, _) = setup();

        let response = controller
            .list_action(&json!({ "hydration": { "profile": "default" } }))
            .unwrap();

        assert_eq!(response, json!({ "success": true, "items": [], "total": 0 }));
    }
}

// =============================================================================
// Update and Remove
// =============================================================================

mod write_tests {
    use super::*;

    #[test]
    fn test_update_maps_validates_and_persists() {
        let (controller, store) = setup();
        let id = seed(&store, "A", "draft");

        let response = controller
            .update_action(&json!({
                "filter": { "id": id },
                "record": { "status": "published" },
                "hydration": { "profile": "default" }
            }))
            .unwrap();

        assert_eq!(response["success"], json!(true));
        assert_eq!(response["id"], json!(id));
        assert_eq!(response["updated_models"], json!({ "article": [id] }));
        assert_eq!(response["result"]["status"], json!("published"));

        let stored = store.find(&id).unwrap().unwrap();
        assert_eq!(stored.status, "published");
        assert_eq!(stored.title, "A");
    }

    #[test]
    fn test_update_requires_record() {
        let (controller, store) = setup();
        let id = seed(&store, "A", "draft");

        let err = controller
            .update_action(&json!({ "filter": { "id": id } }))
            .unwrap_err();

        assert_eq!(bad_request(err).path(), "/record");
    }

    #[test]
    fn test_update_several_matches_is_bad_request() {
        let (controller, store) = setup();
        seed(&store, "A", "draft");
        seed(&store, "B", "draft");

        let err = controller
            .update_action(&json!({
                "filter": { "status": "draft" },
                "record": { "status": "published" }
            }))
            .unwrap_err();

        assert_eq!(bad_request(err).path(), "/filter");
    }

    #[test]
    fn test_update_validation_failure_keeps_stored_entity() {
        let (controller, store) = setup();
        let id = seed(&store, "A", "draft");

        let response = controller
            .update_action(&json!({ "filter": { "id": id }, "record": { "title": "" } }))
            .unwrap();

        assert_eq!(response["success"], json!(false));
        assert_eq!(store.find(&id).unwrap().unwrap().title, "A");
    }

    #[test]
    fn test_update_ignores_paging() {
        let (controller, store) = setup();
        let a = seed(&store, "A", "draft");
        let b = seed(&store, "B", "draft");

        let err = controller
            .update_action(&json!({
                "filter": { "status": "draft" },
                "limit": 1,
                "record": { "status": "published" }
            }))
            .unwrap_err();

        assert_eq!(bad_request(err).path(), "/filter");
        assert_eq!(store.find(&a).unwrap().unwrap().status, "draft");
        assert_eq!(store.find(&b).unwrap().unwrap().status, "draft");
    }

    #[test]
    fn test_update_with_bad_hydration_keeps_stored_entity() {
        let (controller, store) = setup();
        let id = seed(&store, "A", "draft");

        for hydration in [json!({ "profile": 3 }), json!({ "profile": "nope" })] {
            let err = controller
                .update_action(&json!({
                    "filter": { "id": id },
                    "record": { "title": "Z" },
                    "hydration": hydration
                }))
                .unwrap_err();
            assert_eq!(bad_request(err).path(), "/hydration/profile");
        }

        assert_eq!(store.find(&id).unwrap().unwrap().title, "A");
    }

    #[test]
    fn test_update_with_custom_mapping() {
        let (controller, store) = setup_with(overrides().map_data_on_update(
            |params, article, mapper| {
                mapper.map_data(&params["record"], article)?;
                article.views += 1;
                Ok(())
            },
        ));
        let id = seed(&store, "A", "draft");

        controller
            .update_action(&json!({ "filter": { "id": id }, "record": { "body": "text" } }))
            .unwrap();

        let stored = store.find(&id).unwrap().unwrap();
        assert_eq!(stored.body, "text");
        assert_eq!(stored.views, 1);
    }

    #[test]
    fn test_remove_reports_removed_models() {
        let (controller, store) = setup();
        let a = seed(&store, "A", "draft");
        let b = seed(&store, "B", "draft");
        seed(&store, "C", "published");

        let response = controller
            .remove_action(&json!({ "filter": { "status": "draft" } }))
            .unwrap();

        assert_eq!(
            response,
            json!({ "success": true, "removed_models": { "article": [a, b] } })
        );
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_remove_nothing_is_still_success() {
        let (controller, _) = setup();

        let response = controller
            .remove_action(&json!({ "filter": { "status": "draft" } }))
            .unwrap();

        assert_eq!(response, json!({ "success": true }));
    }
}

// =============================================================================
// New Record Values
// =============================================================================

mod new_record_values_tests {
    use super::*;

    #[test]
    fn test_defaults_without_hydration() {
        let (controller, store) = setup_with(overrides().create_entity(
            |params, factory, config| {
                let mut article = factory.create(params, config)?;
                article.status = "draft".to_string();
                Ok(article)
            },
        ));

        let response = controller.get_new_record_values_action(&json!({})).unwrap();

        assert_eq!(response["success"], json!(true));
        assert_eq!(response["result"]["status"], json!("draft"));
        assert_eq!(response["result"]["id"], Value::Null);
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_hydrated_defaults() {
        let (controller, _) = setup();

        let response = controller
            .get_new_record_values_action(&json!({
                "hydration": { "profile": "default", "group": "meta" }
            }))
            .unwrap();

        assert_eq!(
            response,
            json!({ "success": true, "result": { "status": "", "views": 0 } })
        );
    }
}

// =============================================================================
// Configuration, Access and Exception Handling
// =============================================================================

mod pipeline_tests {
    use super::*;

    #[test]
    fn test_missing_hydration_config_propagates() {
        let (controller, _) = setup_with(ConfigOverrides::for_entity());

        let err = controller
            .list_action(&json!({ "hydration": { "profile": "default" } }))
            .unwrap_err();

        assert!(matches!(
            err,
            AdminError::Config(ConfigError::MissingField { ref field, .. }) if field == "hydration"
        ));
    }

    #[test]
    fn test_config_is_resolved_on_every_action() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let controller = CrudController::new(
            CrudServices::new(Arc::new(InMemoryPersistenceHandler::<Article>::new())),
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                overrides()
            },
        );

        controller
            .list_action(&json!({ "hydration": { "profile": "default" } }))
            .unwrap();
        controller.get_new_record_values_action(&json!({})).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_access_check_rejects_operation() {
        let (controller, store) = setup_with(overrides().access_check(|operation, _params| {
            if operation.is_mutation() {
                Err(AdminError::AccessDenied {
                    operation: operation.to_string(),
                    message: "read-only".to_string(),
                })
            } else {
                Ok(())
            }
        }));

        let err = controller
            .create_action(&json!({ "record": { "title": "A" } }))
            .unwrap_err();
        assert!(matches!(err, AdminError::AccessDenied { .. }));
        assert!(store.is_empty().unwrap());

        assert!(
            controller
                .list_action(&json!({ "hydration": { "profile": "default" } }))
                .is_ok()
        );
    }

    #[test]
    fn test_persistence_failure_becomes_response() {
        let controller = CrudController::with_overrides(
            CrudServices::new(Arc::new(UnavailableStore)),
            overrides(),
        );

        let response = controller
            .create_action(&json!({ "record": { "title": "A" } }))
            .unwrap();

        assert_eq!(response["success"], json!(false));
        assert_eq!(response["operation"], json!("create"));
        assert_eq!(response["error_code"], json!("PERSISTENCE_UNAVAILABLE"));
    }

    #[test]
    fn test_custom_exception_hook_handles_bad_requests() {
        let (controller, _) = setup_with(overrides().exception_handler(
            |error, operation, default| match error {
                AdminError::BadRequest(e) => Ok(json!({
                    "success": false,
                    "operation": operation.as_str(),
                    "path": e.path(),
                })),
                other => default.create_response(other, operation),
            },
        ));

        let response = controller.create_action(&json!({})).unwrap();

        assert_eq!(
            response,
            json!({ "success": false, "operation": "create", "path": "/record" })
        );
    }

    #[test]
    fn test_dispatch_through_remote_controller() {
        let (controller, store) = setup();
        seed(&store, "A", "draft");
        let remote: Arc<dyn RemoteController> = Arc::new(controller);

        assert_eq!(remote.entity_type(), "article");
        let response = remote
            .handle(
                Operation::List,
                &json!({ "hydration": { "profile": "default" } }),
            )
            .unwrap();
        assert_eq!(response["total"], json!(1));
    }
}
