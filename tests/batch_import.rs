// tests/batch_import.rs
//! Batch import scenarios against an in-memory Tandoor stand-in.

use pretty_assertions::assert_eq;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::io;
use tandoor_import::{
    ApiOutcome, AppError, AttachmentRef, BatchImporter, CacheRecord, CreatedRecipe, ErrorPayload,
    FoodEntry, ImportCache, InputLayout, ItemKey, ItemOutcome, RecipeDocument, RecipeService,
    ServerIdentity, TextNormalizer,
};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Fake service
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum Reply {
    Accept(Value),
    Reject(u16, Value),
    Fault,
}

/// Replies in order; the last one repeats.
struct Script(RefCell<VecDeque<Reply>>);

impl Script {
    fn new(replies: Vec<Reply>) -> Self {
        Self(RefCell::new(replies.into()))
    }

    fn next(&self) -> Reply {
        let mut replies = self.0.borrow_mut();
        if replies.len() > 1 {
            replies.pop_front().unwrap()
        } else {
            replies.front().cloned().expect("script has at least one reply")
        }
    }

    fn answer<T: DeserializeOwned>(&self) -> Result<ApiOutcome<T>, AppError> {
        match self.next() {
            Reply::Accept(value) => Ok(ApiOutcome::Accepted(
                serde_json::from_value(value).expect("scripted reply matches the call"),
            )),
            Reply::Reject(status, body) => {
                Ok(ApiOutcome::Rejected(ErrorPayload::Json { status, body }))
            }
            Reply::Fault => Err(AppError::Io(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "connection reset by peer",
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Convert(String),
    Upload { name: String, file: String },
    Create(Value),
    Food(Value),
}

struct FakeTandoor {
    convert: Script,
    upload: Script,
    create: Script,
    food: Script,
    calls: RefCell<Vec<Call>>,
}

impl FakeTandoor {
    /// Every call succeeds; conversion echoes a recipe named "Soup".
    fn happy() -> Self {
        Self {
            convert: Script::new(vec![Reply::Accept(
                json!({"name": "Soup", "steps": [{}]}),
            )]),
            upload: Script::new(vec![Reply::Accept(json!(42))]),
            create: Script::new(vec![Reply::Accept(json!({"id": 7, "name": "Soup"}))]),
            food: Script::new(vec![Reply::Accept(json!({"id": 3, "name": "soup"}))]),
            calls: RefCell::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    fn convert_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Convert(_)))
            .count()
    }
}

impl RecipeService for FakeTandoor {
    fn convert_text_to_recipe(
        &self,
        document: &str,
    ) -> Result<ApiOutcome<RecipeDocument>, AppError> {
        self.calls
            .borrow_mut()
            .push(Call::Convert(document.to_string()));
        self.convert.answer()
    }

    fn upload_attachment(
        &self,
        display_name: &str,
        file_name: &str,
        _bytes: Vec<u8>,
    ) -> Result<ApiOutcome<AttachmentRef>, AppError> {
        self.calls.borrow_mut().push(Call::Upload {
            name: display_name.to_string(),
            file: file_name.to_string(),
        });
        self.upload.answer()
    }

    fn create_recipe(
        &self,
        recipe: &RecipeDocument,
    ) -> Result<ApiOutcome<CreatedRecipe>, AppError> {
        self.calls
            .borrow_mut()
            .push(Call::Create(serde_json::to_value(recipe).unwrap()));
        self.create.answer()
    }

    fn create_food_entry(&self, food: &FoodEntry) -> Result<ApiOutcome<Value>, AppError> {
        self.calls
            .borrow_mut()
            .push(Call::Food(serde_json::to_value(food).unwrap()));
        self.food.answer()
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

const SERVER: &str = "https://recipes.example.com/api/";
const OTHER_SERVER: &str = "https://other.example.com/api/";
const SOUP_DOCUMENT: &str = r#"{"title": "Soup","steps":[{}]}"#;

/// A scratch input/output folder pair with one photo + document per entry.
fn workspace(items: &[(&str, Option<&str>)]) -> (TempDir, InputLayout) {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("import");
    let output = dir.path().join("out");
    fs::create_dir_all(&input).unwrap();
    fs::create_dir_all(&output).unwrap();

    let layout = InputLayout::new(&input, &output, ".png.json");
    for (name, document) in items {
        fs::write(input.join(name), b"\x89PNG fake image").unwrap();
        if let Some(document) = document {
            let key = ItemKey::new(*name).unwrap();
            fs::write(layout.companion_path(&key), document).unwrap();
        }
    }
    (dir, layout)
}

fn key(name: &str) -> ItemKey {
    ItemKey::new(name).unwrap()
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn imports_single_photo_end_to_end() {
    let (dir, layout) = workspace(&[("soup.png", Some(SOUP_DOCUMENT))]);
    let cache_path = dir.path().join("caches.json");
    let identity = ServerIdentity::from_address(SERVER);
    let mut cache = ImportCache::open(&cache_path, &identity);
    let service = FakeTandoor::happy();
    let normalizer = TextNormalizer::default();

    let report = BatchImporter::new(&service, &normalizer, &mut cache, identity.clone())
        .run(&layout.list_items().unwrap())
        .unwrap();

    assert_eq!(
        report.outcome_of("soup.png"),
        Some(&ItemOutcome::Completed {
            recipe: "Soup".to_string()
        })
    );
    assert_eq!(report.completed(), 1);
    assert_eq!(
        cache.get(&identity, &key("soup.png")),
        Some(&CacheRecord::for_recipe("Soup"))
    );

    // Flushed to disk, not just held in memory.
    let reopened = ImportCache::open(&cache_path, &identity);
    assert!(reopened.has(&identity, &key("soup.png")));

    let calls = service.calls();
    assert_eq!(calls.len(), 3, "no food call without the flag: {:?}", calls);
    assert_eq!(
        calls[0],
        Call::Convert(r#"{"name": "Soup","steps":[{}]}"#.to_string())
    );
    assert_eq!(
        calls[1],
        Call::Upload {
            name: "Soup".to_string(),
            file: "soup.png".to_string()
        }
    );
    assert_eq!(
        calls[2],
        Call::Create(json!({"name": "Soup", "steps": [{"file": 42}]}))
    );
}

#[test]
fn cached_item_is_skipped_only_for_its_server() {
    let (dir, layout) = workspace(&[("a.png", Some(SOUP_DOCUMENT))]);
    let cache_path = dir.path().join("caches.json");
    let first = ServerIdentity::from_address(SERVER);
    let second = ServerIdentity::from_address(OTHER_SERVER);

    let mut cache = ImportCache::open(&cache_path, &first);
    cache.record(&first, &key("a.png"), CacheRecord::for_recipe("A"));
    cache.flush().unwrap();

    let normalizer = TextNormalizer::default();
    let items = layout.list_items().unwrap();

    let service = FakeTandoor::happy();
    let report = BatchImporter::new(&service, &normalizer, &mut cache, first.clone())
        .run(&items)
        .unwrap();
    assert_eq!(report.outcome_of("a.png"), Some(&ItemOutcome::Skipped));
    assert_eq!(service.convert_calls(), 0);

    let mut cache = ImportCache::open(&cache_path, &second);
    let service = FakeTandoor::happy();
    let report = BatchImporter::new(&service, &normalizer, &mut cache, second.clone())
        .run(&items)
        .unwrap();
    assert!(report.outcome_of("a.png").unwrap().is_completed());
    assert_eq!(service.convert_calls(), 1);
    assert!(cache.has(&first, &key("a.png")));
    assert!(cache.has(&second, &key("a.png")));
}

#[test]
fn conversion_failure_stops_item_without_caching() {
    let (_dir, layout) = workspace(&[("soup.png", Some(SOUP_DOCUMENT))]);
    let identity = ServerIdentity::from_address(SERVER);
    let mut cache = ImportCache::in_memory();
    let mut service = FakeTandoor::happy();
    service.convert = Script::new(vec![Reply::Reject(400, json!({"error": "invalid json"}))]);
    let normalizer = TextNormalizer::default();

    let report = BatchImporter::new(&service, &normalizer, &mut cache, identity.clone())
        .run(&layout.list_items().unwrap())
        .unwrap();

    assert_eq!(
        report.outcome_of("soup.png"),
        Some(&ItemOutcome::ConversionFailed(ErrorPayload::Json {
            status: 400,
            body: json!({"error": "invalid json"})
        }))
    );
    assert_eq!(service.calls().len(), 1);
    assert!(!cache.has(&identity, &key("soup.png")));
}

#[test]
fn recipe_transport_fault_is_reported_and_batch_continues() {
    let (_dir, layout) = workspace(&[
        ("a.png", Some(SOUP_DOCUMENT)),
        ("b.png", Some(SOUP_DOCUMENT)),
    ]);
    let identity = ServerIdentity::from_address(SERVER);
    let mut cache = ImportCache::in_memory();
    let mut service = FakeTandoor::happy();
    service.create = Script::new(vec![
        Reply::Fault,
        Reply::Accept(json!({"id": 8, "name": "Soup"})),
    ]);
    let normalizer = TextNormalizer::default();

    let report = BatchImporter::new(&service, &normalizer, &mut cache, identity.clone())
        .run(&layout.list_items().unwrap())
        .unwrap();

    assert!(matches!(
        report.outcome_of("a.png"),
        Some(ItemOutcome::RecipeCreateFailed(ErrorPayload::Transport { .. }))
    ));
    assert!(report.outcome_of("b.png").unwrap().is_completed());
    assert!(!cache.has(&identity, &key("a.png")));
    assert!(cache.has(&identity, &key("b.png")));
    assert_eq!(report.failed(), 1);
}

#[test]
fn nameless_recipe_is_rejected_before_upload() {
    let (_dir, layout) = workspace(&[("soup.png", Some(SOUP_DOCUMENT))]);
    let identity = ServerIdentity::from_address(SERVER);
    let mut cache = ImportCache::in_memory();
    let mut service = FakeTandoor::happy();
    service.convert = Script::new(vec![Reply::Accept(json!({"name": "", "steps": [{}]}))]);
    let normalizer = TextNormalizer::default();

    let report = BatchImporter::new(&service, &normalizer, &mut cache, identity)
        .run(&layout.list_items().unwrap())
        .unwrap();

    assert_eq!(
        report.outcome_of("soup.png"),
        Some(&ItemOutcome::NamelessRejected {
            record: json!({"name": "", "steps": [{}]})
        })
    );
    assert_eq!(service.calls().len(), 1);
}

#[test]
fn recipe_without_steps_is_rejected_before_upload() {
    let (_dir, layout) = workspace(&[("soup.png", Some(SOUP_DOCUMENT))]);
    let identity = ServerIdentity::from_address(SERVER);
    let mut cache = ImportCache::in_memory();
    let mut service = FakeTandoor::happy();
    service.convert = Script::new(vec![Reply::Accept(json!({"name": "Soup", "steps": []}))]);
    let normalizer = TextNormalizer::default();

    let report = BatchImporter::new(&service, &normalizer, &mut cache, identity)
        .run(&layout.list_items().unwrap())
        .unwrap();

    assert!(matches!(
        report.outcome_of("soup.png"),
        Some(ItemOutcome::NoStepsRejected { .. })
    ));
    assert_eq!(service.calls().len(), 1);
}

#[test]
fn upload_failure_skips_recipe_creation() {
    let (_dir, layout) = workspace(&[("soup.png", Some(SOUP_DOCUMENT))]);
    let identity = ServerIdentity::from_address(SERVER);
    let mut cache = ImportCache::in_memory();
    let mut service = FakeTandoor::happy();
    service.upload = Script::new(vec![Reply::Reject(413, json!({"detail": "too large"}))]);
    let normalizer = TextNormalizer::default();

    let report = BatchImporter::new(&service, &normalizer, &mut cache, identity)
        .run(&layout.list_items().unwrap())
        .unwrap();

    assert!(matches!(
        report.outcome_of("soup.png"),
        Some(ItemOutcome::UploadFailed(_))
    ));
    assert!(!service
        .calls()
        .iter()
        .any(|call| matches!(call, Call::Create(_))));
}

#[test]
fn food_entry_created_when_enabled() {
    let (_dir, layout) = workspace(&[("soup.png", Some(SOUP_DOCUMENT))]);
    let identity = ServerIdentity::from_address(SERVER);
    let mut cache = ImportCache::in_memory();
    let service = FakeTandoor::happy();
    let normalizer = TextNormalizer::default();

    let report = BatchImporter::new(&service, &normalizer, &mut cache, identity.clone())
        .with_food_entries(true)
        .run(&layout.list_items().unwrap())
        .unwrap();

    assert!(report.outcome_of("soup.png").unwrap().is_completed());
    assert_eq!(
        service.calls().last(),
        Some(&Call::Food(
            json!({"name": "soup", "recipe": {"id": 7, "name": "Soup"}})
        ))
    );
    assert!(cache.has(&identity, &key("soup.png")));
}

#[test]
fn created_recipe_with_unexpected_body_still_counts() {
    let (_dir, layout) = workspace(&[("soup.png", Some(SOUP_DOCUMENT))]);
    let identity = ServerIdentity::from_address(SERVER);
    let mut cache = ImportCache::in_memory();
    let mut service = FakeTandoor::happy();
    service.create = Script::new(vec![Reply::Accept(json!("Created"))]);
    let normalizer = TextNormalizer::default();

    let report = BatchImporter::new(&service, &normalizer, &mut cache, identity.clone())
        .with_food_entries(true)
        .run(&layout.list_items().unwrap())
        .unwrap();

    assert_eq!(
        report.outcome_of("soup.png"),
        Some(&ItemOutcome::Completed {
            recipe: "Soup".to_string()
        })
    );
    assert!(cache.has(&identity, &key("soup.png")));
    assert_eq!(
        service.calls().last(),
        Some(&Call::Food(
            json!({"name": "soup", "recipe": {"id": null, "name": "Soup"}})
        ))
    );
}

#[test]
fn recipe_name_is_used_as_converted() {
    let (_dir, layout) = workspace(&[("soup.png", Some(SOUP_DOCUMENT))]);
    let identity = ServerIdentity::from_address(SERVER);
    let mut cache = ImportCache::in_memory();
    let mut service = FakeTandoor::happy();
    service.convert = Script::new(vec![Reply::Accept(
        json!({"name": " Soup ", "steps": [{}]}),
    )]);
    let normalizer = TextNormalizer::default();

    BatchImporter::new(&service, &normalizer, &mut cache, identity.clone())
        .run(&layout.list_items().unwrap())
        .unwrap();

    assert_eq!(
        service.calls()[1],
        Call::Upload {
            name: " Soup ".to_string(),
            file: "soup.png".to_string()
        }
    );
    assert_eq!(
        cache.get(&identity, &key("soup.png")),
        Some(&CacheRecord::for_recipe(" Soup "))
    );
}

#[test]
fn food_failure_leaves_item_uncached() {
    let (_dir, layout) = workspace(&[("soup.png", Some(SOUP_DOCUMENT))]);
    let identity = ServerIdentity::from_address(SERVER);
    let mut cache = ImportCache::in_memory();
    let mut service = FakeTandoor::happy();
    service.food = Script::new(vec![Reply::Reject(400, json!({"name": ["exists"]}))]);
    let normalizer = TextNormalizer::default();

    let report = BatchImporter::new(&service, &normalizer, &mut cache, identity.clone())
        .with_food_entries(true)
        .run(&layout.list_items().unwrap())
        .unwrap();

    assert!(matches!(
        report.outcome_of("soup.png"),
        Some(ItemOutcome::FoodCreateFailed { recipe, .. }) if recipe == "Soup"
    ));
    assert!(!cache.has(&identity, &key("soup.png")));
}

#[test]
fn missing_document_aborts_the_run() {
    let (_dir, layout) = workspace(&[("soup.png", None)]);
    let identity = ServerIdentity::from_address(SERVER);
    let mut cache = ImportCache::in_memory();
    let service = FakeTandoor::happy();
    let normalizer = TextNormalizer::default();

    let result = BatchImporter::new(&service, &normalizer, &mut cache, identity)
        .run(&layout.list_items().unwrap());

    assert!(matches!(result, Err(AppError::InputFile { .. })));
    assert_eq!(service.convert_calls(), 0);
}

#[test]
fn fenced_document_is_normalized_before_conversion() {
    let document = "```json\n{\n\"title\": \"Mom's Stew\",\n\"steps\": [\n{}\n]\n}\n```";
    let (_dir, layout) = workspace(&[("stew.png", Some(document))]);
    let identity = ServerIdentity::from_address(SERVER);
    let mut cache = ImportCache::in_memory();
    let service = FakeTandoor::happy();
    let normalizer = TextNormalizer::default();

    BatchImporter::new(&service, &normalizer, &mut cache, identity)
        .run(&layout.list_items().unwrap())
        .unwrap();

    let Call::Convert(sent) = &service.calls()[0] else {
        panic!("first call must be the conversion");
    };
    assert!(!sent.contains("```"));
    assert!(!sent.contains("\"title\""));
    assert!(!sent.contains('\''));
    let parsed: Value = serde_json::from_str(sent).unwrap();
    assert_eq!(parsed["name"], "Mom's Stew");
}
